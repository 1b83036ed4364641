//! Core geographic value types.

use std::fmt;

use thiserror::Error;

/// Minimum latitude representable in the Web Mercator projection.
pub const MIN_LAT: f64 = -85.05112878;

/// Maximum latitude representable in the Web Mercator projection.
pub const MAX_LAT: f64 = 85.05112878;

/// Minimum longitude in degrees.
pub const MIN_LON: f64 = -180.0;

/// Maximum longitude in degrees.
pub const MAX_LON: f64 = 180.0;

/// Minimum supported zoom level.
pub const MIN_ZOOM: u8 = 0;

/// Maximum supported zoom level. The tile grid at zoom `z` is `2^z` tiles
/// on a side.
pub const MAX_ZOOM: u8 = 18;

/// Edge length of a single map tile in pixels.
pub const TILE_SIZE: u32 = 256;

/// Errors from coordinate validation and conversion.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordError {
    /// Latitude outside the Web Mercator range.
    #[error("latitude {0} outside Web Mercator range [{MIN_LAT}, {MAX_LAT}]")]
    InvalidLatitude(f64),

    /// Longitude outside the valid range.
    #[error("longitude {0} outside valid range [{MIN_LON}, {MAX_LON}]")]
    InvalidLongitude(f64),

    /// Zoom level above the supported maximum.
    #[error("zoom level {0} exceeds maximum of {MAX_ZOOM}")]
    InvalidZoom(u8),
}

/// A geographic position in degrees.
///
/// Immutable value type. Latitude is positive north, longitude positive east.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoLocation {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
}

impl GeoLocation {
    /// Create a new geographic position.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl fmt::Display for GeoLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.latitude, self.longitude)
    }
}

/// A geographic bounding box in degrees.
///
/// The constructor normalizes swapped corners, so `lat_low() <= lat_high()`
/// and `lon_low() <= lon_high()` always hold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Area {
    lat_low: f64,
    lon_low: f64,
    lat_high: f64,
    lon_high: f64,
}

impl Area {
    /// Create a bounding box from two opposite corners in any order.
    pub fn new(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> Self {
        Self {
            lat_low: lat1.min(lat2),
            lon_low: lon1.min(lon2),
            lat_high: lat1.max(lat2),
            lon_high: lon1.max(lon2),
        }
    }

    /// Lowest latitude of the box.
    pub fn lat_low(&self) -> f64 {
        self.lat_low
    }

    /// Lowest longitude of the box.
    pub fn lon_low(&self) -> f64 {
        self.lon_low
    }

    /// Highest latitude of the box.
    pub fn lat_high(&self) -> f64 {
        self.lat_high
    }

    /// Highest longitude of the box.
    pub fn lon_high(&self) -> f64 {
        self.lon_high
    }

    /// North-west corner of the box.
    pub fn top_left(&self) -> GeoLocation {
        GeoLocation::new(self.lat_high, self.lon_low)
    }

    /// South-east corner of the box.
    pub fn bottom_right(&self) -> GeoLocation {
        GeoLocation::new(self.lat_low, self.lon_high)
    }

    /// Whether the point lies inside the box.
    ///
    /// The test is closed on the low edges and open on the high edges,
    /// matching the half-open tiling convention used by the tile grid.
    pub fn contains(&self, point: &GeoLocation) -> bool {
        point.latitude >= self.lat_low
            && point.latitude < self.lat_high
            && point.longitude >= self.lon_low
            && point.longitude < self.lon_high
    }
}

impl fmt::Display for Area {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{:.6}, {:.6}] - [{:.6}, {:.6}]",
            self.lat_low, self.lon_low, self.lat_high, self.lon_high
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_area_normalizes_swapped_corners() {
        let area = Area::new(50.0, 10.0, 40.0, -10.0);
        assert_eq!(area.lat_low(), 40.0);
        assert_eq!(area.lat_high(), 50.0);
        assert_eq!(area.lon_low(), -10.0);
        assert_eq!(area.lon_high(), 10.0);
    }

    #[test]
    fn test_area_contains_closed_low_open_high() {
        let area = Area::new(0.0, 0.0, 6.0, 6.0);
        assert!(area.contains(&GeoLocation::new(0.0, 0.0)));
        assert!(area.contains(&GeoLocation::new(5.999, 5.999)));
        assert!(!area.contains(&GeoLocation::new(6.0, 3.0)));
        assert!(!area.contains(&GeoLocation::new(3.0, 6.0)));
        assert!(!area.contains(&GeoLocation::new(-0.001, 3.0)));
    }

    #[test]
    fn test_area_corners() {
        let area = Area::new(40.0, -10.0, 50.0, 10.0);
        assert_eq!(area.top_left(), GeoLocation::new(50.0, -10.0));
        assert_eq!(area.bottom_right(), GeoLocation::new(40.0, 10.0));
    }

    #[test]
    fn test_geo_location_display() {
        let loc = GeoLocation::new(40.7128, -74.006);
        let text = format!("{}", loc);
        assert!(text.contains("40.712800"));
        assert!(text.contains("-74.006000"));
    }
}
