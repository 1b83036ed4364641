//! Coordinate conversion module
//!
//! Provides conversions between geographic coordinates (latitude/longitude)
//! and Web Mercator tile indices under the standard power-of-two slippy-map
//! tiling scheme.

mod types;

pub use types::{
    Area, CoordError, GeoLocation, MAX_LAT, MAX_LON, MAX_ZOOM, MIN_LAT, MIN_LON, MIN_ZOOM,
    TILE_SIZE,
};

use std::f64::consts::PI;

use crate::tile::TileKey;

/// Converts geographic coordinates to the tile index containing them.
///
/// # Arguments
///
/// * `lat` - Latitude in degrees (-85.05112878 to 85.05112878)
/// * `lon` - Longitude in degrees (-180.0 to 180.0)
/// * `zoom` - Zoom level (0 to 18)
///
/// # Returns
///
/// A `Result` containing the tile key or an error if inputs are invalid.
#[inline]
pub fn to_tile(lat: f64, lon: f64, zoom: u8) -> Result<TileKey, CoordError> {
    if !(MIN_LAT..=MAX_LAT).contains(&lat) {
        return Err(CoordError::InvalidLatitude(lat));
    }
    if !(MIN_LON..=MAX_LON).contains(&lon) {
        return Err(CoordError::InvalidLongitude(lon));
    }
    if zoom > MAX_ZOOM {
        return Err(CoordError::InvalidZoom(zoom));
    }

    // Number of tiles on a side at this zoom level
    let n = 2.0_f64.powi(zoom as i32);

    let x = ((lon + 180.0) / 360.0 * n) as i32;

    let lat_rad = lat * PI / 180.0;
    let y = ((1.0 - lat_rad.tan().asinh() / PI) / 2.0 * n) as i32;

    Ok(TileKey::new(zoom, x, y))
}

/// Converts a tile index back to geographic coordinates.
///
/// Returns the latitude/longitude of the tile's north-west corner. Inverse
/// of [`to_tile`] to within one tile's angular size.
#[inline]
pub fn tile_origin(key: &TileKey) -> GeoLocation {
    let n = 2.0_f64.powi(key.zoom() as i32);

    let lon = key.x() as f64 / n * 360.0 - 180.0;

    let y = key.y() as f64 / n;
    let lat_rad = (PI * (1.0 - 2.0 * y)).sinh().atan();
    let lat = lat_rad * 180.0 / PI;

    GeoLocation::new(lat, lon)
}
