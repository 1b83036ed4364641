//! Tile value types.
//!
//! A [`Tile`] is the unit handed back to callers for every grid cell. It is
//! never mutated in place; a state change (for example pending to loaded)
//! produces a new value that replaces the old one in its tile set.

use std::fmt;
use std::sync::Arc;

use image::DynamicImage;

/// Address of a single map tile.
///
/// Indices are signed so that grid arithmetic can step past the edge of the
/// world at a given zoom level. A key outside `[0, 2^zoom - 1]` on either
/// axis is a *border* key: it resolves to a deterministic placeholder, it is
/// not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileKey {
    zoom: u8,
    x: i32,
    y: i32,
}

impl TileKey {
    /// Create a new tile key.
    ///
    /// # Arguments
    ///
    /// * `zoom` - Zoom level (0 to 18)
    /// * `x` - Tile column, may lie outside the world grid
    /// * `y` - Tile row, may lie outside the world grid
    pub fn new(zoom: u8, x: i32, y: i32) -> Self {
        debug_assert!(zoom <= crate::coord::MAX_ZOOM);
        Self { zoom, x, y }
    }

    /// Get the zoom level.
    pub fn zoom(&self) -> u8 {
        self.zoom
    }

    /// Get the tile column.
    pub fn x(&self) -> i32 {
        self.x
    }

    /// Get the tile row.
    pub fn y(&self) -> i32 {
        self.y
    }

    /// Whether both indices lie inside the world grid for this zoom level.
    pub fn is_within_world(&self) -> bool {
        let side = 1i32 << self.zoom.min(crate::coord::MAX_ZOOM);
        self.x >= 0 && self.x < side && self.y >= 0 && self.y < side
    }
}

impl fmt::Display for TileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.zoom, self.x, self.y)
    }
}

/// Load state of a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileState {
    /// A real tile image is present.
    Loaded,
    /// The tile is not cached yet; a later sweep may load it.
    Pending,
    /// The tile lies outside the world grid or its fetch failed.
    Missing,
}

/// A resolved map tile: a key, an optional raster image and a load state.
#[derive(Debug, Clone)]
pub struct Tile {
    key: TileKey,
    image: Option<Arc<DynamicImage>>,
    state: TileState,
}

impl Tile {
    /// Create a tile carrying a real image.
    pub fn loaded(key: TileKey, image: Arc<DynamicImage>) -> Self {
        Self {
            key,
            image: Some(image),
            state: TileState::Loaded,
        }
    }

    /// Create a pending placeholder for a tile that is not cached yet.
    pub fn pending(key: TileKey) -> Self {
        Self {
            key,
            image: None,
            state: TileState::Pending,
        }
    }

    /// Create a placeholder for a border tile or a failed fetch.
    pub fn missing(key: TileKey) -> Self {
        Self {
            key,
            image: None,
            state: TileState::Missing,
        }
    }

    /// Get the tile key.
    pub fn key(&self) -> TileKey {
        self.key
    }

    /// Get the load state.
    pub fn state(&self) -> TileState {
        self.state
    }

    /// Get the raster image, if loaded.
    pub fn image(&self) -> Option<&Arc<DynamicImage>> {
        self.image.as_ref()
    }

    /// Whether a real image is present.
    pub fn is_loaded(&self) -> bool {
        self.state == TileState::Loaded
    }

    /// Whether the tile is still waiting for a load sweep.
    pub fn is_pending(&self) -> bool {
        self.state == TileState::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_accessors() {
        let key = TileKey::new(16, 19295, 24640);
        assert_eq!(key.zoom(), 16);
        assert_eq!(key.x(), 19295);
        assert_eq!(key.y(), 24640);
    }

    #[test]
    fn test_key_within_world() {
        assert!(TileKey::new(0, 0, 0).is_within_world());
        assert!(TileKey::new(2, 3, 3).is_within_world());
        assert!(TileKey::new(18, 262143, 262143).is_within_world());
    }

    #[test]
    fn test_key_outside_world() {
        assert!(!TileKey::new(2, 4, 0).is_within_world());
        assert!(!TileKey::new(2, 0, 4).is_within_world());
        assert!(!TileKey::new(2, -1, 0).is_within_world());
        assert!(!TileKey::new(2, 0, -1).is_within_world());
        assert!(!TileKey::new(0, 1, 0).is_within_world());
    }

    #[test]
    fn test_key_display() {
        let key = TileKey::new(5, 12, -1);
        assert_eq!(format!("{}", key), "5/12/-1");
    }

    #[test]
    fn test_placeholder_tiles_have_no_image() {
        let key = TileKey::new(3, 1, 2);

        let pending = Tile::pending(key);
        assert_eq!(pending.state(), TileState::Pending);
        assert!(pending.image().is_none());
        assert!(pending.is_pending());
        assert!(!pending.is_loaded());

        let missing = Tile::missing(key);
        assert_eq!(missing.state(), TileState::Missing);
        assert!(missing.image().is_none());
        assert!(!missing.is_pending());
    }

    #[test]
    fn test_loaded_tile_keeps_image() {
        let key = TileKey::new(3, 1, 2);
        let image = Arc::new(DynamicImage::new_rgba8(1, 1));

        let tile = Tile::loaded(key, Arc::clone(&image));
        assert!(tile.is_loaded());
        assert!(tile.image().is_some());
        assert_eq!(tile.key(), key);
    }
}
