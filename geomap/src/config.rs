//! Tile source configuration.
//!
//! The host application owns the tile server URL and the cache location;
//! this module only gives them a typed home and sensible defaults.

use std::path::PathBuf;

/// Default public tile server.
pub const DEFAULT_TILE_SERVER_URL: &str = "https://tile.openstreetmap.org/";

/// Configuration for a tile source.
#[derive(Clone, Debug)]
pub struct MapSourceConfig {
    /// Tile server base URL, always ending with `/`.
    pub base_url: String,

    /// Root directory of the on-disk tile cache.
    pub cache_root: PathBuf,
}

impl MapSourceConfig {
    /// Create a new tile source config.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Tile server base URL, normalized to end with `/`
    /// * `cache_root` - Root directory for cached tiles
    pub fn new(base_url: impl Into<String>, cache_root: impl Into<PathBuf>) -> Self {
        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Self {
            base_url,
            cache_root: cache_root.into(),
        }
    }

    /// Set the tile server base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        self.base_url = base_url;
        self
    }

    /// Set the cache root directory.
    pub fn with_cache_root(mut self, cache_root: impl Into<PathBuf>) -> Self {
        self.cache_root = cache_root.into();
        self
    }

    /// Platform cache directory for this crate, falling back to the
    /// system temporary directory when none is available.
    pub fn default_cache_root() -> PathBuf {
        dirs::cache_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("geomap")
    }
}

impl Default for MapSourceConfig {
    fn default() -> Self {
        Self::new(DEFAULT_TILE_SERVER_URL, Self::default_cache_root())
    }
}
