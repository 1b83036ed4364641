//! Disk-backed tile store.
//!
//! One file per tile at `{root}/OSM/{zoom}/{x}/{y}.png`, directories created
//! on demand. Files are never expired or evicted by this subsystem; the
//! cache grows unbounded, which is a known limitation of the design.
//!
//! All filesystem access goes through a single process-wide lock shared by
//! every store instance, serializing writes and the existence checks that
//! precede them.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::tile::TileKey;

/// Serializes all tile persistence across every store in the process.
static DISK_LOCK: Mutex<()> = Mutex::new(());

/// Subdirectory under the cache root holding the tile hierarchy.
const TILE_DIR: &str = "OSM";

/// Disk-backed key to image-bytes cache.
pub struct TileStore {
    root: PathBuf,
}

impl TileStore {
    /// Create a store rooted at the given cache directory.
    ///
    /// The directory is not created until the first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The cache root this store was created with.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Deterministic file path for a tile key.
    pub fn tile_path(&self, key: &TileKey) -> PathBuf {
        self.root
            .join(TILE_DIR)
            .join(key.zoom().to_string())
            .join(key.x().to_string())
            .join(format!("{}.png", key.y()))
    }

    /// Read the cached bytes for a tile, if present.
    ///
    /// A missing file is a normal cache miss. Unexpected read errors are
    /// logged and also reported as a miss, since caching is best-effort.
    pub fn read(&self, key: &TileKey) -> Option<Vec<u8>> {
        let path = self.tile_path(key);
        let _guard = DISK_LOCK.lock();

        match fs::read(&path) {
            Ok(bytes) if !bytes.is_empty() => Some(bytes),
            Ok(_) => {
                debug!(%key, "cached tile file is empty, treating as miss");
                None
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => {
                warn!(%key, error = %e, "failed to read cached tile");
                None
            }
        }
    }

    /// Whether a tile file exists on disk.
    pub fn contains(&self, key: &TileKey) -> bool {
        let path = self.tile_path(key);
        let _guard = DISK_LOCK.lock();
        path.is_file()
    }

    /// Persist tile bytes, creating parent directories as needed.
    pub fn write(&self, key: &TileKey, bytes: &[u8]) -> io::Result<()> {
        let path = self.tile_path(key);
        let _guard = DISK_LOCK.lock();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, bytes)
    }
}
