//! Tile resolution: disk hit, background placeholder or network fetch.
//!
//! [`TileCache`] composes the disk store and the fetcher into a single
//! `resolve` call that always returns a [`Tile`], never an error. Degraded
//! outcomes are placeholder states so the surrounding view can render a
//! partial map immediately.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::cache::fetcher::{FetchError, ReqwestClient, TileFetcher};
use crate::cache::store::TileStore;
use crate::config::MapSourceConfig;
use crate::executor::RenderExecutor;
use crate::tile::{Tile, TileKey};

/// Two-tier tile cache: disk first, network on demand.
pub struct TileCache {
    store: TileStore,
    fetcher: TileFetcher,
    executor: Arc<dyn RenderExecutor>,
}

impl TileCache {
    /// Create a cache over a disk store and a fetcher.
    ///
    /// # Arguments
    ///
    /// * `store` - Disk-backed tile store
    /// * `fetcher` - Network fetcher for cache misses
    /// * `executor` - Render-affinity context for image construction
    pub fn new(store: TileStore, fetcher: TileFetcher, executor: Arc<dyn RenderExecutor>) -> Self {
        Self {
            store,
            fetcher,
            executor,
        }
    }

    /// Create a cache from a tile source config, using the real HTTP
    /// transport.
    pub fn with_config(
        config: &MapSourceConfig,
        executor: Arc<dyn RenderExecutor>,
    ) -> Result<Self, FetchError> {
        let client = Arc::new(ReqwestClient::new()?);
        Ok(Self::new(
            TileStore::new(config.cache_root.clone()),
            TileFetcher::new(client, config.base_url.clone()),
            executor,
        ))
    }

    /// The underlying disk store.
    pub fn store(&self) -> &TileStore {
        &self.store
    }

    /// Resolve a single tile request.
    ///
    /// - A key outside the world grid returns a missing placeholder
    ///   immediately, with no I/O of any kind.
    /// - A disk hit returns a loaded tile.
    /// - A miss with `cached_only` set returns a pending placeholder
    ///   without touching the network; a later sweep picks it up.
    /// - A miss otherwise fetches synchronously, which may block the
    ///   calling thread on network I/O. Callers needing responsiveness
    ///   must resolve from a background worker.
    ///
    /// Fetch and decode failures degrade to a missing placeholder and are
    /// never written to disk, so a later retry can succeed.
    pub fn resolve(&self, key: TileKey, cached_only: bool) -> Tile {
        if !key.is_within_world() {
            return Tile::missing(key);
        }

        if let Some(bytes) = self.store.read(&key) {
            match self.decode(bytes) {
                Ok(image) => return Tile::loaded(key, Arc::new(image)),
                Err(e) => {
                    // Fall through to the miss path so the tile can be
                    // refetched over the corrupt file
                    warn!(%key, error = %e, "cached tile failed to decode");
                }
            }
        }

        if cached_only {
            return Tile::pending(key);
        }

        self.fetch_and_store(key)
    }

    fn fetch_and_store(&self, key: TileKey) -> Tile {
        let bytes = match self.fetcher.fetch(&key) {
            Ok(bytes) => bytes,
            Err(e) => {
                debug!(%key, error = %e, "tile fetch failed");
                return Tile::missing(key);
            }
        };

        let image = match self.decode(bytes.clone()) {
            Ok(image) => image,
            Err(e) => {
                debug!(%key, error = %e, "fetched tile failed to decode");
                return Tile::missing(key);
            }
        };

        // Persistence is best-effort: the in-memory tile is already valid
        if let Err(e) = self.store.write(&key, &bytes) {
            warn!(%key, error = %e, "failed to persist tile");
        }

        Tile::loaded(key, Arc::new(image))
    }

    fn decode(&self, bytes: Vec<u8>) -> Result<image::DynamicImage, image::ImageError> {
        self.executor
            .submit_and_wait(Box::new(move || image::load_from_memory(&bytes)))
    }
}
