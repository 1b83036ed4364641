//! Geomap - map tile core for a network-management console
//!
//! This library provides the geographic map machinery a management console
//! needs behind its world-map views: slippy-map tile coordinate math, a
//! disk-backed tile cache with degrade-gracefully placeholder semantics,
//! viewport-to-tile-grid assembly, and a point quad-tree spatial index for
//! "which entities lie in this rectangle" queries.
//!
//! # Architecture
//!
//! ```text
//! viewport ──► GridAssembler ──► TileCache ──► TileStore (disk)
//!                  │                 │
//!                  │                 └──► TileFetcher (HTTP)
//!                  ▼
//!               TileSet ◄── load_missing_tiles sweep
//!
//! entities ──► QuadTree ──► bounding-box queries
//! ```
//!
//! Coverage geometry (viewport to lat/lon bounding box) and native image
//! construction are injected through the [`grid::CoverageCalculator`] and
//! [`executor::RenderExecutor`] traits, so the same core runs under a GUI
//! toolkit or headless.

pub mod cache;
pub mod config;
pub mod coord;
pub mod executor;
pub mod grid;
pub mod spatial;
pub mod telemetry;
pub mod tile;

pub use cache::{FetchError, HttpClient, ReqwestClient, TileCache, TileFetcher, TileStore};
pub use config::MapSourceConfig;
pub use coord::{Area, CoordError, GeoLocation};
pub use executor::{ImmediateExecutor, RenderExecutor, RenderThread};
pub use grid::{Anchor, CoverageCalculator, GridAssembler, TileSet, ViewportSize};
pub use spatial::QuadTree;
pub use tile::{Tile, TileKey, TileState};
