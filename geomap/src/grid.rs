//! Viewport to tile-grid assembly.
//!
//! [`GridAssembler`] turns a viewport size, a base point and a zoom level
//! into the rectangle of tiles covering it. Coverage geometry comes from an
//! injected [`CoverageCalculator`]; this module only performs the
//! tile-index conversion on the coverage corners and fills the grid through
//! the tile cache.
//!
//! A first pass with `cached_only` set populates every cell instantly from
//! disk, leaving pending placeholders for absent tiles. A later
//! [`load_missing_tiles`](GridAssembler::load_missing_tiles) sweep fetches
//! the placeholders off the rendering thread and signals completion once.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::cache::TileCache;
use crate::coord::{self, Area, GeoLocation, MAX_LAT, MAX_LON, MIN_LAT, MIN_LON};
use crate::tile::{Tile, TileKey, TileState};

/// Smallest viewport edge, in pixels, worth building a tile set for.
pub const MIN_VIEWPORT_PX: u32 = 32;

/// How a base point anchors the coverage area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    /// Base point is the center of the viewport.
    Center,
    /// Base point is the top-left corner of the viewport.
    TopLeft,
    /// Base point is the bottom-right corner of the viewport.
    BottomRight,
}

/// Viewport dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewportSize {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl ViewportSize {
    /// Create a new viewport size.
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// External collaborator supplying coverage geometry.
///
/// The projection math behind these two functions is owned by the host
/// application; this core consumes the results as opaque values.
pub trait CoverageCalculator: Send + Sync {
    /// Lat/lon bounding box a viewport renders for the given base point,
    /// anchor and zoom.
    fn calculate_coverage(
        &self,
        viewport: ViewportSize,
        base_point: GeoLocation,
        anchor: Anchor,
        zoom: u8,
    ) -> Area;

    /// Virtual pixel position of a geographic point at the given zoom.
    fn coordinate_to_display(&self, point: GeoLocation, zoom: u8) -> (i64, i64);
}

/// The rectangle of tiles covering one viewport.
///
/// Owned exclusively by the caller that requested it. The grid is fully
/// populated on construction; pending cells are replaced in place by
/// [`GridAssembler::load_missing_tiles`] until `missing_count` reaches 0.
pub struct TileSet {
    tiles: Vec<Vec<Tile>>,
    x_offset: i32,
    y_offset: i32,
    zoom: u8,
    missing_count: usize,
}

impl TileSet {
    /// Number of tile rows.
    pub fn rows(&self) -> usize {
        self.tiles.len()
    }

    /// Number of tile columns.
    pub fn cols(&self) -> usize {
        self.tiles.first().map_or(0, Vec::len)
    }

    /// Zoom level the grid was built at.
    pub fn zoom(&self) -> u8 {
        self.zoom
    }

    /// Horizontal displacement, in pixels, between the grid's top-left tile
    /// corner and the requested coverage corner. At most zero; shifting the
    /// grid by this offset makes sub-tile panning look smooth.
    pub fn x_offset(&self) -> i32 {
        self.x_offset
    }

    /// Vertical displacement, see [`x_offset`](Self::x_offset).
    pub fn y_offset(&self) -> i32 {
        self.y_offset
    }

    /// Number of cells still holding a pending placeholder.
    pub fn missing_count(&self) -> usize {
        self.missing_count
    }

    /// The tile at a grid cell.
    pub fn tile(&self, row: usize, col: usize) -> Option<&Tile> {
        self.tiles.get(row).and_then(|r| r.get(col))
    }

    /// Iterate over all tiles in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter().flatten()
    }
}

/// Builds tile sets for viewports and sweeps their missing tiles.
pub struct GridAssembler {
    cache: TileCache,
    coverage: Arc<dyn CoverageCalculator>,
}

impl GridAssembler {
    /// Create an assembler over a tile cache and a coverage calculator.
    pub fn new(cache: TileCache, coverage: Arc<dyn CoverageCalculator>) -> Self {
        Self { cache, coverage }
    }

    /// The underlying tile cache.
    pub fn cache(&self) -> &TileCache {
        &self.cache
    }

    /// Build the tile set covering a viewport.
    ///
    /// Returns `None` for viewports smaller than 32x32 pixels; anything
    /// that small is not worth covering. Every cell of the returned grid is
    /// populated: real tiles from cache, pending placeholders for tiles a
    /// later sweep should fetch (counted in `missing_count`), and missing
    /// placeholders for cells past the edge of the world.
    ///
    /// # Arguments
    ///
    /// * `viewport` - Viewport size in pixels
    /// * `base_point` - Geographic base point of the viewport
    /// * `anchor` - How the base point anchors the coverage
    /// * `zoom` - Zoom level
    /// * `cached_only` - Skip network fetches, leaving pending placeholders
    pub fn build_tile_set(
        &self,
        viewport: ViewportSize,
        base_point: GeoLocation,
        anchor: Anchor,
        zoom: u8,
        cached_only: bool,
    ) -> Option<TileSet> {
        if viewport.width < MIN_VIEWPORT_PX || viewport.height < MIN_VIEWPORT_PX {
            debug!(
                width = viewport.width,
                height = viewport.height,
                "viewport below minimum, skipping tile set"
            );
            return None;
        }

        let area = self
            .coverage
            .calculate_coverage(viewport, base_point, anchor, zoom);

        let top_left = clamp_to_world(area.top_left());
        let bottom_right = clamp_to_world(area.bottom_right());

        let nw = match coord::to_tile(top_left.latitude, top_left.longitude, zoom) {
            Ok(key) => key,
            Err(e) => {
                warn!(error = %e, area = %area, "coverage corner not convertible");
                return None;
            }
        };
        let se = match coord::to_tile(bottom_right.latitude, bottom_right.longitude, zoom) {
            Ok(key) => key,
            Err(e) => {
                warn!(error = %e, area = %area, "coverage corner not convertible");
                return None;
            }
        };

        // Tile y grows southward, so the north-west corner carries the
        // smaller y
        let (x0, x1) = (nw.x(), se.x());
        let (y0, y1) = (nw.y(), se.y());

        let rows = (y1 - y0 + 1) as usize;
        let cols = (x1 - x0 + 1) as usize;

        let mut missing_count = 0;
        let mut tiles = Vec::with_capacity(rows);
        for r in 0..rows {
            let mut row = Vec::with_capacity(cols);
            for c in 0..cols {
                let key = TileKey::new(zoom, x0 + c as i32, y0 + r as i32);
                let tile = self.cache.resolve(key, cached_only);
                if tile.state() == TileState::Pending {
                    missing_count += 1;
                }
                row.push(tile);
            }
            tiles.push(row);
        }

        // Sub-tile alignment: where the grid's true top-left corner falls
        // relative to the requested coverage corner, in display pixels
        let grid_origin = coord::tile_origin(&TileKey::new(zoom, x0, y0));
        let grid_px = self.coverage.coordinate_to_display(grid_origin, zoom);
        let view_px = self.coverage.coordinate_to_display(top_left, zoom);

        debug!(
            zoom,
            rows, cols, missing_count, "assembled tile set for viewport"
        );

        Some(TileSet {
            tiles,
            x_offset: (grid_px.0 - view_px.0) as i32,
            y_offset: (grid_px.1 - view_px.1) as i32,
            zoom,
            missing_count,
        })
    }

    /// Fetch every pending tile in the set.
    ///
    /// Re-resolves each pending cell with the network enabled, replaces the
    /// cell and decrements `missing_count` when the fetch succeeds. Cells
    /// whose fetch fails stay pending so a later sweep can retry them. The
    /// completion callback is invoked exactly once, after the full sweep.
    ///
    /// This is a blocking sweep intended to run off the rendering thread.
    /// It does not parallelize fetches and cannot be cancelled; overlapping
    /// sweeps run to completion without coordination.
    pub fn load_missing_tiles<F: FnOnce()>(&self, tile_set: &mut TileSet, on_complete: F) {
        for row in tile_set.tiles.iter_mut() {
            for cell in row.iter_mut() {
                if cell.state() != TileState::Pending {
                    continue;
                }
                let tile = self.cache.resolve(cell.key(), false);
                if tile.state() == TileState::Loaded {
                    *cell = tile;
                    tile_set.missing_count = tile_set.missing_count.saturating_sub(1);
                }
            }
        }
        on_complete();
    }
}

fn clamp_to_world(point: GeoLocation) -> GeoLocation {
    GeoLocation::new(
        point.latitude.clamp(MIN_LAT, MAX_LAT),
        point.longitude.clamp(MIN_LON, MAX_LON),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    use tempfile::TempDir;

    use crate::cache::{MockHttpClient, TileFetcher, TileStore};
    use crate::coord::TILE_SIZE;
    use crate::executor::ImmediateExecutor;

    const BASE_URL: &str = "https://tiles.example.org/";

    fn png_bytes() -> Vec<u8> {
        let mut bytes = Vec::new();
        image::DynamicImage::new_rgba8(1, 1)
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    /// Straightforward Web Mercator coverage for tests: the viewport maps
    /// 1:1 onto the virtual pixel plane of `TILE_SIZE * 2^zoom` pixels.
    struct MercatorCoverage;

    fn to_display(point: GeoLocation, zoom: u8) -> (i64, i64) {
        let n = (TILE_SIZE as f64) * 2.0_f64.powi(zoom as i32);
        let x = (point.longitude + 180.0) / 360.0 * n;
        let lat_rad = point.latitude.to_radians();
        let y = (1.0 - lat_rad.tan().asinh() / std::f64::consts::PI) / 2.0 * n;
        (x as i64, y as i64)
    }

    fn from_display(x: f64, y: f64, zoom: u8) -> GeoLocation {
        let n = (TILE_SIZE as f64) * 2.0_f64.powi(zoom as i32);
        let lon = x / n * 360.0 - 180.0;
        let lat = (std::f64::consts::PI * (1.0 - 2.0 * y / n)).sinh().atan();
        GeoLocation::new(lat.to_degrees(), lon)
    }

    impl CoverageCalculator for MercatorCoverage {
        fn calculate_coverage(
            &self,
            viewport: ViewportSize,
            base_point: GeoLocation,
            anchor: Anchor,
            zoom: u8,
        ) -> Area {
            let (px, py) = to_display(base_point, zoom);
            let (w, h) = (viewport.width as f64, viewport.height as f64);
            let (left, top) = match anchor {
                Anchor::Center => (px as f64 - w / 2.0, py as f64 - h / 2.0),
                Anchor::TopLeft => (px as f64, py as f64),
                Anchor::BottomRight => (px as f64 - w, py as f64 - h),
            };
            let top_left = from_display(left, top, zoom);
            let bottom_right = from_display(left + w, top + h, zoom);
            Area::new(
                top_left.latitude,
                top_left.longitude,
                bottom_right.latitude,
                bottom_right.longitude,
            )
        }

        fn coordinate_to_display(&self, point: GeoLocation, zoom: u8) -> (i64, i64) {
            to_display(point, zoom)
        }
    }

    fn assembler(http: Arc<MockHttpClient>) -> (TempDir, GridAssembler) {
        let dir = TempDir::new().unwrap();
        let cache = TileCache::new(
            TileStore::new(dir.path()),
            TileFetcher::new(http, BASE_URL),
            Arc::new(ImmediateExecutor),
        );
        (dir, GridAssembler::new(cache, Arc::new(MercatorCoverage)))
    }

    const BERLIN: GeoLocation = GeoLocation {
        latitude: 52.52,
        longitude: 13.405,
    };

    #[test]
    fn test_tiny_viewport_is_rejected() {
        let (_dir, assembler) = assembler(Arc::new(MockHttpClient::ok(png_bytes())));

        let result = assembler.build_tile_set(
            ViewportSize::new(31, 100),
            BERLIN,
            Anchor::Center,
            10,
            true,
        );
        assert!(result.is_none());
    }

    #[test]
    fn test_minimum_viewport_builds() {
        let (_dir, assembler) = assembler(Arc::new(MockHttpClient::ok(png_bytes())));

        let tiles = assembler
            .build_tile_set(ViewportSize::new(64, 64), BERLIN, Anchor::Center, 10, true)
            .expect("64x64 viewport must build a tile set");
        assert!(tiles.rows() >= 1);
        assert!(tiles.cols() >= 1);
    }

    #[test]
    fn test_grid_dimensions_match_coverage_corners() {
        let (_dir, assembler) = assembler(Arc::new(MockHttpClient::ok(png_bytes())));
        let zoom = 10;
        let viewport = ViewportSize::new(800, 600);

        let tiles = assembler
            .build_tile_set(viewport, BERLIN, Anchor::Center, zoom, true)
            .unwrap();

        let area = MercatorCoverage.calculate_coverage(viewport, BERLIN, Anchor::Center, zoom);
        let nw = coord::to_tile(area.lat_high(), area.lon_low(), zoom).unwrap();
        let se = coord::to_tile(area.lat_low(), area.lon_high(), zoom).unwrap();

        assert_eq!(tiles.cols() as i32, se.x() - nw.x() + 1);
        assert_eq!(tiles.rows() as i32, se.y() - nw.y() + 1);
    }

    #[test]
    fn test_every_cell_is_populated() {
        let (_dir, assembler) = assembler(Arc::new(MockHttpClient::ok(png_bytes())));

        let tiles = assembler
            .build_tile_set(
                ViewportSize::new(700, 500),
                BERLIN,
                Anchor::Center,
                8,
                true,
            )
            .unwrap();

        let mut count = 0;
        for r in 0..tiles.rows() {
            for c in 0..tiles.cols() {
                assert!(tiles.tile(r, c).is_some());
                count += 1;
            }
        }
        assert_eq!(count, tiles.rows() * tiles.cols());
        assert_eq!(tiles.iter().count(), count);
    }

    #[test]
    fn test_cached_only_counts_pending_cells() {
        let http = Arc::new(MockHttpClient::ok(png_bytes()));
        let (_dir, assembler) = assembler(Arc::clone(&http));

        let tiles = assembler
            .build_tile_set(
                ViewportSize::new(300, 300),
                BERLIN,
                Anchor::Center,
                12,
                true,
            )
            .unwrap();

        // Nothing is cached yet, so every in-world cell is pending
        let pending = tiles.iter().filter(|t| t.is_pending()).count();
        assert_eq!(pending, tiles.missing_count());
        assert!(tiles.missing_count() > 0);
        assert_eq!(http.calls(), 0, "cached-only pass must not fetch");
    }

    #[test]
    fn test_offsets_are_within_one_tile() {
        let (_dir, assembler) = assembler(Arc::new(MockHttpClient::ok(png_bytes())));

        let tiles = assembler
            .build_tile_set(
                ViewportSize::new(512, 512),
                BERLIN,
                Anchor::Center,
                11,
                true,
            )
            .unwrap();

        // The grid corner lies at or north-west of the coverage corner
        assert!(tiles.x_offset() <= 0 && tiles.x_offset() > -(TILE_SIZE as i32));
        assert!(tiles.y_offset() <= 0 && tiles.y_offset() > -(TILE_SIZE as i32));
    }

    #[test]
    fn test_load_missing_tiles_completes_the_set() {
        let http = Arc::new(MockHttpClient::ok(png_bytes()));
        let (_dir, assembler) = assembler(Arc::clone(&http));

        let mut tiles = assembler
            .build_tile_set(
                ViewportSize::new(300, 300),
                BERLIN,
                Anchor::Center,
                12,
                true,
            )
            .unwrap();
        let initial_missing = tiles.missing_count();
        assert!(initial_missing > 0);

        let mut completions = 0;
        assembler.load_missing_tiles(&mut tiles, || completions += 1);

        assert_eq!(completions, 1, "completion callback fires exactly once");
        assert_eq!(tiles.missing_count(), 0);
        assert_eq!(http.calls(), initial_missing);
        assert!(tiles.iter().all(|t| !t.is_pending()));
    }

    #[test]
    fn test_failed_sweep_leaves_cells_pending_for_retry() {
        let http = Arc::new(MockHttpClient::err(crate::cache::FetchError::Http(
            "503".to_string(),
        )));
        let (_dir, assembler) = assembler(Arc::clone(&http));

        let mut tiles = assembler
            .build_tile_set(
                ViewportSize::new(300, 300),
                BERLIN,
                Anchor::Center,
                12,
                true,
            )
            .unwrap();
        let initial_missing = tiles.missing_count();

        let mut completions = 0;
        assembler.load_missing_tiles(&mut tiles, || completions += 1);
        assert_eq!(completions, 1);
        assert_eq!(tiles.missing_count(), initial_missing);

        // Server recovers, a second sweep drains the set
        http.set_response(Ok(png_bytes()));
        assembler.load_missing_tiles(&mut tiles, || completions += 1);
        assert_eq!(completions, 2);
        assert_eq!(tiles.missing_count(), 0);
    }

    #[test]
    fn test_zoomed_out_viewport_includes_border_cells() {
        let http = Arc::new(MockHttpClient::ok(png_bytes()));
        let (_dir, assembler) = assembler(Arc::clone(&http));

        // At zoom 0 the world is one tile; a large viewport pushes the
        // coverage to the world edge
        let tiles = assembler
            .build_tile_set(
                ViewportSize::new(1024, 1024),
                GeoLocation::new(0.0, 0.0),
                Anchor::Center,
                0,
                true,
            )
            .unwrap();

        assert!(tiles.rows() >= 1 && tiles.cols() >= 1);
        // Border cells resolve to missing, not pending, and are excluded
        // from the sweep count
        let pending = tiles.iter().filter(|t| t.is_pending()).count();
        assert_eq!(pending, tiles.missing_count());
    }
}
