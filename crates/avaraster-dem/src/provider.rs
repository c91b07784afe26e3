//! Cached terrain-RGB elevation provider.
//!
//! ## Thread Safety
//!
//! The provider is shared by reference between the thread that prepares a
//! viewport and the threads that sample it:
//! - Missing tiles for one `prepare()` call are fetched in parallel on the
//!   rayon pool and joined before `prepare()` returns
//! - The cache is a `parking_lot::RwLock<HashMap>`; readers never block each
//!   other
//! - A sample taken while another thread is still preparing sees whatever
//!   tiles have been inserted so far

use crate::tiles::tile_position;
use crate::{DemError, ElevationGrid, Result, TileKey, TileSource, TileSourceConfig, MAX_ZOOM};
use avaraster_common::{Bounds, GeoPoint};
use avaraster_metrics::metric_defs;
use parking_lot::RwLock;
use rayon::prelude::*;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Anything that can answer point elevation queries.
///
/// `None` means "no data", which is distinct from an elevation of zero.
pub trait ElevationQuery {
    /// Elevation in meters at a point.
    fn elevation_at(&self, point: GeoPoint) -> Option<f64>;
}

impl<F> ElevationQuery for F
where
    F: Fn(GeoPoint) -> Option<f64>,
{
    fn elevation_at(&self, point: GeoPoint) -> Option<f64> {
        self(point)
    }
}

/// Cache slot for one tile.
#[derive(Debug, Clone)]
pub enum TileEntry {
    /// Decoded elevations.
    Ready(Arc<ElevationGrid>),
    /// The fetch failed; the tile is never requested again.
    Unavailable,
}

/// Outcome of one [`TerrainRgbProvider::prepare`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PrepareSummary {
    /// Tile zoom level used.
    pub zoom: u8,
    /// Tiles covering the bounds.
    pub requested: usize,
    /// Tiles newly fetched and decoded.
    pub fetched: usize,
    /// Tiles newly marked unavailable.
    pub failed: usize,
}

/// Terrain-RGB elevation provider with a session-lifetime tile cache.
///
/// Tiles are never evicted or refreshed.
pub struct TerrainRgbProvider<S> {
    source: S,
    tile_size: u32,
    max_tile_zoom: u8,
    zoom_offset: u8,
    max_tiles: usize,
    /// Zoom level chosen by the most recent `prepare()`.
    zoom: AtomicU8,
    tiles: RwLock<HashMap<TileKey, TileEntry>>,
}

impl<S> std::fmt::Debug for TerrainRgbProvider<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TerrainRgbProvider")
            .field("tile_size", &self.tile_size)
            .field("zoom", &self.zoom())
            .field("cached", &self.tiles.read().len())
            .finish()
    }
}

impl<S: TileSource> TerrainRgbProvider<S> {
    /// Create a provider over a tile source.
    ///
    /// Sampling starts at `max_tile_zoom` until the first `prepare()`.
    pub fn new(source: S, config: &TileSourceConfig) -> Result<Self> {
        if config.max_tile_zoom > MAX_ZOOM {
            return Err(DemError::InvalidZoomLevel(config.max_tile_zoom));
        }
        if config.tile_size == 0 {
            return Err(DemError::InvalidTileSize {
                expected: 1,
                width: 0,
                height: 0,
            });
        }

        Ok(Self {
            source,
            tile_size: config.tile_size,
            max_tile_zoom: config.max_tile_zoom,
            zoom_offset: config.zoom_offset,
            max_tiles: config.max_tiles_per_prepare.max(1),
            zoom: AtomicU8::new(config.max_tile_zoom),
            tiles: RwLock::new(HashMap::new()),
        })
    }

    /// Tile zoom for a map zoom: `floor(map_zoom) + offset`, capped at the
    /// configured maximum.
    pub fn tile_zoom_for(&self, map_zoom: f64) -> u8 {
        let zoom = map_zoom.floor() + f64::from(self.zoom_offset);
        zoom.clamp(0.0, f64::from(self.max_tile_zoom)) as u8
    }

    /// Make sure every tile covering `bounds` is cached.
    ///
    /// Blocks until all fetches have finished. Failures are logged and stored
    /// as [`TileEntry::Unavailable`].
    pub fn prepare(&self, bounds: &Bounds, map_zoom: f64) -> PrepareSummary {
        let start = Instant::now();
        let finite = [bounds.min_lng, bounds.max_lng, bounds.min_lat, bounds.max_lat]
            .iter()
            .all(|v| v.is_finite());
        if !finite {
            debug!(?bounds, "Skipping prepare for non-finite bounds");
            return PrepareSummary {
                zoom: self.zoom(),
                ..PrepareSummary::default()
            };
        }

        let wanted = self.tile_zoom_for(map_zoom);
        let mut zoom = wanted;
        let mut range = TileRange::covering(bounds, zoom);
        while range.len() > self.max_tiles && zoom > 0 {
            zoom -= 1;
            range = TileRange::covering(bounds, zoom);
        }
        if zoom != wanted {
            warn!(
                wanted,
                zoom,
                tiles = range.len(),
                limit = self.max_tiles,
                "Viewport too large for tile zoom, preparing coarser tiles"
            );
        }
        self.zoom.store(zoom, Ordering::Relaxed);

        let mut summary = PrepareSummary {
            zoom,
            ..PrepareSummary::default()
        };
        let requested = range.keys(zoom);
        summary.requested = requested.len();

        let missing: Vec<TileKey> = {
            let tiles = self.tiles.read();
            requested
                .into_iter()
                .filter(|key| !tiles.contains_key(key))
                .collect()
        };

        let results: Vec<(TileKey, TileEntry)> = missing
            .par_iter()
            .map(|&key| (key, self.fetch_entry(key)))
            .collect();

        {
            let mut tiles = self.tiles.write();
            for (key, entry) in results {
                match entry {
                    TileEntry::Ready(_) => summary.fetched += 1,
                    TileEntry::Unavailable => summary.failed += 1,
                }
                tiles.entry(key).or_insert(entry);
            }
        }

        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
        metrics::histogram!(metric_defs::DEM_PREPARE_TIME.name).record(elapsed_ms);
        if summary.fetched > 0 || summary.failed > 0 {
            info!(
                zoom,
                requested = summary.requested,
                fetched = summary.fetched,
                failed = summary.failed,
                elapsed_ms = format!("{elapsed_ms:.0}"),
                "Prepared elevation tiles"
            );
        }

        summary
    }

    fn fetch_entry(&self, key: TileKey) -> TileEntry {
        match self.source.fetch(key) {
            Ok(grid) => {
                metrics::counter!(metric_defs::DEM_TILES_FETCHED.name).increment(1);
                TileEntry::Ready(Arc::new(grid))
            }
            Err(e) => {
                warn!(tile = %key, error = %e, "Elevation tile unavailable");
                metrics::counter!(metric_defs::DEM_TILES_FAILED.name).increment(1);
                TileEntry::Unavailable
            }
        }
    }
}

/// Inclusive rectangle of tile indices covering a box.
#[derive(Debug, Clone, Copy)]
struct TileRange {
    min_x: i32,
    max_x: i32,
    min_y: i32,
    max_y: i32,
}

impl TileRange {
    fn covering(bounds: &Bounds, zoom: u8) -> Self {
        let nw = TileKey::containing(GeoPoint::new(bounds.min_lng, bounds.max_lat), zoom).clamped();
        let se = TileKey::containing(GeoPoint::new(bounds.max_lng, bounds.min_lat), zoom).clamped();
        Self {
            min_x: nw.x.min(se.x),
            max_x: nw.x.max(se.x),
            min_y: nw.y.min(se.y),
            max_y: nw.y.max(se.y),
        }
    }

    fn len(&self) -> usize {
        let columns = i64::from(self.max_x) - i64::from(self.min_x) + 1;
        let rows = i64::from(self.max_y) - i64::from(self.min_y) + 1;
        usize::try_from(columns * rows).unwrap_or(usize::MAX)
    }

    fn keys(&self, zoom: u8) -> Vec<TileKey> {
        let (min_y, max_y) = (self.min_y, self.max_y);
        (self.min_x..=self.max_x)
            .flat_map(|x| (min_y..=max_y).map(move |y| TileKey::new(zoom, x, y)))
            .collect()
    }
}

impl<S> TerrainRgbProvider<S> {
    /// Tile zoom level used for sampling.
    pub fn zoom(&self) -> u8 {
        self.zoom.load(Ordering::Relaxed)
    }

    /// Decoded tile edge length in pixels.
    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    /// Keys of every successfully cached tile, sorted.
    pub fn cached_tiles(&self) -> Vec<TileKey> {
        self.keys_where(|entry| matches!(entry, TileEntry::Ready(_)))
    }

    /// Keys of every tile marked unavailable, sorted.
    pub fn unavailable_tiles(&self) -> Vec<TileKey> {
        self.keys_where(|entry| matches!(entry, TileEntry::Unavailable))
    }

    fn keys_where(&self, predicate: impl Fn(&TileEntry) -> bool) -> Vec<TileKey> {
        let mut keys: Vec<TileKey> = self
            .tiles
            .read()
            .iter()
            .filter(|(_, entry)| predicate(entry))
            .map(|(key, _)| *key)
            .collect();
        keys.sort_unstable();
        keys
    }

    /// Bilinearly interpolated elevation at a point.
    ///
    /// The four texels around the sub-pixel position may come from
    /// neighboring tiles. When any of them is missing the first available of
    /// (x0, y0), (x0 + 1, y0), (x0, y0 + 1), (x0 + 1, y0 + 1) is returned
    /// instead; with none available the result is `None`.
    pub fn get_elevation(&self, point: GeoPoint) -> Option<f64> {
        let zoom = self.zoom();
        let (fx, fy) = tile_position(point, zoom);
        if !fx.is_finite() || !fy.is_finite() {
            return None;
        }

        let tile = TileKey::new(zoom, fx.floor() as i32, fy.floor() as i32);
        let size = f64::from(self.tile_size);
        let px = (fx - fx.floor()) * size;
        let py = (fy - fy.floor()) * size;

        let (x0, y0) = (px.floor(), py.floor());
        let (dx, dy) = (px - x0, py - y0);
        let (x0, y0) = (x0 as i64, y0 as i64);

        let tiles = self.tiles.read();
        let texel = |x: i64, y: i64| self.texel(&tiles, tile, x, y);
        let h00 = texel(x0, y0);
        let h10 = texel(x0 + 1, y0);
        let h01 = texel(x0, y0 + 1);
        let h11 = texel(x0 + 1, y0 + 1);

        match (h00, h10, h01, h11) {
            (Some(h00), Some(h10), Some(h01), Some(h11)) => {
                let h0 = h00 * (1.0 - dx) + h10 * dx;
                let h1 = h01 * (1.0 - dx) + h11 * dx;
                Some(h0 * (1.0 - dy) + h1 * dy)
            }
            _ => h00.or(h10).or(h01).or(h11),
        }
    }

    /// Texel lookup that wraps pixel indices outside `0..tile_size` into the
    /// adjacent tile.
    fn texel(&self, tiles: &HashMap<TileKey, TileEntry>, tile: TileKey, x: i64, y: i64) -> Option<f64> {
        let size = i64::from(self.tile_size);
        let key = tile.offset(x.div_euclid(size) as i32, y.div_euclid(size) as i32);
        match tiles.get(&key)? {
            TileEntry::Ready(grid) => grid.get(x.rem_euclid(size) as u32, y.rem_euclid(size) as u32),
            TileEntry::Unavailable => None,
        }
    }
}

impl<S> ElevationQuery for TerrainRgbProvider<S> {
    fn elevation_at(&self, point: GeoPoint) -> Option<f64> {
        self.get_elevation(point)
    }
}
