//! Integration tests for the cached provider against in-memory tile sources.

use approx::assert_relative_eq;
use avaraster_common::{Bounds, GeoPoint};
use avaraster_dem::{
    DemError, ElevationGrid, ElevationQuery, TerrainRgbProvider, TileKey, TileSource, TileSourceConfig,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

const TILE: TileKey = TileKey::new(12, 2181, 1436);

/// Serves a fixed set of tiles and fails for everything else.
#[derive(Default)]
struct MapSource {
    grids: HashMap<TileKey, ElevationGrid>,
    calls: AtomicUsize,
}

impl MapSource {
    fn with(mut self, key: TileKey, grid: ElevationGrid) -> Self {
        self.grids.insert(key, grid);
        self
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl TileSource for MapSource {
    fn fetch(&self, key: TileKey) -> avaraster_dem::Result<ElevationGrid> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.grids.get(&key).cloned().ok_or(DemError::TileDownloadFailed {
            z: key.z,
            x: key.x,
            y: key.y,
            reason: "HTTP 404 Not Found".to_string(),
        })
    }
}

fn provider(source: MapSource) -> (TerrainRgbProvider<Arc<MapSource>>, Arc<MapSource>) {
    let source = Arc::new(source);
    let provider = TerrainRgbProvider::new(Arc::clone(&source), &TileSourceConfig::default()).unwrap();
    (provider, source)
}

#[test]
fn test_exact_texel_returns_its_value() {
    let grid = ElevationGrid::from_fn(512, 512, |x, y| 1000.0 + f64::from(x) + 0.5 * f64::from(y));
    let (provider, _) = provider(MapSource::default().with(TILE, grid));

    let point = TILE.pixel_point(100.0, 200.0, 512);
    provider.prepare(&Bounds::around(point, 1e-4), 10.0);

    assert_eq!(provider.zoom(), 12);
    assert_relative_eq!(provider.get_elevation(point).unwrap(), 1200.0, epsilon = 1e-6);
}

#[test]
fn test_midpoint_of_equal_texels() {
    let grid = ElevationGrid::from_fn(512, 512, |x, _| if x < 300 { 750.0 } else { 2500.0 });
    let (provider, _) = provider(MapSource::default().with(TILE, grid));

    let point = TILE.pixel_point(100.5, 40.5, 512);
    provider.prepare(&Bounds::around(point, 1e-4), 11.0);

    assert_relative_eq!(provider.get_elevation(point).unwrap(), 750.0, epsilon = 1e-6);
    assert_relative_eq!(provider.elevation_at(point).unwrap(), 750.0, epsilon = 1e-6);
}

#[test]
fn test_bilinear_crosses_into_neighbor_tile() {
    let east = TILE.offset(1, 0);
    let source = MapSource::default()
        .with(TILE, ElevationGrid::constant(512, 100.0))
        .with(east, ElevationGrid::constant(512, 300.0));
    let (provider, _) = provider(source);

    // Half a pixel west of the tile edge: x0 = 511 in TILE, x0 + 1 = 0 in `east`
    let point = TILE.pixel_point(511.5, 10.5, 512);
    provider.prepare(&Bounds::around(point, 0.001), 10.0);

    assert!(provider.cached_tiles().contains(&east));
    assert_relative_eq!(provider.get_elevation(point).unwrap(), 200.0, epsilon = 1e-6);
}

#[test]
fn test_missing_neighbor_falls_back_to_first_available() {
    let (provider, _) = provider(MapSource::default().with(TILE, ElevationGrid::constant(512, 100.0)));

    let point = TILE.pixel_point(511.5, 10.5, 512);
    provider.prepare(&Bounds::around(point, 0.001), 10.0);

    assert!(provider.unavailable_tiles().contains(&TILE.offset(1, 0)));
    assert_relative_eq!(provider.get_elevation(point).unwrap(), 100.0);
}

#[test]
fn test_failed_tile_is_never_refetched() {
    let (provider, source) = provider(MapSource::default());
    let point = TILE.pixel_point(256.0, 256.0, 512);
    let bounds = Bounds::around(point, 1e-4);

    let first = provider.prepare(&bounds, 10.0);
    assert_eq!((first.requested, first.fetched, first.failed), (1, 0, 1));

    let second = provider.prepare(&bounds, 10.0);
    assert_eq!((second.requested, second.fetched, second.failed), (1, 0, 0));

    assert_eq!(source.calls(), 1);
    assert_eq!(provider.unavailable_tiles(), vec![TILE]);
    assert_eq!(provider.get_elevation(point), None);
}

#[test]
fn test_prepare_enumerates_tile_rectangle() {
    let (provider, source) = provider(MapSource::default());
    let nw = TILE.bounds();
    let se = TILE.offset(1, 1).bounds();
    let bounds = Bounds::new(nw.min_lng + 0.01, se.max_lng - 0.01, se.min_lat + 0.01, nw.max_lat - 0.01);

    let summary = provider.prepare(&bounds, 10.0);
    assert_eq!(summary.requested, 4);
    assert_eq!(source.calls(), 4);
    assert_eq!(
        provider.unavailable_tiles(),
        vec![TILE, TILE.offset(0, 1), TILE.offset(1, 0), TILE.offset(1, 1)]
    );
}

#[test]
fn test_cached_tiles_survive_zoom_change() {
    let (provider, source) = provider(MapSource::default().with(TILE, ElevationGrid::constant(512, 42.0)));
    let point = TILE.pixel_point(256.0, 256.0, 512);

    provider.prepare(&Bounds::around(point, 1e-4), 10.0);
    provider.prepare(&Bounds::around(point, 1e-4), 6.0);
    assert_eq!(provider.zoom(), 8);
    assert_eq!(provider.get_elevation(point), None);

    // Back at zoom 12 the original tile is still cached
    provider.prepare(&Bounds::around(point, 1e-4), 10.0);
    assert_relative_eq!(provider.get_elevation(point).unwrap(), 42.0);
    assert_eq!(source.calls(), 2);
}
