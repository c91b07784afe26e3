//! End-to-end rasterization over synthetic fields and in-memory tile sources.

use approx::assert_relative_eq;
use avaraster_bulletin::{AvalancheConfig, GenerationRule, RuleProperties};
use avaraster_common::{Aspect, Bounds, GeoPoint, Rgba};
use avaraster_dem::{DemError, ElevationGrid, TerrainRgbProvider, TileKey, TileSource, TileSourceConfig};
use avaraster_render::{
    cap_render_bounds, point_info, CancelToken, Overlay, RasterConfig, RasterGenerator, RenderSession,
};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

const RED: Rgba = Rgba::opaque(0xFF, 0x00, 0x00);
const ORANGE: Rgba = Rgba::opaque(0xFF, 0x99, 0x00);
const CENTER_LAT: f64 = 47.205;
const METERS_PER_DEGREE: f64 = 111_111.0;

fn viewport() -> Bounds {
    Bounds::new(11.0, 11.01, 47.2, 47.21)
}

fn rule(min_elev: f64, max_elev: f64, color: Rgba) -> GenerationRule {
    GenerationRule {
        bounds: viewport(),
        geometry: None,
        min_elev,
        max_elev,
        min_slope: None,
        apply_steepness_logic: false,
        valid_aspects: None,
        color,
        properties: RuleProperties::default(),
    }
}

fn steepness_rule(danger: &str, aspects: Option<BTreeSet<Aspect>>) -> GenerationRule {
    GenerationRule {
        apply_steepness_logic: true,
        valid_aspects: aspects,
        properties: RuleProperties {
            danger_level: Some(danger.to_string()),
            ..RuleProperties::default()
        },
        ..rule(0.0, 10_000.0, Rgba::opaque(0x12, 0x34, 0x56))
    }
}

/// Plane falling toward the north at `slope_deg`.
fn north_facing(slope_deg: f64) -> impl Fn(GeoPoint) -> Option<f64> {
    let gradient = slope_deg.to_radians().tan() * METERS_PER_DEGREE;
    move |p: GeoPoint| Some(2000.0 - gradient * (p.lat - CENTER_LAT))
}

fn draw<F: Fn(GeoPoint) -> Option<f64>>(rules: &[GenerationRule], field: F) -> Option<Overlay> {
    let raster = RasterConfig::default();
    let avalanche = AvalancheConfig::default();
    RasterGenerator::new(&raster, &avalanche).draw(rules, &viewport(), &field)
}

fn assert_uniform(overlay: &Overlay, color: Rgba) {
    for pixel in overlay.image.pixels() {
        assert_eq!(pixel.0, color.to_array());
    }
}

/// Serves the same tile for every key, optionally after a delay.
struct ConstSource {
    elevation: f64,
    delay: Duration,
}

impl ConstSource {
    fn new(elevation: f64) -> Self {
        Self {
            elevation,
            delay: Duration::ZERO,
        }
    }
}

impl TileSource for ConstSource {
    fn fetch(&self, _key: TileKey) -> avaraster_dem::Result<ElevationGrid> {
        std::thread::sleep(self.delay);
        Ok(ElevationGrid::constant(512, self.elevation))
    }
}

struct FailingSource;

impl TileSource for FailingSource {
    fn fetch(&self, key: TileKey) -> avaraster_dem::Result<ElevationGrid> {
        Err(DemError::TileDownloadFailed {
            z: key.z,
            x: key.x,
            y: key.y,
            reason: "HTTP 503 Service Unavailable".to_string(),
        })
    }
}

#[test]
fn test_constant_field_in_range_is_painted() {
    let overlay = draw(&[rule(500.0, 2000.0, RED)], |_| Some(1000.0)).unwrap();
    assert_eq!((overlay.width(), overlay.height()), (100, 100));
    assert_uniform(&overlay, RED);
}

#[test]
fn test_constant_field_out_of_range_draws_nothing() {
    assert!(draw(&[rule(500.0, 2000.0, RED)], |_| Some(5000.0)).is_none());
}

#[test]
fn test_elevation_bounds_inclusive() {
    assert!(draw(&[rule(500.0, 2000.0, RED)], |_| Some(2000.0)).is_some());
    assert!(draw(&[rule(500.0, 2000.0, RED)], |_| Some(500.0)).is_some());
}

#[test]
fn test_tile_backed_field() {
    let provider = TerrainRgbProvider::new(ConstSource::new(1000.0), &TileSourceConfig::default()).unwrap();
    let summary = provider.prepare(&viewport(), 12.0);
    assert!(summary.fetched > 0);

    let raster = RasterConfig::default();
    let avalanche = AvalancheConfig::default();
    let overlay = RasterGenerator::new(&raster, &avalanche)
        .draw(&[rule(500.0, 2000.0, RED)], &viewport(), &provider)
        .unwrap();
    assert_uniform(&overlay, RED);
}

#[test]
fn test_unavailable_tiles_draw_nothing() {
    let provider = TerrainRgbProvider::new(FailingSource, &TileSourceConfig::default()).unwrap();
    provider.prepare(&viewport(), 12.0);

    let raster = RasterConfig::default();
    let avalanche = AvalancheConfig::default();
    let overlay = RasterGenerator::new(&raster, &avalanche).draw(&[rule(0.0, 9000.0, RED)], &viewport(), &provider);
    assert!(overlay.is_none());
}

#[test]
fn test_steepness_considerable() {
    let rules = [steepness_rule("3", None)];

    assert_uniform(&draw(&rules, north_facing(36.0)).unwrap(), RED);
    assert_uniform(&draw(&rules, north_facing(32.0)).unwrap(), ORANGE);
    assert!(draw(&rules, north_facing(20.0)).is_none());
}

#[test]
fn test_steepness_skips_extreme_slopes() {
    assert!(draw(&[steepness_rule("5", None)], north_facing(55.0)).is_none());
    assert_uniform(&draw(&[steepness_rule("5", None)], north_facing(45.0)).unwrap(), RED);
}

#[test]
fn test_steepness_uses_named_levels() {
    assert_uniform(&draw(&[steepness_rule("considerable", None)], north_facing(36.0)).unwrap(), RED);
}

#[test]
fn test_unrated_rule_keeps_base_color_under_steepness() {
    let mut unrated = steepness_rule("3", None);
    unrated.properties.danger_level = None;
    assert_uniform(&draw(&[unrated], north_facing(20.0)).unwrap(), Rgba::opaque(0x12, 0x34, 0x56));
}

#[test]
fn test_off_aspect_downgrades_danger() {
    let north = Some(BTreeSet::from([Aspect::North]));
    let south = Some(BTreeSet::from([Aspect::South]));

    assert_uniform(&draw(&[steepness_rule("3", north)], north_facing(36.0)).unwrap(), RED);
    // Downgraded to 2: 36° is only "considerable".
    assert_uniform(&draw(&[steepness_rule("3", south.clone())], north_facing(36.0)).unwrap(), ORANGE);
    // Downgraded to 2: 32° is below every threshold.
    assert!(draw(&[steepness_rule("3", south.clone())], north_facing(32.0)).is_none());
    // Level 1 off-aspect is hidden outright.
    assert!(draw(&[steepness_rule("1", south)], north_facing(45.0)).is_none());
}

#[test]
fn test_aspect_filter_without_steepness() {
    let mut filtered = rule(0.0, 10_000.0, RED);
    filtered.valid_aspects = Some(BTreeSet::from([Aspect::North]));
    assert_uniform(&draw(&[filtered.clone()], north_facing(25.0)).unwrap(), RED);

    filtered.valid_aspects = Some(BTreeSet::from([Aspect::South, Aspect::SouthWest]));
    assert!(draw(&[filtered.clone()], north_facing(25.0)).is_none());

    // An empty set matches no aspect; unrated terrain off-aspect is hidden.
    filtered.valid_aspects = Some(BTreeSet::new());
    assert!(draw(&[filtered], north_facing(25.0)).is_none());
}

#[test]
fn test_empty_aspect_set_downgrades_everywhere() {
    // Level 3 everywhere off-aspect becomes 2: 36° is only "considerable".
    let rule = steepness_rule("3", Some(BTreeSet::new()));
    assert_uniform(&draw(&[rule], north_facing(36.0)).unwrap(), ORANGE);
}

#[test]
fn test_slope_floor() {
    let mut floored = rule(0.0, 10_000.0, RED);
    floored.min_slope = Some(30.0);

    assert!(draw(&[floored.clone()], north_facing(28.0)).is_none());
    assert_uniform(&draw(&[floored], north_facing(31.0)).unwrap(), RED);
}

#[test]
fn test_cancelled_pass_returns_none() {
    let raster = RasterConfig::default();
    let avalanche = AvalancheConfig::default();
    let cancel = CancelToken::new();
    cancel.cancel();

    let flat = |_: GeoPoint| Some(1000.0);
    let overlay = RasterGenerator::new(&raster, &avalanche).draw_cancellable(
        &[rule(500.0, 2000.0, RED)],
        &viewport(),
        &flat,
        &cancel,
    );
    assert!(overlay.is_none());
}

#[test]
fn test_capped_viewport_corners() {
    let raster = RasterConfig::default();
    let avalanche = AvalancheConfig::default();
    let camera_view = Bounds::new(5.0, 30.0, 40.0, 55.0);
    let center = GeoPoint::new(11.0, 47.0);

    let render_bounds = cap_render_bounds(&camera_view, center, 60.0, &raster);
    assert_eq!(render_bounds, Bounds::new(9.0, 13.0, 45.0, 49.0));

    let mut everywhere = rule(0.0, 9000.0, RED);
    everywhere.bounds = camera_view;
    let flat = |_: GeoPoint| Some(1000.0);
    let overlay = RasterGenerator::new(&raster, &avalanche)
        .draw(&[everywhere], &render_bounds, &flat)
        .unwrap();

    let corners = overlay.corners();
    assert_eq!(corners[0], GeoPoint::new(9.0, 49.0));
    assert_eq!(corners[1], GeoPoint::new(13.0, 49.0));
    assert_eq!(corners[2], GeoPoint::new(13.0, 45.0));
    assert_eq!(corners[3], GeoPoint::new(9.0, 45.0));
}

#[test]
fn test_point_info_on_flat_tiles() {
    let provider = TerrainRgbProvider::new(ConstSource::new(1850.0), &TileSourceConfig::default()).unwrap();
    let info = point_info(&provider, GeoPoint::new(11.3, 47.1), 14.0).unwrap();

    assert_relative_eq!(info.elevation, 1850.0);
    assert_relative_eq!(info.slope_deg, 0.0);
    assert!(!provider.cached_tiles().is_empty());
}

#[test]
fn test_point_info_without_tiles() {
    let provider = TerrainRgbProvider::new(FailingSource, &TileSourceConfig::default()).unwrap();
    assert!(point_info(&provider, GeoPoint::new(11.3, 47.1), 14.0).is_none());
}

#[test]
fn test_session_returns_newest_generation() {
    let source = ConstSource {
        elevation: 1000.0,
        delay: Duration::from_millis(20),
    };
    let provider = Arc::new(TerrainRgbProvider::new(source, &TileSourceConfig::default()).unwrap());
    let mut session = RenderSession::new(provider, RasterConfig::default(), AvalancheConfig::default());
    let rules: Arc<[GenerationRule]> = vec![rule(500.0, 2000.0, RED)].into();

    let first = session.request(Bounds::new(10.0, 10.01, 47.2, 47.21), 12.0, Arc::clone(&rules)).unwrap();
    let second = session.request(viewport(), 12.0, Arc::clone(&rules)).unwrap();
    assert_eq!((first, second), (1, 2));
    assert_eq!(session.generation(), 2);

    let outcome = session.wait_latest(Duration::from_secs(30)).unwrap();
    assert_eq!(outcome.generation, 2);
    assert_eq!(outcome.viewport, viewport());
    assert_uniform(&outcome.overlay.unwrap(), RED);

    // Whatever generation 1 produced is stale by now.
    std::thread::sleep(Duration::from_millis(100));
    assert!(session.latest().is_none());

    session.shutdown();
}

#[test]
fn test_session_empty_rules() {
    let provider = Arc::new(TerrainRgbProvider::new(ConstSource::new(1000.0), &TileSourceConfig::default()).unwrap());
    let mut session = RenderSession::new(Arc::clone(&provider), RasterConfig::default(), AvalancheConfig::default());

    session.request(viewport(), 12.0, Vec::<GenerationRule>::new().into()).unwrap();
    let outcome = session.wait_latest(Duration::from_secs(30)).unwrap();

    assert!(outcome.overlay.is_none());
    assert_eq!(outcome.prepare.requested, 0);
    assert!(provider.cached_tiles().is_empty());
    session.shutdown();
}
