//! Rule rasterization.
//!
//! A pass lays a regular lon/lat grid over the viewport, spacing
//! `max(lng_range, lat_range) / grid_points_density`, and evaluates the rules
//! in order at each pixel center. A later rule overwrites an earlier one at
//! the same pixel; there is no blending.

use crate::{CancelToken, Overlay, RasterConfig};
use avaraster_bulletin::{AvalancheConfig, GenerationRule};
use avaraster_common::{Bounds, GeoPoint, Rgba};
use avaraster_dem::{calculate_terrain_metrics, ElevationQuery};
use avaraster_metrics::metric_defs;
use image::RgbaImage;
use std::collections::HashMap;
use std::ops::Range;
use std::time::Instant;
use tracing::{debug, info};

/// Pixel layout of one pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterGrid {
    /// Raster width in pixels.
    pub width: u32,
    /// Raster height in pixels.
    pub height: u32,
    /// Pixel edge length in degrees.
    pub spacing: f64,
    west: f64,
    north: f64,
}

impl RasterGrid {
    /// Grid for a viewport, or `None` when the viewport has no area.
    ///
    /// Each dimension is capped at `max_raster_dimension`; the cap crops the
    /// raster instead of widening the spacing.
    pub fn for_viewport(viewport: &Bounds, config: &RasterConfig) -> Option<Self> {
        let lng_range = viewport.lng_range();
        let lat_range = viewport.lat_range();
        if !(lng_range > 0.0 && lat_range > 0.0) || config.grid_points_density == 0 {
            return None;
        }

        let spacing = lng_range.max(lat_range) / f64::from(config.grid_points_density);
        let cap = f64::from(config.max_raster_dimension);
        let width = (lng_range / spacing).ceil().min(cap);
        let height = (lat_range / spacing).ceil().min(cap);
        if !(width >= 1.0 && height >= 1.0) {
            return None;
        }

        Some(Self {
            width: width as u32,
            height: height as u32,
            spacing,
            west: viewport.min_lng,
            north: viewport.max_lat,
        })
    }

    /// Geographic center of pixel `(x, y)`.
    pub fn pixel_center(&self, x: u32, y: u32) -> GeoPoint {
        GeoPoint::new(
            self.west + (f64::from(x) + 0.5) * self.spacing,
            self.north - (f64::from(y) + 0.5) * self.spacing,
        )
    }

    /// Column and row ranges covering an already clipped box.
    pub fn pixel_rect(&self, area: &Bounds) -> (Range<u32>, Range<u32>) {
        let clamp = |value: f64, limit: u32| value.clamp(0.0, f64::from(limit)) as u32;

        let start_x = clamp(((area.min_lng - self.west) / self.spacing).floor(), self.width);
        let end_x = clamp(((area.max_lng - self.west) / self.spacing).ceil(), self.width);
        let start_y = clamp(((self.north - area.max_lat) / self.spacing).floor(), self.height);
        let end_y = clamp(((self.north - area.min_lat) / self.spacing).ceil(), self.height);

        (start_x..end_x, start_y..end_y)
    }
}

/// Result of the steepness table for one pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SteepnessClass {
    /// Keep the rule's own color.
    Base,
    /// Paint with the "considerable" (orange) color.
    Considerable,
    /// Paint with the "high" (red) color.
    High,
    /// Leave the pixel untouched.
    Skip,
}

/// Classify a measured slope for an effective danger value.
///
/// Bounds are inclusive. Anything steeper than 50° is skipped regardless of
/// danger.
pub fn classify_steepness(danger: u8, slope_deg: f64) -> SteepnessClass {
    use SteepnessClass::*;

    if slope_deg > 50.0 {
        return Skip;
    }
    match danger {
        0 => Base,
        1 if slope_deg >= 40.0 => Considerable,
        1 => Skip,
        2 if slope_deg >= 40.0 => High,
        2 if slope_deg >= 35.0 => Considerable,
        2 => Skip,
        3 if slope_deg >= 35.0 => High,
        3 if slope_deg >= 30.0 => Considerable,
        3 => Skip,
        _ if slope_deg >= 30.0 => High,
        _ => Considerable,
    }
}

/// Per-pass elevation cache keyed on the exact sample coordinate.
struct ElevationMemo<'e, E: ?Sized> {
    source: &'e E,
    cache: HashMap<(u64, u64), Option<f64>>,
}

impl<'e, E: ElevationQuery + ?Sized> ElevationMemo<'e, E> {
    fn new(source: &'e E) -> Self {
        Self {
            source,
            cache: HashMap::new(),
        }
    }

    fn get(&mut self, point: GeoPoint) -> Option<f64> {
        let source = self.source;
        *self
            .cache
            .entry((point.lng.to_bits(), point.lat.to_bits()))
            .or_insert_with(|| source.elevation_at(point))
    }
}

/// Colors used by the steepness table.
#[derive(Debug, Clone, Copy)]
struct SteepnessColors {
    high: Rgba,
    considerable: Rgba,
}

/// Paints generation rules into an RGBA raster over a viewport.
#[derive(Debug, Clone, Copy)]
pub struct RasterGenerator<'a> {
    raster: &'a RasterConfig,
    avalanche: &'a AvalancheConfig,
}

impl<'a> RasterGenerator<'a> {
    /// Create a generator.
    pub fn new(raster: &'a RasterConfig, avalanche: &'a AvalancheConfig) -> Self {
        Self { raster, avalanche }
    }

    /// Rasterize `rules` over `viewport`.
    ///
    /// Returns `None` for a viewport without area or when no pixel ended up
    /// painted.
    pub fn draw<E>(&self, rules: &[GenerationRule], viewport: &Bounds, elevation: &E) -> Option<Overlay>
    where
        E: ElevationQuery + ?Sized,
    {
        self.draw_cancellable(rules, viewport, elevation, &CancelToken::new())
    }

    /// Like [`draw`](Self::draw), but gives up and returns `None` once
    /// `cancel` is set. The token is checked before each rule and each row.
    pub fn draw_cancellable<E>(
        &self,
        rules: &[GenerationRule],
        viewport: &Bounds,
        elevation: &E,
        cancel: &CancelToken,
    ) -> Option<Overlay>
    where
        E: ElevationQuery + ?Sized,
    {
        let start = Instant::now();
        let Some(grid) = RasterGrid::for_viewport(viewport, self.raster) else {
            debug!(?viewport, "Viewport has no area, nothing to draw");
            return None;
        };

        let colors = SteepnessColors {
            high: self.avalanche.high_color(),
            considerable: self.avalanche.considerable_color(),
        };
        let mut image = RgbaImage::new(grid.width, grid.height);
        let mut memo = ElevationMemo::new(elevation);
        let mut writes = 0usize;

        for rule in rules {
            if cancel.is_cancelled() {
                return cancelled();
            }
            let Some(area) = rule.bounds.intersection(viewport) else {
                continue;
            };
            let (columns, rows) = grid.pixel_rect(&area);
            let danger = rule
                .properties
                .danger_level
                .as_deref()
                .map_or(0, |level| self.avalanche.danger_value(level));

            for y in rows {
                if cancel.is_cancelled() {
                    return cancelled();
                }
                for x in columns.clone() {
                    let point = grid.pixel_center(x, y);
                    if let Some(color) = shade_pixel(rule, danger, point, &mut memo, colors) {
                        image.put_pixel(x, y, image::Rgba(color.to_array()));
                        writes += 1;
                    }
                }
            }
        }

        let overlay = Overlay::new(image, *viewport);
        let painted = overlay.painted_pixels();
        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

        metrics::counter!(metric_defs::RENDER_PASSES.name).increment(1);
        metrics::histogram!(metric_defs::RENDER_PIXELS_PAINTED.name).record(painted as f64);
        metrics::histogram!(metric_defs::RENDER_PASS_TIME.name).record(elapsed_ms);
        debug!(
            width = grid.width,
            height = grid.height,
            rules = rules.len(),
            writes,
            elevation_samples = memo.cache.len(),
            "Rasterization statistics"
        );
        info!(
            painted,
            elapsed_ms = format!("{elapsed_ms:.0}"),
            "Rendered overlay"
        );

        (painted > 0).then_some(overlay)
    }
}

fn cancelled() -> Option<Overlay> {
    metrics::counter!(metric_defs::RENDER_CANCELLED.name).increment(1);
    debug!("Rasterization cancelled");
    None
}

/// Color for one pixel under one rule, or `None` to leave it untouched.
fn shade_pixel<E>(
    rule: &GenerationRule,
    danger: u8,
    point: GeoPoint,
    memo: &mut ElevationMemo<'_, E>,
    colors: SteepnessColors,
) -> Option<Rgba>
where
    E: ElevationQuery + ?Sized,
{
    if let Some(geometry) = &rule.geometry {
        if !geometry.contains(point) {
            return None;
        }
    }

    let elevation = memo.get(point)?;
    if !rule.accepts_elevation(elevation) {
        return None;
    }

    let check_slope = rule.checks_slope();
    let aspects = rule.aspect_filter();
    let mut effective_danger = danger;
    let mut slope = None;

    if check_slope || aspects.is_some() {
        let sample = calculate_terrain_metrics(point, |p| memo.get(p))?;

        if check_slope && rule.min_slope.is_some_and(|min| sample.slope_deg < min) {
            return None;
        }
        if let Some(aspects) = aspects {
            if !aspects.contains(&sample.aspect) {
                // Off-aspect terrain is one level less severe.
                if danger <= 1 {
                    return None;
                }
                effective_danger -= 1;
            }
        }
        slope = Some(sample.slope_deg);
    }

    match slope.filter(|_| rule.apply_steepness_logic) {
        Some(slope) => match classify_steepness(effective_danger, slope) {
            SteepnessClass::Base => Some(rule.color),
            SteepnessClass::Considerable => Some(colors.considerable),
            SteepnessClass::High => Some(colors.high),
            SteepnessClass::Skip => None,
        },
        None => Some(rule.color),
    }
}
