//! Viewport capping ahead of rendering.

use crate::RasterConfig;
use avaraster_common::{Bounds, GeoPoint};

/// Clip a camera viewport to a box around its center.
///
/// A pitched camera sees far past the horizon, so the half-size is
/// `max_distance_pitched` when `pitch` exceeds the configured threshold and
/// `max_distance` otherwise.
pub fn cap_render_bounds(viewport: &Bounds, center: GeoPoint, pitch: f64, config: &RasterConfig) -> Bounds {
    let max_delta = if pitch > config.pitch_threshold {
        config.max_distance_pitched
    } else {
        config.max_distance
    };

    Bounds::new(
        viewport.min_lng.max(center.lng - max_delta),
        viewport.max_lng.min(center.lng + max_delta),
        viewport.min_lat.max(center.lat - max_delta),
        viewport.max_lat.min(center.lat + max_delta),
    )
}
