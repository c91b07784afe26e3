//! Single-point terrain queries.

use avaraster_common::{Aspect, Bounds, GeoPoint};
use avaraster_dem::{calculate_terrain_metrics, ElevationQuery, TerrainRgbProvider, TileSource};
use serde::Serialize;

/// Half-size in degrees of the box prepared around a queried point.
pub const POINT_INFO_DELTA: f64 = 0.001;

/// Terrain at a single point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PointInfo {
    /// Queried position.
    pub point: GeoPoint,
    /// Elevation in meters.
    pub elevation: f64,
    /// Slope in degrees.
    pub slope_deg: f64,
    /// Direction the slope faces, degrees clockwise from north.
    pub bearing_deg: f64,
    /// Compass sector of the bearing.
    pub aspect: Aspect,
}

/// Prepare the tiles around `point` and measure it.
///
/// `None` when either the elevation or the terrain metrics are unavailable.
pub fn point_info<S: TileSource>(provider: &TerrainRgbProvider<S>, point: GeoPoint, map_zoom: f64) -> Option<PointInfo> {
    provider.prepare(&Bounds::around(point, POINT_INFO_DELTA), map_zoom);
    measure_point(provider, point)
}

/// Measure a point on an already available elevation field.
pub fn measure_point<E>(elevation: &E, point: GeoPoint) -> Option<PointInfo>
where
    E: ElevationQuery + ?Sized,
{
    let height = elevation.elevation_at(point)?;
    let sample = calculate_terrain_metrics(point, |p| elevation.elevation_at(p))?;
    Some(PointInfo {
        point,
        elevation: height,
        slope_deg: sample.slope_deg,
        bearing_deg: sample.bearing_deg,
        aspect: sample.aspect,
    })
}
