//! Slope and aspect from the elevation field.

use avaraster_common::{Aspect, GeoPoint};
use serde::Serialize;

/// Degrees offset used for the finite-difference samples.
const SAMPLE_OFFSET_DEG: f64 = 1e-4;

/// Meters per degree of latitude.
const METERS_PER_DEGREE: f64 = 111_111.0;

/// Slope and aspect at a point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TerrainSample {
    /// Steepest-descent angle in degrees, `>= 0`.
    pub slope_deg: f64,
    /// Downhill compass bearing in degrees, `[0, 360)`.
    pub bearing_deg: f64,
    /// Sector of `bearing_deg`.
    pub aspect: Aspect,
}

/// Slope and aspect from central differences around `point`.
///
/// Elevation is sampled 1e-4° north, east, south and west of the point. If
/// any sample is missing the result is `None`.
pub fn calculate_terrain_metrics(
    point: GeoPoint,
    mut elevation: impl FnMut(GeoPoint) -> Option<f64>,
) -> Option<TerrainSample> {
    let z_n = elevation(point.offset(0.0, SAMPLE_OFFSET_DEG))?;
    let z_e = elevation(point.offset(SAMPLE_OFFSET_DEG, 0.0))?;
    let z_s = elevation(point.offset(0.0, -SAMPLE_OFFSET_DEG))?;
    let z_w = elevation(point.offset(-SAMPLE_OFFSET_DEG, 0.0))?;

    let dist_y = 2.0 * SAMPLE_OFFSET_DEG * METERS_PER_DEGREE;
    let dist_x = dist_y * point.lat.to_radians().cos();

    let dz_dx = (z_e - z_w) / dist_x;
    let dz_dy = (z_n - z_s) / dist_y;

    let slope_deg = dz_dx.hypot(dz_dy).atan().to_degrees();

    // Downhill is the negative gradient; atan2 gives the angle from east
    // counter-clockwise, the bearing is measured from north clockwise.
    let angle_from_east = (-dz_dy).atan2(-dz_dx).to_degrees();
    let bearing_deg = (90.0 - angle_from_east).rem_euclid(360.0);

    Some(TerrainSample {
        slope_deg,
        bearing_deg,
        aspect: Aspect::from_bearing(bearing_deg),
    })
}
