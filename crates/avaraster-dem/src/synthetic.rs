//! Offline elevation field.

use crate::ElevationQuery;
use avaraster_common::GeoPoint;

/// Deterministic rolling terrain built from a few sine/cosine waves.
///
/// Heights vary on the scale of a few hundred meters horizontally, which is
/// enough to exercise every slope and aspect branch without tiles or a
/// network connection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyntheticTerrain {
    /// Mean elevation in meters.
    pub base: f64,
    /// Amplitude of the primary wave in meters.
    pub relief: f64,
}

impl Default for SyntheticTerrain {
    fn default() -> Self {
        Self {
            base: 1500.0,
            relief: 1000.0,
        }
    }
}

impl SyntheticTerrain {
    /// Elevation at a point, never below sea level.
    pub fn elevation(&self, point: GeoPoint) -> f64 {
        let lat = point.lat * 100.0;
        let lng = point.lng * 100.0;

        let primary = lat.sin() * lng.cos() * self.relief;
        let ridges = (lat * 2.5 + 1.0).sin() * (lng * 2.5 + 2.0).sin() * self.relief * 0.5;
        let ripples = (lat * 5.0).cos() * self.relief * 0.2;

        (self.base + primary + ridges + ripples).max(0.0)
    }
}

impl ElevationQuery for SyntheticTerrain {
    fn elevation_at(&self, point: GeoPoint) -> Option<f64> {
        Some(self.elevation(point))
    }
}
