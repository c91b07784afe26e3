//! Slippy Map tile addressing.
//!
//! Uses the OpenStreetMap Slippy Map tile naming convention:
//! - `z` is the zoom level
//! - `x` is the column (0 to 2^z - 1, from west to east)
//! - `y` is the row (0 to 2^z - 1, from north to south)
//!
//! Tile indices are signed so that neighbor arithmetic at the edge of the
//! world stays well defined; keys outside `0..2^z` simply never resolve to a
//! cached tile.

use avaraster_common::{Bounds, GeoPoint};
use std::f64::consts::PI;

/// Maximum zoom level accepted for tile addressing.
pub const MAX_ZOOM: u8 = 22;

/// Web Mercator latitude limit (arctan(sinh(π)), rounded down).
pub const MAX_LATITUDE: f64 = 85.0511;

/// Slippy Map tile coordinates (z, x, y).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileKey {
    /// Zoom level.
    pub z: u8,
    /// X coordinate (column, 0 at 180°W, increases eastward).
    pub x: i32,
    /// Y coordinate (row, 0 at ~85.05°N, increases southward).
    pub y: i32,
}

impl TileKey {
    /// Create a new tile key.
    pub const fn new(z: u8, x: i32, y: i32) -> Self {
        Self { z, x, y }
    }

    /// The tile containing a point at the given zoom level.
    ///
    /// No clamping is applied, so a longitude of exactly 180° lands one
    /// column past the last tile.
    pub fn containing(point: GeoPoint, z: u8) -> Self {
        let (fx, fy) = tile_position(point, z);
        Self::new(z, fx.floor() as i32, fy.floor() as i32)
    }

    /// Number of tiles along one axis at this zoom level.
    pub fn tiles_per_axis(&self) -> i64 {
        1i64 << self.z
    }

    /// Clamp the indices into the valid range for this zoom level.
    pub fn clamped(&self) -> Self {
        let max = (self.tiles_per_axis() - 1) as i32;
        Self::new(self.z, self.x.clamp(0, max), self.y.clamp(0, max))
    }

    /// The key shifted by whole tiles.
    pub fn offset(&self, dx: i32, dy: i32) -> Self {
        Self::new(self.z, self.x.saturating_add(dx), self.y.saturating_add(dy))
    }

    /// True when the indices address a real tile at this zoom level.
    pub fn is_valid(&self) -> bool {
        let n = self.tiles_per_axis();
        (0..n).contains(&i64::from(self.x)) && (0..n).contains(&i64::from(self.y))
    }

    /// Geographic point at a fractional pixel position inside this tile.
    ///
    /// This is the inverse of the sub-pixel computation used when sampling:
    /// `(0, 0)` is the north-west corner and `(tile_size, tile_size)` the
    /// south-east corner.
    pub fn pixel_point(&self, px: f64, py: f64, tile_size: u32) -> GeoPoint {
        let size = f64::from(tile_size);
        point_at(self.z, f64::from(self.x) + px / size, f64::from(self.y) + py / size)
    }

    /// Get the bounding box for this tile.
    pub fn bounds(&self) -> Bounds {
        let nw = point_at(self.z, f64::from(self.x), f64::from(self.y));
        let se = point_at(self.z, f64::from(self.x) + 1.0, f64::from(self.y) + 1.0);
        Bounds::new(nw.lng, se.lng, se.lat, nw.lat)
    }
}

impl std::fmt::Display for TileKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.z, self.x, self.y)
    }
}

/// Fractional tile coordinates of a point.
///
/// Uses the OpenStreetMap Slippy Map tiling formula:
/// - x = (lon + 180) / 360 * 2^z
/// - y = (1 - ln(tan(lat) + sec(lat)) / π) / 2 * 2^z
///
/// Latitude is clamped to ±[`MAX_LATITUDE`] first.
pub fn tile_position(point: GeoPoint, z: u8) -> (f64, f64) {
    let n = 2f64.powi(i32::from(z));
    let lat_rad = point.lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();

    let x = (point.lng + 180.0) / 360.0 * n;
    let y = (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0 * n;
    (x, y)
}

/// Inverse of [`tile_position`].
fn point_at(z: u8, fx: f64, fy: f64) -> GeoPoint {
    let n = 2f64.powi(i32::from(z));
    let lng = fx / n * 360.0 - 180.0;
    let lat = (PI * (1.0 - 2.0 * fy / n)).sinh().atan().to_degrees();
    GeoPoint::new(lng, lat)
}
