//! Plain longitude/latitude points and axis-aligned boxes.

use serde::{Deserialize, Serialize};

/// A geographic position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Longitude (x), positive east.
    pub lng: f64,
    /// Latitude (y), positive north.
    pub lat: f64,
}

impl GeoPoint {
    /// Create a new point from longitude and latitude.
    pub const fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }

    /// Return this point shifted by the given deltas in degrees.
    pub fn offset(&self, d_lng: f64, d_lat: f64) -> Self {
        Self::new(self.lng + d_lng, self.lat + d_lat)
    }
}

/// Axis-aligned lon/lat bounding box.
///
/// A box is only usable for rasterization when both ranges are strictly
/// positive (see [`Bounds::is_valid`]). [`Bounds::empty`] returns the inverted
/// box used as the starting point of a running min/max, and is what an empty
/// geometry reports.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bounds {
    /// West edge.
    pub min_lng: f64,
    /// East edge.
    pub max_lng: f64,
    /// South edge.
    pub min_lat: f64,
    /// North edge.
    pub max_lat: f64,
}

impl Bounds {
    /// Create a box. Argument order follows the field order.
    pub const fn new(min_lng: f64, max_lng: f64, min_lat: f64, max_lat: f64) -> Self {
        Self {
            min_lng,
            max_lng,
            min_lat,
            max_lat,
        }
    }

    /// The inverted box (`min = +inf`, `max = -inf`) signalling "no geometry".
    pub const fn empty() -> Self {
        Self::new(
            f64::INFINITY,
            f64::NEG_INFINITY,
            f64::INFINITY,
            f64::NEG_INFINITY,
        )
    }

    /// Square box of half-size `delta` degrees around a point.
    pub fn around(center: GeoPoint, delta: f64) -> Self {
        Self::new(
            center.lng - delta,
            center.lng + delta,
            center.lat - delta,
            center.lat + delta,
        )
    }

    /// Grow the box to include a point.
    pub fn include(&mut self, point: GeoPoint) {
        self.min_lng = self.min_lng.min(point.lng);
        self.max_lng = self.max_lng.max(point.lng);
        self.min_lat = self.min_lat.min(point.lat);
        self.max_lat = self.max_lat.max(point.lat);
    }

    /// East-west extent in degrees (negative for an inverted box).
    pub fn lng_range(&self) -> f64 {
        self.max_lng - self.min_lng
    }

    /// North-south extent in degrees (negative for an inverted box).
    pub fn lat_range(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    /// True when both ranges are strictly positive.
    pub fn is_valid(&self) -> bool {
        self.lng_range() > 0.0 && self.lat_range() > 0.0
    }

    /// Check if a point lies inside the box (edges inclusive).
    pub fn contains(&self, point: GeoPoint) -> bool {
        point.lng >= self.min_lng
            && point.lng <= self.max_lng
            && point.lat >= self.min_lat
            && point.lat <= self.max_lat
    }

    /// Center of the box.
    pub fn center(&self) -> GeoPoint {
        GeoPoint::new(
            (self.min_lng + self.max_lng) / 2.0,
            (self.min_lat + self.max_lat) / 2.0,
        )
    }

    /// Overlap of two boxes, or `None` when the overlap has no area.
    pub fn intersection(&self, other: &Bounds) -> Option<Bounds> {
        let clipped = Bounds::new(
            self.min_lng.max(other.min_lng),
            self.max_lng.min(other.max_lng),
            self.min_lat.max(other.min_lat),
            self.max_lat.min(other.max_lat),
        );
        clipped.is_valid().then_some(clipped)
    }

    /// Corner coordinates for anchoring an image overlay:
    /// top-left, top-right, bottom-right, bottom-left.
    pub fn corners(&self) -> [GeoPoint; 4] {
        [
            GeoPoint::new(self.min_lng, self.max_lat),
            GeoPoint::new(self.max_lng, self.max_lat),
            GeoPoint::new(self.max_lng, self.min_lat),
            GeoPoint::new(self.min_lng, self.min_lat),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_bounds_is_inverted() {
        let empty = Bounds::empty();
        assert!(!empty.is_valid());
        assert!(empty.min_lng > empty.max_lng);
        assert!(empty.min_lat > empty.max_lat);
    }

    #[test]
    fn test_include_grows_box() {
        let mut bounds = Bounds::empty();
        bounds.include(GeoPoint::new(11.0, 47.0));
        bounds.include(GeoPoint::new(12.5, 46.5));

        assert_eq!(bounds, Bounds::new(11.0, 12.5, 46.5, 47.0));
    }

    #[test]
    fn test_degenerate_bounds_invalid() {
        assert!(!Bounds::new(10.0, 10.0, 45.0, 46.0).is_valid());
        assert!(!Bounds::new(10.0, 11.0, 45.0, 45.0).is_valid());
        assert!(Bounds::new(10.0, 11.0, 45.0, 46.0).is_valid());
    }

    #[test]
    fn test_intersection() {
        let a = Bounds::new(10.0, 12.0, 45.0, 47.0);
        let b = Bounds::new(11.0, 13.0, 46.0, 48.0);
        assert_eq!(a.intersection(&b), Some(Bounds::new(11.0, 12.0, 46.0, 47.0)));

        // Touching edges have no area
        let c = Bounds::new(12.0, 13.0, 45.0, 47.0);
        assert_eq!(a.intersection(&c), None);
    }

    #[test]
    fn test_corners_order() {
        let bounds = Bounds::new(10.0, 11.0, 45.0, 46.0);
        let [tl, tr, br, bl] = bounds.corners();
        assert_eq!(tl, GeoPoint::new(10.0, 46.0));
        assert_eq!(tr, GeoPoint::new(11.0, 46.0));
        assert_eq!(br, GeoPoint::new(11.0, 45.0));
        assert_eq!(bl, GeoPoint::new(10.0, 45.0));
    }

    #[test]
    fn test_around() {
        let bounds = Bounds::around(GeoPoint::new(11.0, 47.0), 0.5);
        assert_eq!(bounds, Bounds::new(10.5, 11.5, 46.5, 47.5));
        assert_eq!(bounds.center(), GeoPoint::new(11.0, 47.0));
    }
}
