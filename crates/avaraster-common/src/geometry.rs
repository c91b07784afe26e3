//! Region geometry: Polygon / MultiPolygon containment and bounds.
//!
//! Coordinates use the plain nested-array representation found in region
//! feeds: a position is `[lng, lat, ...]`, a ring is a list of positions, a
//! polygon is a list of rings (outer ring first, then holes).
//!
//! Containment uses the even-odd rule over *all* rings of a polygon, so holes
//! are handled without distinguishing outer rings from inner ones.
//!
//! Any other geometry type, or a polygon with malformed coordinates,
//! deserializes as [`Geometry::Unsupported`], which contains no point.

use crate::{Bounds, GeoPoint};
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};

/// A single `[lng, lat, ...]` coordinate.
pub type Position = Vec<f64>;

/// A closed (or implicitly closed) ring of positions.
pub type Ring = Vec<Position>;

/// Region shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum Geometry {
    /// Single polygon: list of rings.
    Polygon(Vec<Ring>),
    /// List of polygons.
    MultiPolygon(Vec<Vec<Ring>>),
    /// Anything that is not an areal shape (points, lines, collections).
    Unsupported,
}

#[derive(Deserialize)]
#[serde(tag = "type", content = "coordinates")]
enum ArealGeometry {
    Polygon(Vec<Ring>),
    MultiPolygon(Vec<Vec<Ring>>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawGeometry {
    Areal(ArealGeometry),
    Other(IgnoredAny),
}

impl<'de> Deserialize<'de> for Geometry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match RawGeometry::deserialize(deserializer)? {
            RawGeometry::Areal(ArealGeometry::Polygon(rings)) => Geometry::Polygon(rings),
            RawGeometry::Areal(ArealGeometry::MultiPolygon(polygons)) => Geometry::MultiPolygon(polygons),
            RawGeometry::Other(IgnoredAny) => Geometry::Unsupported,
        })
    }
}

impl Geometry {
    /// Iterate over the polygons of this geometry as ring slices.
    pub fn polygons(&self) -> impl Iterator<Item = &[Ring]> + '_ {
        let polygons: Box<dyn Iterator<Item = &[Ring]> + '_> = match self {
            Geometry::Polygon(rings) => Box::new(std::iter::once(rings.as_slice())),
            Geometry::MultiPolygon(polygons) => Box::new(polygons.iter().map(Vec::as_slice)),
            Geometry::Unsupported => Box::new(std::iter::empty()),
        };
        polygons
    }

    /// Check if a point lies inside any polygon of this geometry.
    pub fn contains(&self, point: GeoPoint) -> bool {
        self.polygons().any(|rings| point_in_rings(point, rings))
    }

    /// Bounding box over every coordinate of every ring.
    ///
    /// Positions with fewer than two values are ignored. A geometry without
    /// coordinates yields [`Bounds::empty`].
    pub fn bounds(&self) -> Bounds {
        let mut bounds = Bounds::empty();
        for rings in self.polygons() {
            for position in rings.iter().flatten() {
                if let Some(point) = to_point(position) {
                    bounds.include(point);
                }
            }
        }
        bounds
    }
}

/// Even-odd ray casting over all rings of one polygon.
///
/// Each edge crossed by a ray cast toward +x toggles the inside state, so a
/// point inside a hole ring ends up outside.
pub fn point_in_rings(point: GeoPoint, rings: &[Ring]) -> bool {
    let (x, y) = (point.lng, point.lat);
    let mut inside = false;

    for ring in rings {
        let Some(mut prev) = ring.iter().rev().find_map(|p| to_point(p)) else {
            continue;
        };
        for position in ring {
            let Some(curr) = to_point(position) else {
                continue;
            };
            let (xi, yi) = (curr.lng, curr.lat);
            let (xj, yj) = (prev.lng, prev.lat);

            if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
                inside = !inside;
            }
            prev = curr;
        }
    }

    inside
}

fn to_point(position: &[f64]) -> Option<GeoPoint> {
    match position {
        [lng, lat, ..] => Some(GeoPoint::new(*lng, *lat)),
        _ => None,
    }
}
