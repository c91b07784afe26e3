//! # avaraster-common
//!
//! Shared types for the avaraster workspace:
//! - [`GeoPoint`] and [`Bounds`] for plain lon/lat positions and boxes
//! - [`Geometry`] for region shapes (Polygon / MultiPolygon) with even-odd
//!   containment and bounding-box computation
//! - [`Rgba`] colors parsed from `#RRGGBB` / `#AARRGGBB` strings
//! - [`Aspect`], the eight compass sectors a slope can face
//!
//! ## Example
//!
//! ```
//! use avaraster_common::{GeoPoint, Geometry};
//!
//! let square = Geometry::Polygon(vec![vec![
//!     vec![0.0, 0.0],
//!     vec![1.0, 0.0],
//!     vec![1.0, 1.0],
//!     vec![0.0, 1.0],
//! ]]);
//!
//! assert!(square.contains(GeoPoint::new(0.5, 0.5)));
//! assert!(!square.contains(GeoPoint::new(1.5, 0.5)));
//! assert_eq!(square.bounds().max_lng, 1.0);
//! ```

mod aspect;
mod color;
mod error;
mod geo;
mod geometry;

pub use aspect::Aspect;
pub use color::Rgba;
pub use error::GeoError;
pub use geo::{Bounds, GeoPoint};
pub use geometry::{point_in_rings, Geometry, Position, Ring};

/// Result type for common operations.
pub type Result<T> = std::result::Result<T, GeoError>;
