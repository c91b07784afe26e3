//! # avaraster-render
//!
//! Turns compiled [`GenerationRule`](avaraster_bulletin::GenerationRule)s
//! and an elevation field into a colored RGBA overlay.
//!
//! ## Overview
//!
//! - [`RasterGenerator`] runs one rasterization pass over a viewport
//! - [`Overlay`] holds the result plus the corner coordinates needed to
//!   anchor it on a map, and writes it as PNG with a JSON sidecar
//! - [`cap_render_bounds`] limits a camera viewport to a box around its
//!   center before rendering
//! - [`RenderSession`] runs passes on background threads and discards
//!   results of superseded requests
//! - [`point_info`] reports elevation, slope and aspect at a single point
//!
//! ## Example
//!
//! ```
//! use avaraster_bulletin::{AvalancheConfig, GenerationRule, RuleProperties};
//! use avaraster_common::{Bounds, GeoPoint, Rgba};
//! use avaraster_render::{RasterConfig, RasterGenerator};
//!
//! let viewport = Bounds::new(11.0, 11.1, 47.0, 47.1);
//! let rule = GenerationRule {
//!     bounds: viewport,
//!     geometry: None,
//!     min_elev: 500.0,
//!     max_elev: 2000.0,
//!     min_slope: None,
//!     apply_steepness_logic: false,
//!     valid_aspects: None,
//!     color: Rgba::opaque(255, 0, 0),
//!     properties: RuleProperties::default(),
//! };
//!
//! let raster = RasterConfig::default();
//! let avalanche = AvalancheConfig::default();
//! let flat = |_: GeoPoint| Some(1000.0);
//!
//! let overlay = RasterGenerator::new(&raster, &avalanche)
//!     .draw(&[rule], &viewport, &flat)
//!     .expect("every pixel is in range");
//! assert_eq!(overlay.painted_pixels(), (overlay.width() * overlay.height()) as usize);
//! ```

mod bounds;
mod cancel;
mod config;
mod error;
mod overlay;
mod point;
mod raster;
mod session;

pub use bounds::cap_render_bounds;
pub use cancel::CancelToken;
pub use config::{AppConfig, RasterConfig, ACCESS_TOKEN_ENV};
pub use error::RenderError;
pub use overlay::{Overlay, OverlaySidecar};
pub use point::{measure_point, point_info, PointInfo, POINT_INFO_DELTA};
pub use raster::{classify_steepness, RasterGenerator, RasterGrid, SteepnessClass};
pub use session::{RenderOutcome, RenderSession};

/// Result type for rendering operations.
pub type Result<T> = std::result::Result<T, RenderError>;
