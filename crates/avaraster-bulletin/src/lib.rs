//! # avaraster-bulletin
//!
//! Avalanche bulletin and region models, and the compiler that turns them
//! into [`GenerationRule`]s for the rasterizer.
//!
//! Compilation runs in two steps:
//! 1. [`process_region_elevations`] folds each bulletin's danger ratings and
//!    avalanche problems into [`ElevationBand`]s: one per (region, rating),
//!    spanning the union of the overlapping problems' elevation ranges.
//! 2. [`generate_rules`] joins the bands with region geometry, applies
//!    treeline adjustment and attaches colors and mode-specific filters.
//!
//! [`RuleCompiler`] wraps both and also builds the bulletin-independent
//! custom-mode rules.
//!
//! ## Example
//!
//! ```
//! use avaraster_bulletin::{AvalancheConfig, CustomModeParams, RegionCollection, RuleCompiler, VisualizationMode};
//!
//! let config = AvalancheConfig::default();
//! let rules = RuleCompiler::new(&config).compile(
//!     VisualizationMode::Custom,
//!     &[],
//!     &RegionCollection::default(),
//!     &CustomModeParams::default(),
//! );
//! assert_eq!(rules.len(), config.steepness_thresholds.len());
//! ```

mod bands;
mod config;
mod error;
mod model;
mod region;
mod rules;

pub use bands::{
    adjust_elevation_for_treeline, parse_elevation, process_region_elevations, ranges_overlap, BoundKind,
    ElevationBand,
};
pub use config::{parse_color, AvalancheConfig, SteepnessThreshold, DEFAULT_COLOR_KEY};
pub use error::BulletinError;
pub use model::{
    AvalancheActivity, AvalancheProblem, Bulletin, BulletinCollection, DangerRating, ElevationBounds, RegionRef,
    ValidTime,
};
pub use region::{RegionCollection, RegionFeature, RegionProperties};
pub use rules::{
    custom_rules, generate_rules, CustomModeParams, GenerationRule, RuleCompiler, RuleProperties, VisualizationMode,
};

/// Result type for bulletin operations.
pub type Result<T> = std::result::Result<T, BulletinError>;
