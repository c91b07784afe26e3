//! Metrics infrastructure for the avaraster pipeline.
//!
//! This crate describes every metric emitted while fetching elevation tiles,
//! compiling rules and rasterizing overlays. It re-exports the `metrics` crate
//! and declares each metric as a structured [`Metric`] constant so call sites
//! never spell a metric name by hand.
//!
//! # Example
//!
//! ```rust,ignore
//! use avaraster_metrics::{describe_metrics, metric_defs};
//!
//! // Initialize metrics descriptions at startup
//! describe_metrics();
//!
//! metrics::counter!(metric_defs::DEM_TILES_FETCHED.name).increment(1);
//! ```

pub use metrics;

use metrics::{describe_counter, describe_histogram, Unit};

/// Whether a metric counts events or records a distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    /// A monotonically increasing counter.
    Counter,
    /// A histogram for recording distributions.
    Histogram,
}

impl MetricKind {
    /// Returns the kind as a lowercase string.
    pub const fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Counter => "counter",
            MetricKind::Histogram => "histogram",
        }
    }
}

impl std::fmt::Display for MetricKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A metric declaration with its metadata.
///
/// ```rust
/// use avaraster_metrics::{Metric, MetricKind};
/// use metrics::Unit;
///
/// const TILES: Metric = Metric::counter("avaraster.dem.tiles")
///     .with_description("Tiles touched")
///     .with_unit(Unit::Count);
///
/// assert_eq!(TILES.name, "avaraster.dem.tiles");
/// assert_eq!(TILES.kind, MetricKind::Counter);
/// ```
#[derive(Debug, Clone)]
pub struct Metric {
    /// The metric name (e.g., "avaraster.render.passes").
    pub name: &'static str,
    /// The kind of metric (counter or histogram).
    pub kind: MetricKind,
    /// Human-readable description of the metric.
    pub description: &'static str,
    /// The unit of measurement (optional).
    pub unit: Option<Unit>,
    /// Expected label keys for this metric.
    pub labels: &'static [&'static str],
}

impl Metric {
    const fn with_kind(name: &'static str, kind: MetricKind) -> Self {
        Self {
            name,
            kind,
            description: "",
            unit: None,
            labels: &[],
        }
    }

    /// Creates a new counter metric with the given name.
    pub const fn counter(name: &'static str) -> Self {
        Self::with_kind(name, MetricKind::Counter)
    }

    /// Creates a new histogram metric with the given name.
    pub const fn histogram(name: &'static str) -> Self {
        Self::with_kind(name, MetricKind::Histogram)
    }

    /// Sets the description for the metric.
    pub const fn with_description(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    /// Sets the unit for the metric.
    pub const fn with_unit(mut self, unit: Unit) -> Self {
        self.unit = Some(unit);
        self
    }

    /// Sets the expected label keys for the metric.
    pub const fn with_labels(mut self, labels: &'static [&'static str]) -> Self {
        self.labels = labels;
        self
    }

    /// Registers this metric's description with the metrics recorder.
    ///
    /// This should be called once at startup for each metric.
    pub fn describe(&self) {
        match (self.kind, self.unit) {
            (MetricKind::Counter, Some(unit)) => {
                describe_counter!(self.name, unit, self.description);
            }
            (MetricKind::Counter, None) => {
                describe_counter!(self.name, self.description);
            }
            (MetricKind::Histogram, Some(unit)) => {
                describe_histogram!(self.name, unit, self.description);
            }
            (MetricKind::Histogram, None) => {
                describe_histogram!(self.name, self.description);
            }
        }
    }
}

/// All metric definitions for the pipeline.
pub mod metric_defs {
    use super::{Metric, Unit};

    // ========================================================================
    // Elevation tiles
    // ========================================================================

    /// Tiles fetched and decoded successfully.
    pub const DEM_TILES_FETCHED: Metric = Metric::counter("avaraster.dem.tiles_fetched")
        .with_description("Elevation tiles fetched and decoded")
        .with_unit(Unit::Count);

    /// Tiles whose fetch or decode failed and were marked unavailable.
    pub const DEM_TILES_FAILED: Metric = Metric::counter("avaraster.dem.tiles_failed")
        .with_description("Elevation tiles marked permanently unavailable")
        .with_unit(Unit::Count);

    /// Wall-clock time of one `prepare()` call.
    pub const DEM_PREPARE_TIME: Metric = Metric::histogram("avaraster.dem.prepare_time_ms")
        .with_description("Time spent preparing elevation tiles for a viewport")
        .with_unit(Unit::Milliseconds);

    // ========================================================================
    // Rule compilation
    // ========================================================================

    /// Rules produced per compilation.
    ///
    /// Labels: mode
    pub const RULES_COMPILED: Metric = Metric::histogram("avaraster.rules.compiled")
        .with_description("Generation rules produced by one compilation")
        .with_unit(Unit::Count)
        .with_labels(&["mode"]);

    // ========================================================================
    // Rasterization
    // ========================================================================

    /// Completed rasterization passes.
    pub const RENDER_PASSES: Metric = Metric::counter("avaraster.render.passes")
        .with_description("Rasterization passes run to completion")
        .with_unit(Unit::Count);

    /// Passes abandoned because a newer viewport superseded them.
    pub const RENDER_CANCELLED: Metric = Metric::counter("avaraster.render.cancelled")
        .with_description("Rasterization passes cancelled before completion")
        .with_unit(Unit::Count);

    /// Pixels written per pass.
    pub const RENDER_PIXELS_PAINTED: Metric = Metric::histogram("avaraster.render.pixels_painted")
        .with_description("Pixels painted by one rasterization pass")
        .with_unit(Unit::Count);

    /// Wall-clock time of one rasterization pass.
    pub const RENDER_PASS_TIME: Metric = Metric::histogram("avaraster.render.pass_time_ms")
        .with_description("Time spent rasterizing one viewport")
        .with_unit(Unit::Milliseconds);

    /// Returns a slice of all defined metrics.
    pub const ALL: &[&Metric] = &[
        &DEM_TILES_FETCHED,
        &DEM_TILES_FAILED,
        &DEM_PREPARE_TIME,
        &RULES_COMPILED,
        &RENDER_PASSES,
        &RENDER_CANCELLED,
        &RENDER_PIXELS_PAINTED,
        &RENDER_PASS_TIME,
    ];
}

/// Describes all metrics used by the pipeline.
///
/// Call once at startup, after installing a recorder.
pub fn describe_metrics() {
    for metric in metric_defs::ALL {
        metric.describe();
    }
}
