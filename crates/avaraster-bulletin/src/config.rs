//! Danger colors, level values and elevation defaults.

use avaraster_common::{Bounds, Rgba};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

/// Key used when a danger level has no color of its own.
pub const DEFAULT_COLOR_KEY: &str = "default";

/// A slope-angle band used by custom mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SteepnessThreshold {
    /// Minimum slope in degrees.
    pub min_slope: f64,
    /// Color as `#RRGGBB` or `#AARRGGBB`.
    pub color: String,
    /// Human-readable label, e.g. "> 35°".
    pub label: String,
}

impl SteepnessThreshold {
    fn new(min_slope: f64, color: &str, label: &str) -> Self {
        Self {
            min_slope,
            color: color.to_string(),
            label: label.to_string(),
        }
    }
}

/// Immutable avalanche configuration, built once and passed by reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AvalancheConfig {
    /// Upper bound used when an elevation is absent or not numeric.
    pub default_max_elevation: f64,
    /// Elevation substituted for the "treeline" keyword.
    pub treeline_elevation: f64,
    /// Slope floor applied by risk (and custom-fallthrough) rules.
    pub risk_min_slope: f64,
    /// Danger level (numeric or named) to color. `"default"` is the fallback.
    pub danger_colors: BTreeMap<String, String>,
    /// Danger level (numeric or named) to its 1..=5 value.
    pub danger_values: BTreeMap<String, u8>,
    /// Custom-mode slope bands, painted in order.
    pub steepness_thresholds: Vec<SteepnessThreshold>,
    /// Area covered by custom-mode rules.
    pub custom_bounds: Bounds,
}

impl Default for AvalancheConfig {
    fn default() -> Self {
        let levels = [
            ("1", "low", "#CCFF66"),
            ("2", "moderate", "#FFFF00"),
            ("3", "considerable", "#FF9900"),
            ("4", "high", "#FF0000"),
            ("5", "very_high", "#330000"),
        ];

        let mut danger_colors = BTreeMap::new();
        let mut danger_values = BTreeMap::new();
        for (value, (number, name, color)) in (1u8..).zip(levels) {
            danger_colors.insert(number.to_string(), color.to_string());
            danger_colors.insert(name.to_string(), color.to_string());
            danger_values.insert(number.to_string(), value);
            danger_values.insert(name.to_string(), value);
        }
        danger_colors.insert(DEFAULT_COLOR_KEY.to_string(), "#888888".to_string());

        Self {
            default_max_elevation: 4000.0,
            treeline_elevation: 2000.0,
            risk_min_slope: 30.0,
            danger_colors,
            danger_values,
            steepness_thresholds: vec![
                SteepnessThreshold::new(30.0, "#FFFF33", "> 30°"),
                SteepnessThreshold::new(35.0, "#FF9900", "> 35°"),
                SteepnessThreshold::new(40.0, "#FF0000", "> 40°"),
            ],
            custom_bounds: Bounds::new(-10.0, 20.0, 35.0, 60.0),
        }
    }
}

impl AvalancheConfig {
    /// Numeric danger value of a level, 0 when unmapped.
    pub fn danger_value(&self, level: &str) -> u8 {
        self.danger_values.get(level).copied().unwrap_or(0)
    }

    /// Color for a danger level, falling back to the `"default"` entry.
    ///
    /// Missing or unparseable colors resolve to transparent with a warning.
    pub fn color_for_level(&self, level: &str) -> Rgba {
        match self
            .danger_colors
            .get(level)
            .or_else(|| self.danger_colors.get(DEFAULT_COLOR_KEY))
        {
            Some(hex) => parse_color(hex),
            None => {
                warn!(level, "No color configured for danger level");
                Rgba::TRANSPARENT
            }
        }
    }

    /// Color used for the most severe steepness class ("red").
    pub fn high_color(&self) -> Rgba {
        self.color_for_level("4")
    }

    /// Color used for the moderate steepness class ("orange").
    pub fn considerable_color(&self) -> Rgba {
        self.color_for_level("3")
    }
}

/// Parse a hex color, warning and returning transparent on failure.
pub fn parse_color(hex: &str) -> Rgba {
    hex.parse().unwrap_or_else(|e| {
        warn!(color = hex, error = %e, "Unparseable color, using transparent");
        Rgba::TRANSPARENT
    })
}
