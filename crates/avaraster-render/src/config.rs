//! Rendering and application configuration.

use crate::{RenderError, Result};
use avaraster_bulletin::{AvalancheConfig, CustomModeParams};
use avaraster_dem::TileSourceConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Environment variable consulted for the tile access token.
pub const ACCESS_TOKEN_ENV: &str = "MAPBOX_ACCESS_TOKEN";

/// Raster sizing and viewport limits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RasterConfig {
    /// Pixels along the longer side of the viewport.
    pub grid_points_density: u32,
    /// Upper limit for either raster dimension.
    pub max_raster_dimension: u32,
    /// Half-size in degrees of the render area around the center.
    pub max_distance: f64,
    /// Half-size used instead when the camera pitch exceeds `pitch_threshold`.
    pub max_distance_pitched: f64,
    /// Camera pitch in degrees above which `max_distance_pitched` applies.
    pub pitch_threshold: f64,
    /// Opacity suggested to consumers of the overlay.
    pub overlay_opacity: f64,
}

impl Default for RasterConfig {
    fn default() -> Self {
        Self {
            grid_points_density: 100,
            max_raster_dimension: 2000,
            max_distance: 10.0,
            max_distance_pitched: 2.0,
            pitch_threshold: 30.0,
            overlay_opacity: 0.7,
        }
    }
}

/// Everything the CLI reads from its YAML configuration file.
///
/// Every section is optional; missing keys keep their defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Danger colors, values, elevations and steepness thresholds.
    pub avalanche: AvalancheConfig,
    /// Elevation tile source.
    pub tiles: TileSourceConfig,
    /// Raster sizing.
    pub raster: RasterConfig,
    /// Default custom-mode parameters.
    pub custom: CustomModeParams,
}

impl AppConfig {
    /// Parse a YAML configuration.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(RenderError::from)
    }

    /// Read a YAML configuration file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Loading configuration");
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&yaml)
    }

    /// Fill in the tile access token from the environment when the file
    /// does not set one.
    pub fn with_env_token(mut self) -> Self {
        if self.tiles.access_token.is_none() {
            self.tiles.access_token = std::env::var(ACCESS_TOKEN_ENV).ok().filter(|t| !t.is_empty());
        }
        self
    }
}
