//! Region feature collections.

use crate::{BulletinError, Result};
use avaraster_common::{Bounds, Geometry};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::warn;

/// GeoJSON-like `FeatureCollection` of warning regions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegionCollection {
    /// Region features.
    pub features: Vec<RegionFeature>,
}

/// One warning region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionFeature {
    /// Identifying properties.
    pub properties: RegionProperties,
    /// Region outline.
    pub geometry: Geometry,
}

/// Properties of a region feature.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegionProperties {
    /// Region identifier referenced by bulletins.
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
}

impl RegionFeature {
    /// Bounding box of the feature's geometry.
    pub fn bounds(&self) -> Bounds {
        self.geometry.bounds()
    }
}

impl RegionCollection {
    /// Parse a region document.
    ///
    /// Features whose geometry is not a Polygon or MultiPolygon are kept as
    /// [`Geometry::Unsupported`] and never match a point.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let regions: Self = serde_json::from_str(json).map_err(BulletinError::from)?;
        for feature in &regions.features {
            if feature.geometry == Geometry::Unsupported {
                warn!(region = %feature.properties.id, "Region has no polygon geometry, it will not be drawn");
            }
        }
        Ok(regions)
    }

    /// Read and parse a region document from disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Index features by id. A later duplicate id wins.
    pub fn by_id(&self) -> HashMap<&str, &RegionFeature> {
        self.features
            .iter()
            .map(|feature| (feature.properties.id.as_str(), feature))
            .collect()
    }
}
