//! Generation rules: the renderable output of rule compilation.

use crate::bands::{adjust_elevation_for_treeline, process_region_elevations, ElevationBand};
use crate::config::parse_color;
use crate::{AvalancheConfig, AvalancheProblem, Bulletin, RegionCollection};
use avaraster_common::{Aspect, Bounds, Geometry, Rgba};
use avaraster_metrics::metric_defs;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info};

/// How bulletin data is turned into rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisualizationMode {
    /// Danger color over each band, no slope or aspect filtering.
    #[default]
    Bulletin,
    /// Slope floor, aspect downgrade and steepness recoloring.
    Risk,
    /// Fixed steepness bands from user parameters; bulletins are ignored.
    Custom,
}

impl VisualizationMode {
    /// Lowercase name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            VisualizationMode::Bulletin => "bulletin",
            VisualizationMode::Risk => "risk",
            VisualizationMode::Custom => "custom",
        }
    }
}

impl fmt::Display for VisualizationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VisualizationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bulletin" => Ok(VisualizationMode::Bulletin),
            "risk" => Ok(VisualizationMode::Risk),
            "custom" => Ok(VisualizationMode::Custom),
            other => Err(format!("unknown visualization mode '{other}' (expected bulletin, risk or custom)")),
        }
    }
}

/// Descriptive data attached to a rule.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region_id: Option<String>,
    /// Level string used for the numeric danger value while rasterizing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub danger_level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub steepness_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avalanche_problems: Option<Vec<AvalancheProblem>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bulletin_text: Option<String>,
}

/// One directive for the rasterizer: where, at which elevations and slopes,
/// and in which color to paint.
///
/// Rules are immutable once built; a new rule list replaces the old one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRule {
    /// Area the rule may paint.
    pub bounds: Bounds,
    /// Exact shape; `None` paints the whole bounds rectangle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry: Option<Geometry>,
    /// Inclusive elevation range in meters.
    pub min_elev: f64,
    pub max_elev: f64,
    /// Slope floor in degrees.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_slope: Option<f64>,
    /// Recolor by measured slope and danger value.
    #[serde(default)]
    pub apply_steepness_logic: bool,
    /// Aspects at full severity; `None` means all, an empty set means none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_aspects: Option<BTreeSet<Aspect>>,
    /// Base color.
    pub color: Rgba,
    #[serde(default)]
    pub properties: RuleProperties,
}

impl GenerationRule {
    /// True when the rasterizer must measure slope for this rule.
    pub fn checks_slope(&self) -> bool {
        self.min_slope.is_some_and(|s| s > 0.0) || self.apply_steepness_logic
    }

    /// Aspect restriction, if any. An empty set matches no aspect.
    pub fn aspect_filter(&self) -> Option<&BTreeSet<Aspect>> {
        self.valid_aspects.as_ref()
    }

    /// True when the rule needs terrain metrics at each pixel.
    pub fn needs_terrain(&self) -> bool {
        self.checks_slope() || self.aspect_filter().is_some()
    }

    /// Inclusive elevation test.
    pub fn accepts_elevation(&self, elevation: f64) -> bool {
        elevation >= self.min_elev && elevation <= self.max_elev
    }
}

/// User parameters for custom mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomModeParams {
    /// Lower elevation in meters.
    pub min_elevation: f64,
    /// Upper elevation in meters.
    pub max_elevation: f64,
    /// Slope floor combined with each threshold's own floor.
    pub min_slope: f64,
    /// Aspects to show; `None` means all.
    pub aspects: Option<BTreeSet<Aspect>>,
}

impl Default for CustomModeParams {
    fn default() -> Self {
        Self {
            min_elevation: 0.0,
            max_elevation: 4000.0,
            min_slope: 30.0,
            aspects: None,
        }
    }
}

/// Build rules from elevation bands.
///
/// Bands whose region is not in `regions` are skipped. In
/// [`VisualizationMode::Risk`] rules get the slope floor, steepness logic and
/// the band's aspects; in [`VisualizationMode::Bulletin`] none of them. Any
/// other mode keeps the slope floor only.
pub fn generate_rules(
    bands: &[ElevationBand],
    regions: &RegionCollection,
    mode: VisualizationMode,
    config: &AvalancheConfig,
) -> Vec<GenerationRule> {
    let regions = regions.by_id();
    let risk = mode == VisualizationMode::Risk;

    bands
        .iter()
        .filter_map(|band| {
            let Some(feature) = regions.get(band.region_id.as_str()) else {
                debug!(region = %band.region_id, "No geometry for region, skipping band");
                return None;
            };
            if feature.geometry == Geometry::Unsupported {
                debug!(region = %band.region_id, "Region geometry is not a polygon, skipping band");
                return None;
            }
            let (min_elev, max_elev) =
                adjust_elevation_for_treeline(band.min_elev, band.max_elev, &band.avalanche_problems, config);

            Some(GenerationRule {
                bounds: feature.bounds(),
                geometry: Some(feature.geometry.clone()),
                min_elev,
                max_elev,
                min_slope: (mode != VisualizationMode::Bulletin).then_some(config.risk_min_slope),
                apply_steepness_logic: risk,
                valid_aspects: if risk { band.valid_aspects.clone() } else { None },
                color: config.color_for_level(&band.danger_level),
                properties: RuleProperties {
                    region_id: Some(band.region_id.clone()),
                    danger_level: Some(band.danger_level.clone()),
                    steepness_label: None,
                    avalanche_problems: Some(band.avalanche_problems.clone()),
                    bulletin_text: Some(band.bulletin_text.clone()),
                },
            })
        })
        .collect()
}

/// One rule per configured steepness threshold over the custom bounds.
pub fn custom_rules(params: &CustomModeParams, config: &AvalancheConfig) -> Vec<GenerationRule> {
    let aspects = params.aspects.clone().filter(|aspects| !aspects.is_empty());

    config
        .steepness_thresholds
        .iter()
        .map(|threshold| GenerationRule {
            bounds: config.custom_bounds,
            geometry: None,
            min_elev: params.min_elevation,
            max_elev: params.max_elevation,
            min_slope: Some(threshold.min_slope.max(params.min_slope)),
            apply_steepness_logic: false,
            valid_aspects: aspects.clone(),
            color: parse_color(&threshold.color),
            properties: RuleProperties {
                steepness_label: Some(threshold.label.clone()),
                ..RuleProperties::default()
            },
        })
        .collect()
}

/// Compiles bulletins, regions and user parameters into a rule list.
#[derive(Debug, Clone, Copy)]
pub struct RuleCompiler<'a> {
    config: &'a AvalancheConfig,
}

impl<'a> RuleCompiler<'a> {
    /// Create a compiler over a configuration.
    pub fn new(config: &'a AvalancheConfig) -> Self {
        Self { config }
    }

    /// Produce the full rule list for a mode.
    ///
    /// Custom mode uses only `custom`; the other modes use only the bulletin
    /// and region data.
    pub fn compile(
        &self,
        mode: VisualizationMode,
        bulletins: &[Bulletin],
        regions: &RegionCollection,
        custom: &CustomModeParams,
    ) -> Vec<GenerationRule> {
        let rules = match mode {
            VisualizationMode::Custom => custom_rules(custom, self.config),
            _ => {
                let bands = process_region_elevations(bulletins, self.config);
                debug!(bands = bands.len(), "Processed region elevations");
                generate_rules(&bands, regions, mode, self.config)
            }
        };

        metrics::histogram!(metric_defs::RULES_COMPILED.name, "mode" => mode.as_str())
            .record(rules.len() as f64);
        info!(%mode, rules = rules.len(), "Compiled generation rules");
        rules
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RegionFeature;
    use crate::RegionProperties;

    fn region(id: &str, min: f64, max: f64) -> RegionFeature {
        let ring = vec![vec![min, min], vec![max, min], vec![max, max], vec![min, max], vec![min, min]];
        RegionFeature {
            properties: RegionProperties {
                id: id.to_string(),
                ..RegionProperties::default()
            },
            geometry: Geometry::Polygon(vec![ring]),
        }
    }

    fn band(region_id: &str, level: &str, aspects: Option<BTreeSet<Aspect>>) -> ElevationBand {
        ElevationBand {
            region_id: region_id.to_string(),
            danger_level: level.to_string(),
            min_elev: 1000.0,
            max_elev: 3000.0,
            valid_aspects: aspects,
            avalanche_problems: vec![],
            bulletin_text: "text".to_string(),
        }
    }

    fn regions() -> RegionCollection {
        RegionCollection {
            features: vec![region("A", 10.0, 11.0), region("B", 20.0, 21.0)],
        }
    }

    #[test]
    fn test_bulletin_mode_rules() {
        let config = AvalancheConfig::default();
        let bands = [band("A", "3", Some(BTreeSet::from([Aspect::North])))];
        let rules = generate_rules(&bands, &regions(), VisualizationMode::Bulletin, &config);

        assert_eq!(rules.len(), 1);
        let rule = &rules[0];
        assert_eq!(rule.bounds, Bounds::new(10.0, 11.0, 10.0, 11.0));
        assert!(rule.geometry.is_some());
        assert_eq!(rule.min_slope, None);
        assert!(!rule.apply_steepness_logic);
        assert_eq!(rule.valid_aspects, None);
        assert_eq!(rule.color, Rgba::opaque(0xFF, 0x99, 0x00));
        assert_eq!(rule.properties.region_id.as_deref(), Some("A"));
        assert_eq!(rule.properties.bulletin_text.as_deref(), Some("text"));
        assert!(!rule.needs_terrain());
    }

    #[test]
    fn test_risk_mode_rules() {
        let config = AvalancheConfig::default();
        let aspects = BTreeSet::from([Aspect::North, Aspect::East]);
        let bands = [band("B", "high", Some(aspects.clone()))];
        let rules = generate_rules(&bands, &regions(), VisualizationMode::Risk, &config);

        let rule = &rules[0];
        assert_eq!(rule.min_slope, Some(30.0));
        assert!(rule.apply_steepness_logic);
        assert_eq!(rule.valid_aspects, Some(aspects));
        assert_eq!(rule.color, Rgba::opaque(0xFF, 0x00, 0x00));
        assert!(rule.needs_terrain());
    }

    #[test]
    fn test_custom_mode_through_generate_keeps_slope_floor_only() {
        let config = AvalancheConfig::default();
        let bands = [band("A", "2", Some(BTreeSet::from([Aspect::South])))];
        let rules = generate_rules(&bands, &regions(), VisualizationMode::Custom, &config);

        assert_eq!(rules[0].min_slope, Some(30.0));
        assert!(!rules[0].apply_steepness_logic);
        assert_eq!(rules[0].valid_aspects, None);
    }

    #[test]
    fn test_non_polygon_region_skipped() {
        let config = AvalancheConfig::default();
        let mut regions = regions();
        regions.features[1].geometry = Geometry::Unsupported;

        let bands = [band("A", "2", None), band("B", "4", None)];
        let rules = generate_rules(&bands, &regions, VisualizationMode::Bulletin, &config);
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].properties.region_id.as_deref(), Some("A"));
    }

    #[test]
    fn test_missing_region_skipped() {
        let config = AvalancheConfig::default();
        let bands = [band("A", "1", None), band("missing", "4", None), band("B", "2", None)];
        let rules = generate_rules(&bands, &regions(), VisualizationMode::Bulletin, &config);

        let ids: Vec<_> = rules.iter().filter_map(|r| r.properties.region_id.as_deref()).collect();
        assert_eq!(ids, vec!["A", "B"]);
    }

    #[test]
    fn test_treeline_applied_at_generation() {
        let config = AvalancheConfig::default();
        let mut b = band("A", "3", None);
        b.min_elev = 0.0;
        b.avalanche_problems = vec![AvalancheProblem {
            problem_type: "wind_slab".to_string(),
            elevation: Some(crate::ElevationBounds {
                lower_bound: Some("treeline".to_string()),
                upper_bound: None,
            }),
            ..AvalancheProblem::default()
        }];

        let rules = generate_rules(&[b], &regions(), VisualizationMode::Bulletin, &config);
        assert_eq!((rules[0].min_elev, rules[0].max_elev), (2000.0, 3000.0));
    }

    #[test]
    fn test_custom_rules() {
        let config = AvalancheConfig::default();
        let params = CustomModeParams {
            min_elevation: 1500.0,
            max_elevation: 2800.0,
            min_slope: 33.0,
            aspects: Some(BTreeSet::from([Aspect::NorthWest])),
        };

        let rules = custom_rules(&params, &config);
        let slopes: Vec<_> = rules.iter().map(|r| r.min_slope).collect();
        assert_eq!(slopes, vec![Some(33.0), Some(35.0), Some(40.0)]);

        let labels: Vec<_> = rules.iter().filter_map(|r| r.properties.steepness_label.as_deref()).collect();
        assert_eq!(labels, vec!["> 30°", "> 35°", "> 40°"]);

        for rule in &rules {
            assert_eq!(rule.bounds, config.custom_bounds);
            assert!(rule.geometry.is_none());
            assert_eq!((rule.min_elev, rule.max_elev), (1500.0, 2800.0));
            assert_eq!(rule.valid_aspects, params.aspects);
            assert!(!rule.apply_steepness_logic);
            assert_eq!(rule.properties.danger_level, None);
        }
        assert_eq!(rules[0].color, Rgba::opaque(0xFF, 0xFF, 0x33));
    }

    #[test]
    fn test_custom_empty_aspects_mean_all() {
        let config = AvalancheConfig::default();
        let params = CustomModeParams {
            aspects: Some(BTreeSet::new()),
            ..CustomModeParams::default()
        };
        assert!(custom_rules(&params, &config).iter().all(|r| r.valid_aspects.is_none()));
    }

    #[test]
    fn test_compile_dispatch() {
        let config = AvalancheConfig::default();
        let compiler = RuleCompiler::new(&config);
        let custom = CustomModeParams::default();

        let custom_rules = compiler.compile(VisualizationMode::Custom, &[], &regions(), &custom);
        assert_eq!(custom_rules.len(), 3);

        let bulletin_rules = compiler.compile(VisualizationMode::Bulletin, &[], &regions(), &custom);
        assert!(bulletin_rules.is_empty());
    }

    #[test]
    fn test_mode_parse() {
        assert_eq!("RISK".parse::<VisualizationMode>().unwrap(), VisualizationMode::Risk);
        assert_eq!(VisualizationMode::Custom.to_string(), "custom");
        assert!("heatmap".parse::<VisualizationMode>().is_err());
    }

    #[test]
    fn test_rule_json_shape() {
        let config = AvalancheConfig::default();
        let rules = custom_rules(&CustomModeParams::default(), &config);
        let json = serde_json::to_value(&rules[0]).unwrap();

        assert_eq!(json["minSlope"], 30.0);
        assert_eq!(json["color"], "#FFFF33");
        assert_eq!(json["properties"]["steepnessLabel"], "> 30°");
        assert!(json.get("geometry").is_none());

        let back: GenerationRule = serde_json::from_value(json).unwrap();
        assert_eq!(back, rules[0]);
    }
}
