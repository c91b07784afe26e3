//! Bulletin JSON documents.
//!
//! Field names follow the CAAML-style JSON served by regional avalanche
//! warning services (`bulletinID`, `dangerRatings`, `avalancheProblems`, ...).
//! Fields the rule compiler does not read are ignored on input.

use crate::{BulletinError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Root document: `{"bulletins": [...]}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BulletinCollection {
    /// Bulletins in publication order.
    pub bulletins: Vec<Bulletin>,
}

impl BulletinCollection {
    /// Parse a bulletin document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(BulletinError::from)
    }

    /// Read and parse a bulletin document from disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }
}

/// One bulletin covering a set of regions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bulletin {
    /// Publisher's bulletin identifier.
    #[serde(rename = "bulletinID", default)]
    pub bulletin_id: String,
    /// ISO-8601 publication timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publication_time: Option<String>,
    /// Validity window.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_time: Option<ValidTime>,
    /// Free-text avalanche activity section.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avalanche_activity: Option<AvalancheActivity>,
    /// Danger ratings, possibly scoped to elevation bands.
    #[serde(default)]
    pub danger_ratings: Vec<DangerRating>,
    /// Avalanche problems with their own elevation and aspect scope.
    #[serde(default)]
    pub avalanche_problems: Vec<AvalancheProblem>,
    /// Regions this bulletin applies to.
    #[serde(default)]
    pub regions: Vec<RegionRef>,
}

impl Bulletin {
    /// Highlights and comment of the activity section, separated by a blank
    /// line. Empty when the section is absent.
    pub fn text(&self) -> String {
        let Some(activity) = &self.avalanche_activity else {
            return String::new();
        };
        [&activity.highlights, &activity.comment]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Start and end of a bulletin's validity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidTime {
    /// Start timestamp.
    pub start_time: String,
    /// End timestamp.
    pub end_time: String,
}

/// Narrative text of a bulletin.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AvalancheActivity {
    /// Headline.
    #[serde(default)]
    pub highlights: Option<String>,
    /// Body.
    #[serde(default)]
    pub comment: Option<String>,
}

/// A danger level, optionally limited to an elevation band.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DangerRating {
    /// Level as a number ("1".."5") or name ("low".."very_high").
    pub main_value: String,
    /// "all_day", "earlier", "later", ...
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_time_period: Option<String>,
    /// Elevation scope.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elevation: Option<ElevationBounds>,
}

/// Elevation scope given as strings: meters or the keyword "treeline".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElevationBounds {
    /// Lower bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lower_bound: Option<String>,
    /// Upper bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upper_bound: Option<String>,
}

/// A specific hazard pattern described by the bulletin.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvalancheProblem {
    /// e.g. "wind_slab", "persistent_weak_layers".
    pub problem_type: String,
    /// Elevation scope.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elevation: Option<ElevationBounds>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_time_period: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snowpack_stability: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avalanche_size: Option<u8>,
    /// Compass labels ("N", "NE", ...).
    #[serde(default)]
    pub aspects: Vec<String>,
}

impl AvalancheProblem {
    /// Raw lower elevation bound.
    pub fn lower_bound(&self) -> Option<&str> {
        self.elevation.as_ref()?.lower_bound.as_deref()
    }

    /// Raw upper elevation bound.
    pub fn upper_bound(&self) -> Option<&str> {
        self.elevation.as_ref()?.upper_bound.as_deref()
    }
}

/// Reference to a region by id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegionRef {
    /// Region identifier, e.g. "AT-07-14".
    #[serde(rename = "regionID", alias = "id")]
    pub id: String,
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const BULLETIN: &str = r#"{
        "bulletins": [{
            "bulletinID": "b-1",
            "publicationTime": "2025-01-15T16:00:00Z",
            "validTime": {"startTime": "2025-01-15T16:00:00Z", "endTime": "2025-01-16T16:00:00Z"},
            "avalancheActivity": {"highlights": "Fresh wind slabs", "comment": "Watch ridgelines."},
            "weatherForecast": {"comment": "ignored"},
            "dangerRatings": [
                {"mainValue": "considerable", "validTimePeriod": "all_day",
                 "elevation": {"lowerBound": "treeline"}}
            ],
            "avalancheProblems": [
                {"problemType": "wind_slab", "elevation": {"lowerBound": "2200"},
                 "aspects": ["N", "NE"], "avalancheSize": 2}
            ],
            "regions": [{"regionID": "AT-07-14", "name": "Stubai"}, {"id": "AT-07-15"}]
        }]
    }"#;

    #[test]
    fn test_parse_bulletin() {
        let collection = BulletinCollection::from_json_str(BULLETIN).unwrap();
        let bulletin = &collection.bulletins[0];

        assert_eq!(bulletin.bulletin_id, "b-1");
        assert_eq!(bulletin.danger_ratings[0].main_value, "considerable");
        assert_eq!(bulletin.avalanche_problems[0].lower_bound(), Some("2200"));
        assert_eq!(bulletin.avalanche_problems[0].upper_bound(), None);
        assert_eq!(bulletin.avalanche_problems[0].aspects, vec!["N", "NE"]);
        assert_eq!(bulletin.regions[0].id, "AT-07-14");
        assert_eq!(bulletin.regions[1].id, "AT-07-15");
    }

    #[test]
    fn test_bulletin_text() {
        let collection = BulletinCollection::from_json_str(BULLETIN).unwrap();
        assert_eq!(collection.bulletins[0].text(), "Fresh wind slabs\n\nWatch ridgelines.");

        let mut bulletin = collection.bulletins[0].clone();
        bulletin.avalanche_activity = Some(AvalancheActivity {
            highlights: None,
            comment: Some("Only a comment".to_string()),
        });
        assert_eq!(bulletin.text(), "Only a comment");

        bulletin.avalanche_activity = None;
        assert_eq!(bulletin.text(), "");
    }

    #[test]
    fn test_missing_optional_sections() {
        let collection =
            BulletinCollection::from_json_str(r#"{"bulletins": [{"bulletinID": "x", "regions": []}]}"#)
                .unwrap();
        assert!(collection.bulletins[0].danger_ratings.is_empty());
        assert!(collection.bulletins[0].avalanche_problems.is_empty());
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            BulletinCollection::from_json_str("{\"bulletins\": [}"),
            Err(BulletinError::Json(_))
        ));
        assert!(matches!(
            BulletinCollection::from_path("/nonexistent/bulletins.json"),
            Err(BulletinError::Io(_))
        ));
    }
}
