//! Elevation bands derived from danger ratings and avalanche problems.

use crate::{AvalancheConfig, AvalancheProblem, Bulletin, DangerRating};
use avaraster_common::Aspect;
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::warn;

/// Which end of an elevation range a string describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundKind {
    /// Missing or non-numeric values become 0.
    Lower,
    /// Missing or non-numeric values become the configured default maximum.
    Upper,
}

/// Intermediate (region, danger level, elevation range, aspects) tuple.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ElevationBand {
    /// Region the band applies to.
    pub region_id: String,
    /// Danger level as written in the bulletin.
    pub danger_level: String,
    /// Lower elevation in meters.
    pub min_elev: f64,
    /// Upper elevation in meters.
    pub max_elev: f64,
    /// Aspects of the matching problems; `None` means all aspects, an empty
    /// set means none of them.
    pub valid_aspects: Option<BTreeSet<Aspect>>,
    /// Problems overlapping the rating's elevation range.
    pub avalanche_problems: Vec<AvalancheProblem>,
    /// Bulletin narrative.
    pub bulletin_text: String,
}

/// Parse an elevation bound.
///
/// Numeric strings become meters. Anything else, including "treeline" and a
/// missing value, becomes the widest bound for its side; the treeline keyword
/// is applied later by [`adjust_elevation_for_treeline`].
pub fn parse_elevation(value: Option<&str>, kind: BoundKind, config: &AvalancheConfig) -> f64 {
    value
        .and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(match kind {
            BoundKind::Lower => 0.0,
            BoundKind::Upper => config.default_max_elevation,
        })
}

/// Half-open overlap: ranges that only touch do not overlap.
pub fn ranges_overlap(a_min: f64, a_max: f64, b_min: f64, b_max: f64) -> bool {
    a_min < b_max && a_max > b_min
}

fn problem_range(problem: &AvalancheProblem, config: &AvalancheConfig) -> (f64, f64) {
    (
        parse_elevation(problem.lower_bound(), BoundKind::Lower, config),
        parse_elevation(problem.upper_bound(), BoundKind::Upper, config),
    )
}

fn rating_range(rating: &DangerRating, config: &AvalancheConfig) -> (f64, f64) {
    let elevation = rating.elevation.as_ref();
    (
        parse_elevation(elevation.and_then(|e| e.lower_bound.as_deref()), BoundKind::Lower, config),
        parse_elevation(elevation.and_then(|e| e.upper_bound.as_deref()), BoundKind::Upper, config),
    )
}

/// First rating with the highest danger value.
fn max_danger<'a>(ratings: &'a [DangerRating], config: &AvalancheConfig) -> Option<&'a DangerRating> {
    let (first, rest) = ratings.split_first()?;
    let mut best = (first, config.danger_value(&first.main_value));
    for rating in rest {
        let value = config.danger_value(&rating.main_value);
        if value > best.1 {
            best = (rating, value);
        }
    }
    Some(best.0)
}

/// Aspects listed by `problems`.
///
/// `None` when no problem lists any aspect. Labels that do not parse are
/// dropped without lifting the restriction, so a problem whose labels are
/// all unknown yields an empty set.
fn collect_aspects<'a>(problems: impl IntoIterator<Item = &'a AvalancheProblem>) -> Option<BTreeSet<Aspect>> {
    let labels: Vec<&String> = problems.into_iter().flat_map(|problem| problem.aspects.iter()).collect();
    if labels.is_empty() {
        return None;
    }
    let aspects = labels
        .into_iter()
        .filter_map(|label| match label.parse() {
            Ok(aspect) => Some(aspect),
            Err(e) => {
                warn!(error = %e, "Ignoring aspect");
                None
            }
        })
        .collect();
    Some(aspects)
}

/// Turn bulletins into elevation bands.
///
/// For each bulletin with ratings, each referenced region and each rating:
/// when the bulletin lists problems, the band spans the *union* of the
/// problems whose ranges overlap the rating (or the rating's own range if
/// none do) and carries their aspects. Without problems a single band
/// `[0, default_max_elevation]` at the bulletin's highest rating is emitted
/// per region.
pub fn process_region_elevations(bulletins: &[Bulletin], config: &AvalancheConfig) -> Vec<ElevationBand> {
    let mut bands = Vec::new();

    for bulletin in bulletins {
        if bulletin.danger_ratings.is_empty() {
            continue;
        }
        let text = bulletin.text();
        let problems = &bulletin.avalanche_problems;

        for region in &bulletin.regions {
            if problems.is_empty() {
                if let Some(rating) = max_danger(&bulletin.danger_ratings, config) {
                    bands.push(ElevationBand {
                        region_id: region.id.clone(),
                        danger_level: rating.main_value.clone(),
                        min_elev: 0.0,
                        max_elev: config.default_max_elevation,
                        valid_aspects: None,
                        avalanche_problems: Vec::new(),
                        bulletin_text: text.clone(),
                    });
                }
                continue;
            }

            for rating in &bulletin.danger_ratings {
                let (mut min_elev, mut max_elev) = rating_range(rating, config);

                let matching: Vec<&AvalancheProblem> = problems
                    .iter()
                    .filter(|problem| {
                        let (p_min, p_max) = problem_range(problem, config);
                        ranges_overlap(min_elev, max_elev, p_min, p_max)
                    })
                    .collect();

                if !matching.is_empty() {
                    let (union_min, union_max) = matching
                        .iter()
                        .map(|problem| problem_range(problem, config))
                        .fold((max_elev, min_elev), |(lo, hi), (p_min, p_max)| {
                            (lo.min(p_min), hi.max(p_max))
                        });
                    min_elev = union_min;
                    max_elev = union_max;
                }

                bands.push(ElevationBand {
                    region_id: region.id.clone(),
                    danger_level: rating.main_value.clone(),
                    min_elev,
                    max_elev,
                    valid_aspects: collect_aspects(matching.iter().copied()),
                    avalanche_problems: matching.into_iter().cloned().collect(),
                    bulletin_text: text.clone(),
                });
            }
        }
    }

    bands
}

/// Apply "treeline" keywords from the problems' raw bounds.
///
/// A lower bound of "treeline" raises `min` to at least the treeline
/// elevation; an upper bound of "treeline" lowers `max` to at most it.
pub fn adjust_elevation_for_treeline(
    min: f64,
    max: f64,
    problems: &[AvalancheProblem],
    config: &AvalancheConfig,
) -> (f64, f64) {
    let is_treeline = |bound: Option<&str>| bound.is_some_and(|b| b.eq_ignore_ascii_case("treeline"));
    let treeline = config.treeline_elevation;

    problems.iter().fold((min, max), |(min, max), problem| {
        let min = if is_treeline(problem.lower_bound()) { min.max(treeline) } else { min };
        let max = if is_treeline(problem.upper_bound()) { max.min(treeline) } else { max };
        (min, max)
    })
}
