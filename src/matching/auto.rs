//! The automatic-pick rule.
//!
//! A ranked list is only good enough to apply without review when exactly
//! one candidate is high-confidence and it agrees with every hard fact the
//! query states: postal index, building, and region.

use std::fmt;

use serde::Serialize;

use crate::normalize::postal_key;
use crate::similarity::jaro_winkler;

use super::config::MatchingConfig;
use super::engine::ScoredCandidate;
use super::preprocess::PreparedQuery;
use super::scoring::BuildingMatch;

/// Why a ranked list was sent to manual review
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum AutoRejection {
    /// No candidate reached the auto-match confidence
    NoHighConfidence,
    /// More than one candidate reached it
    Ambiguous { count: usize },
    /// The query postal index differs from the candidate's
    PostalMismatch,
    /// The query building is not in the candidate's building list
    BuildingNotListed,
    /// The query region is too far from the candidate's
    RegionMismatch,
}

impl fmt::Display for AutoRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AutoRejection::NoHighConfidence => write!(f, "no high-confidence candidate"),
            AutoRejection::Ambiguous { count } => {
                write!(f, "{count} high-confidence candidates")
            }
            AutoRejection::PostalMismatch => write!(f, "postal index differs"),
            AutoRejection::BuildingNotListed => write!(f, "building not listed"),
            AutoRejection::RegionMismatch => write!(f, "region differs"),
        }
    }
}

/// Apply the automatic-pick rule to a ranked list.
///
/// `ranked` must hold every candidate above the similarity threshold, not
/// just the page shown to the caller, or ambiguity beyond the page would go
/// unnoticed.
///
/// # Errors
///
/// Returns the first rule the list fails.
pub fn evaluate_auto<'r>(
    query: &PreparedQuery,
    ranked: &'r [ScoredCandidate],
    config: &MatchingConfig,
) -> Result<&'r ScoredCandidate, AutoRejection> {
    let mut perfect = ranked
        .iter()
        .filter(|c| c.confidence >= config.auto_match_confidence);

    let Some(candidate) = perfect.next() else {
        return Err(AutoRejection::NoHighConfidence);
    };
    let others = perfect.count();
    if others > 0 {
        return Err(AutoRejection::Ambiguous { count: others + 1 });
    }

    let record = &candidate.record;

    if !query.postal_index.is_empty()
        && postal_key(&record.postal_index) != query.postal_index
    {
        return Err(AutoRejection::PostalMismatch);
    }

    // Partial building matches rank but never auto-apply
    if !query.building.is_empty()
        && BuildingMatch::classify(&query.building, record) != BuildingMatch::Exact
    {
        return Err(AutoRejection::BuildingNotListed);
    }

    // A record without a region has nothing to contradict
    if let Some(floor) = config.auto_region_floor {
        if !query.region.is_empty()
            && !record.normalized_region.is_empty()
            && jaro_winkler(&query.region, &record.normalized_region) < floor
        {
            return Err(AutoRejection::RegionMismatch);
        }
    }

    Ok(candidate)
}

/// The single candidate safe to apply without review, if any
#[must_use]
pub fn decide_auto(
    query: &PreparedQuery,
    ranked: &[ScoredCandidate],
    config: &MatchingConfig,
) -> Option<ScoredCandidate> {
    evaluate_auto(query, ranked, config).ok().cloned()
}
