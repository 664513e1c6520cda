use serde::Serialize;

use crate::core::record::ReferenceRecord;
use crate::core::types::Confidence;
use crate::normalize::postal_key;
use crate::similarity::{jaro_winkler, token_similarity};

use super::config::MatchingConfig;
use super::preprocess::PreparedQuery;

/// How the query building relates to a record's building list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildingMatch {
    /// Query gave no building
    NotRequested,
    /// Building is in the list
    Exact,
    /// Building is a substring of a listed one, or the reverse (`27` vs `27А`)
    Partial,
    /// Building was requested but the record does not serve it
    Missing,
}

impl BuildingMatch {
    /// Compare a [`building_key`](crate::normalize::building_key) against a
    /// record's building keys
    #[must_use]
    pub fn classify(query_building: &str, record: &ReferenceRecord) -> Self {
        if query_building.is_empty() {
            return BuildingMatch::NotRequested;
        }

        let keys = record.building_keys();
        if keys.iter().any(|k| k == query_building) {
            BuildingMatch::Exact
        } else if keys
            .iter()
            .any(|k| k.contains(query_building) || query_building.contains(k.as_str()))
        {
            BuildingMatch::Partial
        } else {
            BuildingMatch::Missing
        }
    }
}

/// How the query postal index relates to a record's
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PostalMatch {
    /// Either side has no postal index
    NotCompared,
    Match,
    Mismatch,
}

impl PostalMatch {
    #[must_use]
    pub fn classify(query_postal: &str, record: &ReferenceRecord) -> Self {
        let record_postal = postal_key(&record.postal_index);
        if query_postal.is_empty() || record_postal.is_empty() {
            PostalMatch::NotCompared
        } else if query_postal == record_postal {
            PostalMatch::Match
        } else {
            PostalMatch::Mismatch
        }
    }
}

/// Score of one candidate record against a query, with the evidence behind it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchScore {
    /// Token similarity of normalized cities (0 when the query has no city)
    pub city_similarity: f64,

    /// Token similarity of normalized streets
    pub street_similarity: f64,

    /// Jaro-Winkler similarity of normalized regions, when both sides have one
    pub region_similarity: Option<f64>,

    pub building: BuildingMatch,

    pub postal: PostalMatch,

    /// City fell below the city floor; only the damped city score counts
    pub city_gated: bool,

    /// Region fell below the region floor and was penalized
    pub region_penalized: bool,

    /// City, street and building all lined up and earned the alignment bonus
    pub aligned: bool,

    /// Final score, clamped to `[0, 1]`
    pub composite: f64,

    pub confidence: Confidence,
}

impl MatchScore {
    /// Calculate the score of `record` for a prepared query.
    ///
    /// A city below the city floor returns early with a damped score: no
    /// other field can make up for the wrong settlement. Every other field
    /// adds or subtracts from the running total.
    #[must_use]
    pub fn calculate(query: &PreparedQuery, record: &ReferenceRecord, config: &MatchingConfig) -> Self {
        let weights = &config.weights;
        let thresholds = &config.thresholds;

        let building = BuildingMatch::classify(&query.building, record);
        let postal = PostalMatch::classify(&query.postal_index, record);
        let mut score = Self {
            city_similarity: 0.0,
            street_similarity: 0.0,
            region_similarity: None,
            building,
            postal,
            city_gated: false,
            region_penalized: false,
            aligned: false,
            composite: 0.0,
            confidence: Confidence::Low,
        };

        let mut total = 0.0;

        // City
        if !query.city.is_empty() {
            score.city_similarity = token_similarity(&query.city, &record.normalized_city);
            if score.city_similarity < thresholds.city_floor {
                score.city_gated = true;
                let damped = score.city_similarity * weights.city_gate_damping;
                return score.finish(damped);
            }
            total += score.city_similarity * weights.city;
        }

        // Region
        if !query.region.is_empty() && !record.normalized_region.is_empty() {
            let similarity = jaro_winkler(&query.region, &record.normalized_region);
            score.region_similarity = Some(similarity);
            if similarity < thresholds.region_floor {
                score.region_penalized = true;
                total -= weights.region_penalty;
            }
        }

        // Street
        if query.street.is_empty() {
            // Nothing to compare; a settlement-level record is a full match
            if record.normalized_street.is_empty() {
                score.street_similarity = 1.0;
                total += weights.street;
            } else {
                total += weights.street_residual;
            }
        } else {
            score.street_similarity = token_similarity(&query.street, &record.normalized_street);
            let weight = if score.street_similarity >= thresholds.street_floor {
                weights.street
            } else {
                weights.street_residual
            };
            total += score.street_similarity * weight;
        }

        // Building
        total += match building {
            BuildingMatch::Exact => weights.building_exact,
            BuildingMatch::Partial => weights.building_partial,
            BuildingMatch::Missing => -weights.building_missing_penalty,
            BuildingMatch::NotRequested => 0.0,
        };

        // Postal index
        total += match postal {
            PostalMatch::Match => weights.postal_match,
            PostalMatch::Mismatch => -weights.postal_mismatch_penalty,
            PostalMatch::NotCompared => 0.0,
        };

        if score.city_similarity >= thresholds.alignment_city
            && score.street_similarity >= thresholds.alignment_street
            && building == BuildingMatch::Exact
        {
            score.aligned = true;
            total += weights.alignment_bonus;
        }

        score.finish(total)
    }

    fn finish(mut self, total: f64) -> Self {
        self.composite = if total.is_nan() {
            0.0
        } else {
            total.clamp(0.0, 1.0)
        };
        self.confidence = Confidence::from_score(self.composite);
        self
    }
}
