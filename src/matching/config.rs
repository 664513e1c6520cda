use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default minimum composite score for a candidate to be ranked
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.60;

/// Default confidence (percent) a candidate needs to be picked automatically
pub const DEFAULT_AUTO_MATCH_CONFIDENCE: u8 = 98;

/// Default minimum region similarity for an automatic pick
pub const DEFAULT_AUTO_REGION_FLOOR: f64 = 0.85;

/// Default cap on candidates scored per query
pub const DEFAULT_MAX_CANDIDATES: usize = 5000;

/// Default number of ranked candidates returned per query
pub const DEFAULT_MAX_SEARCH_RESULTS: usize = 20;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    ReadError {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    InvalidValue(String),
}

/// Weights, bonuses and penalties of the composite score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    /// Weight of city similarity
    pub city: f64,
    /// Weight of street similarity at or above the street floor
    pub street: f64,
    /// Weight of street similarity below the street floor
    pub street_residual: f64,
    /// Bonus for an exact building match
    pub building_exact: f64,
    /// Bonus for a building that only matches as a substring
    pub building_partial: f64,
    /// Penalty for a requested building that the record does not serve
    pub building_missing_penalty: f64,
    /// Bonus for an equal postal index
    pub postal_match: f64,
    /// Penalty for a different postal index
    pub postal_mismatch_penalty: f64,
    /// Bonus when city, street and building all line up
    pub alignment_bonus: f64,
    /// Penalty for a region below the region floor
    pub region_penalty: f64,
    /// Multiplier applied to city similarity when it falls below the city floor
    pub city_gate_damping: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            city: 0.35,
            street: 0.35,
            street_residual: 0.10,
            building_exact: 0.25,
            building_partial: 0.10,
            building_missing_penalty: 0.10,
            postal_match: 0.05,
            postal_mismatch_penalty: 0.02,
            alignment_bonus: 0.10,
            region_penalty: 0.30,
            city_gate_damping: 0.2,
        }
    }
}

impl ScoringWeights {
    fn values(&self) -> [(&'static str, f64); 11] {
        [
            ("city", self.city),
            ("street", self.street),
            ("street_residual", self.street_residual),
            ("building_exact", self.building_exact),
            ("building_partial", self.building_partial),
            ("building_missing_penalty", self.building_missing_penalty),
            ("postal_match", self.postal_match),
            ("postal_mismatch_penalty", self.postal_mismatch_penalty),
            ("alignment_bonus", self.alignment_bonus),
            ("region_penalty", self.region_penalty),
            ("city_gate_damping", self.city_gate_damping),
        ]
    }
}

/// Hard floors and alignment thresholds, all similarities in `[0, 1]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringThresholds {
    /// Below this city similarity the score is damped and nothing else counts
    pub city_floor: f64,
    /// Below this street similarity the street weight collapses to the residual
    pub street_floor: f64,
    /// Below this region similarity the region penalty applies
    pub region_floor: f64,
    /// City similarity needed for the alignment bonus
    pub alignment_city: f64,
    /// Street similarity needed for the alignment bonus
    pub alignment_street: f64,
}

impl Default for ScoringThresholds {
    fn default() -> Self {
        Self {
            city_floor: 0.85,
            street_floor: 0.75,
            region_floor: 0.80,
            alignment_city: 0.95,
            alignment_street: 0.95,
        }
    }
}

impl ScoringThresholds {
    fn values(&self) -> [(&'static str, f64); 5] {
        [
            ("city_floor", self.city_floor),
            ("street_floor", self.street_floor),
            ("region_floor", self.region_floor),
            ("alignment_city", self.alignment_city),
            ("alignment_street", self.alignment_street),
        ]
    }
}

/// Configuration for the matching engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    /// Minimum composite score for including a candidate in the ranking
    pub similarity_threshold: f64,
    /// Confidence (percent) a candidate needs to count as high-confidence
    pub auto_match_confidence: u8,
    /// Minimum region similarity for an automatic pick; `None` disables the check
    pub auto_region_floor: Option<f64>,
    /// Cap on candidates scored per query
    pub max_candidates: usize,
    /// Default number of ranked candidates returned
    pub max_search_results: usize,
    pub weights: ScoringWeights,
    pub thresholds: ScoringThresholds,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            auto_match_confidence: DEFAULT_AUTO_MATCH_CONFIDENCE,
            auto_region_floor: Some(DEFAULT_AUTO_REGION_FLOOR),
            max_candidates: DEFAULT_MAX_CANDIDATES,
            max_search_results: DEFAULT_MAX_SEARCH_RESULTS,
            weights: ScoringWeights::default(),
            thresholds: ScoringThresholds::default(),
        }
    }
}

impl MatchingConfig {
    /// Read a JSON config; missing keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if the
    /// values fail [`MatchingConfig::validate`].
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&content)
    }

    /// Parse and validate a JSON config
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or a value is out of range.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every value is in range.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let unit = |name: &str, value: f64| {
            if (0.0..=1.0).contains(&value) {
                Ok(())
            } else {
                Err(ConfigError::InvalidValue(format!(
                    "{name} must be between 0 and 1, got {value}"
                )))
            }
        };

        unit("similarity_threshold", self.similarity_threshold)?;
        if let Some(floor) = self.auto_region_floor {
            unit("auto_region_floor", floor)?;
        }
        for (name, value) in self.thresholds.values() {
            unit(name, value)?;
        }
        for (name, value) in self.weights.values() {
            unit(name, value)?;
        }

        if self.auto_match_confidence > 100 {
            return Err(ConfigError::InvalidValue(format!(
                "auto_match_confidence must be at most 100, got {}",
                self.auto_match_confidence
            )));
        }
        if self.max_candidates == 0 {
            return Err(ConfigError::InvalidValue(
                "max_candidates must be positive".to_string(),
            ));
        }
        if self.max_search_results == 0 {
            return Err(ConfigError::InvalidValue(
                "max_search_results must be positive".to_string(),
            ));
        }

        Ok(())
    }
}
