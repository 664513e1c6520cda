use serde::Serialize;
use tracing::{debug, warn};

use crate::core::address::QueryAddress;
use crate::core::record::ReferenceRecord;
use crate::core::types::{confidence_percent, Confidence, RecordId};
use crate::gazetteer::index::CandidateFinder;
use crate::gazetteer::store::ReferenceIndex;
use crate::matching::auto::{self, AutoRejection};
use crate::matching::config::MatchingConfig;
use crate::matching::preprocess::{central_post_office, PreparedQuery};
use crate::matching::scoring::MatchScore;

/// Tolerance when comparing a composite score against the ranking threshold.
/// Sums of weights such as `0.35 + 0.35 - 0.10` land a hair under `0.60`.
const SCORE_EPSILON: f64 = 1e-9;

/// A gazetteer record scored against a query
#[derive(Debug, Clone, Serialize)]
pub struct ScoredCandidate {
    /// Position in the index; `None` for synthetic records
    pub record_id: Option<RecordId>,

    pub record: ReferenceRecord,

    /// Composite score in `[0, 1]`
    pub score: f64,

    /// `score` as a whole percentage
    pub confidence: u8,

    pub band: Confidence,

    /// Per-field evidence; `None` when scoring was bypassed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breakdown: Option<MatchScore>,
}

impl ScoredCandidate {
    fn scored(record_id: RecordId, record: &ReferenceRecord, breakdown: MatchScore) -> Self {
        Self {
            record_id: Some(record_id),
            record: record.clone(),
            score: breakdown.composite,
            confidence: confidence_percent(breakdown.composite),
            band: breakdown.confidence,
            breakdown: Some(breakdown),
        }
    }

    /// A certain match that did not go through scoring
    fn certain(record: ReferenceRecord) -> Self {
        Self {
            record_id: None,
            record,
            score: 1.0,
            confidence: 100,
            band: Confidence::Exact,
            breakdown: None,
        }
    }
}

/// Result of resolving one query
#[derive(Debug, Clone, Default, Serialize)]
pub struct MatchResult {
    /// The candidate safe to apply without review
    pub auto: Option<ScoredCandidate>,

    /// Candidates above the similarity threshold, best first, truncated to
    /// the requested page size
    pub ranked: Vec<ScoredCandidate>,

    /// Candidates above the similarity threshold before truncation
    pub total_found: usize,

    /// Why `auto` is empty although candidates were found
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review_reason: Option<AutoRejection>,
}

impl MatchResult {
    #[must_use]
    pub fn best(&self) -> Option<&ScoredCandidate> {
        self.ranked.first()
    }
}

/// The main matching engine
pub struct MatchEngine<'a> {
    index: &'a ReferenceIndex,
    /// Configuration including scoring weights and thresholds
    config: MatchingConfig,
}

impl<'a> MatchEngine<'a> {
    /// Create a new matching engine with default configuration
    pub fn new(index: &'a ReferenceIndex) -> Self {
        Self {
            index,
            config: MatchingConfig::default(),
        }
    }

    /// Create a new matching engine with custom configuration
    pub fn with_config(index: &'a ReferenceIndex, config: MatchingConfig) -> Self {
        Self { index, config }
    }

    #[must_use]
    pub fn config(&self) -> &MatchingConfig {
        &self.config
    }

    /// Resolve a query against the gazetteer.
    ///
    /// Returns at most `max_results` ranked candidates (the configured
    /// default when `None`). The automatic pick is decided over every
    /// candidate above the threshold, before truncation.
    #[must_use]
    pub fn search(&self, query: &QueryAddress, max_results: Option<usize>) -> MatchResult {
        let limit = max_results.unwrap_or(self.config.max_search_results);

        if self.index.is_empty() {
            warn!("Search against an empty gazetteer");
            return MatchResult::default();
        }

        let prepared = PreparedQuery::new(query);

        if prepared.is_po_box() {
            debug!("Post-office box query, answering with the central post office");
            let candidate = ScoredCandidate::certain(central_post_office());
            return MatchResult {
                auto: Some(candidate.clone()),
                ranked: vec![candidate],
                total_found: 1,
                review_reason: None,
            };
        }

        // Step 1: Find candidates via index
        let finder = CandidateFinder::new(self.index);
        let candidate_ids = finder.find_candidates(
            prepared.address.city(),
            prepared.address.region(),
            self.config.max_candidates,
        );
        debug!("{} candidates for {}", candidate_ids.len(), prepared.address);

        // Step 2: Score and keep those above the threshold
        let threshold = self.config.similarity_threshold - SCORE_EPSILON;
        let mut ranked: Vec<ScoredCandidate> = candidate_ids
            .into_iter()
            .filter_map(|id| self.index.get(id).map(|record| (id, record)))
            .map(|(id, record)| {
                let breakdown = MatchScore::calculate(&prepared, record, &self.config);
                (id, record, breakdown)
            })
            .filter(|(_, _, breakdown)| breakdown.composite >= threshold)
            .map(|(id, record, breakdown)| ScoredCandidate::scored(id, record, breakdown))
            .collect();

        // Step 3: Rank; sort_by is stable so ties keep candidate order
        ranked.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        let total_found = ranked.len();
        debug!("{total_found} candidates above threshold");

        // Step 4: Automatic pick over the full list, then truncate
        let (auto, review_reason) = match auto::evaluate_auto(&prepared, &ranked, &self.config) {
            Ok(candidate) => (Some(candidate.clone()), None),
            Err(reason) => (None, (total_found > 0).then_some(reason)),
        };
        ranked.truncate(limit);

        MatchResult {
            auto,
            ranked,
            total_found,
            review_reason,
        }
    }

    /// Ranked candidates only, at most `limit`
    #[must_use]
    pub fn find_matches(&self, query: &QueryAddress, limit: usize) -> Vec<ScoredCandidate> {
        self.search(query, Some(limit)).ranked
    }

    /// Composite score of a single record against a query
    #[must_use]
    pub fn score(&self, query: &QueryAddress, record: &ReferenceRecord) -> f64 {
        MatchScore::calculate(&PreparedQuery::new(query), record, &self.config).composite
    }

    /// Apply the automatic-pick rule to an already ranked list
    #[must_use]
    pub fn decide_auto(
        &self,
        query: &QueryAddress,
        ranked: &[ScoredCandidate],
    ) -> Option<ScoredCandidate> {
        auto::decide_auto(&PreparedQuery::new(query), ranked, &self.config)
    }

    /// Find the single best match
    #[cfg(test)]
    pub fn find_best_match(&self, query: &QueryAddress) -> Option<ScoredCandidate> {
        self.find_matches(query, 1).into_iter().next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::record::RecordFields;

    fn record(city: &str, street: &str, buildings: &str, postal_index: &str) -> ReferenceRecord {
        ReferenceRecord::new(RecordFields {
            region: "Київська область".to_string(),
            city: city.to_string(),
            street: street.to_string(),
            buildings: buildings.to_string(),
            postal_index: postal_index.to_string(),
            ..RecordFields::default()
        })
    }

    fn make_test_index() -> ReferenceIndex {
        ReferenceIndex::from_records(vec![
            record("м. Київ", "вул. Хрещатик", "1,3,5", "01001"),
            record("м. Київ", "вул. Хрещатик", "2,4,6", "01001"),
            record("м. Київ", "бульв. Лесі Українки", "26", "01133"),
            record("м. Бровари", "вул. Київська", "1", "07400"),
        ])
    }

    fn khreshchatyk(building: &str) -> QueryAddress {
        QueryAddress::new()
            .with_city("Київ")
            .with_street("Хрещатик")
            .with_building(building)
    }

    #[test]
    fn test_exact_address_auto_matches() {
        let index = make_test_index();
        let engine = MatchEngine::new(&index);

        let result = engine.search(&khreshchatyk("1"), None);
        let auto = result.auto.expect("expected an automatic pick");
        assert_eq!(auto.record_id, Some(RecordId(0)));
        assert!(auto.score >= 0.95);
        assert_eq!(result.ranked[0].record_id, Some(RecordId(0)));
        assert!(result.review_reason.is_none());
    }

    #[test]
    fn test_unknown_building_ranks_without_auto() {
        let index = make_test_index();
        let engine = MatchEngine::new(&index);

        let result = engine.search(&khreshchatyk("999"), None);
        assert!(result.auto.is_none());
        assert!(!result.ranked.is_empty());
        assert!(result.ranked[0].score > 0.0);
        assert_eq!(result.review_reason, Some(AutoRejection::NoHighConfidence));
    }

    #[test]
    fn test_ranking_is_sorted_and_stable() {
        let index = make_test_index();
        let engine = MatchEngine::new(&index);

        let result = engine.search(&QueryAddress::new().with_city("Київ").with_street("Хрещатик"), None);
        for pair in result.ranked.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
        // Both Khreshchatyk rows tie; source order decides
        assert_eq!(result.ranked[0].record_id, Some(RecordId(0)));
        assert_eq!(result.ranked[1].record_id, Some(RecordId(1)));
    }

    #[test]
    fn test_truncation_keeps_total() {
        let index = make_test_index();
        let engine = MatchEngine::new(&index);

        let result = engine.search(&QueryAddress::new().with_city("Київ").with_street("Хрещатик"), Some(1));
        assert_eq!(result.ranked.len(), 1);
        assert_eq!(result.total_found, 2);
    }

    #[test]
    fn test_empty_index() {
        let index = ReferenceIndex::new();
        let engine = MatchEngine::new(&index);
        let result = engine.search(&khreshchatyk("1"), None);
        assert!(result.auto.is_none());
        assert!(result.ranked.is_empty());
        assert_eq!(result.total_found, 0);
    }

    #[test]
    fn test_no_city_no_region_finds_nothing() {
        let index = make_test_index();
        let engine = MatchEngine::new(&index);
        let result = engine.search(&QueryAddress::new().with_street("Хрещатик").with_building("1"), None);
        assert!(result.ranked.is_empty());
        assert!(result.review_reason.is_none());
    }

    #[test]
    fn test_po_box_short_circuit() {
        let index = make_test_index();
        let engine = MatchEngine::new(&index);
        let result = engine.search(
            &QueryAddress::new().with_city("м. Київ").with_street("а/с 15"),
            None,
        );
        let auto = result.auto.unwrap();
        assert_eq!(auto.record.postal_index, "01001");
        assert_eq!(auto.confidence, 100);
        assert!(auto.record_id.is_none());
        assert_eq!(result.ranked.len(), 1);
    }

    #[test]
    fn test_score_and_decide_auto() {
        let index = make_test_index();
        let engine = MatchEngine::new(&index);
        let query = khreshchatyk("3");

        let score = engine.score(&query, &index.records()[0]);
        assert!(score >= 0.95);

        let ranked = engine.find_matches(&query, 5);
        let auto = engine.decide_auto(&query, &ranked).unwrap();
        assert_eq!(auto.record_id, Some(RecordId(0)));
    }

    #[test]
    fn test_find_best_match() {
        let index = make_test_index();
        let engine = MatchEngine::new(&index);
        let query = QueryAddress::new()
            .with_city("Київ")
            .with_street("бул.Л.Українки")
            .with_building("26");
        let best = engine.find_best_match(&query).unwrap();
        assert_eq!(best.record.postal_index, "01133");
    }

    #[test]
    fn test_custom_threshold() {
        let index = make_test_index();
        let config = MatchingConfig {
            similarity_threshold: 0.99,
            ..MatchingConfig::default()
        };
        let engine = MatchEngine::with_config(&index, config);
        let result = engine.search(&khreshchatyk("999"), None);
        assert!(result.ranked.is_empty());
    }
}
