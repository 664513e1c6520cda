use std::collections::HashSet;

use crate::core::types::RecordId;

use super::store::ReferenceIndex;

/// Finds gazetteer records that might match a query address
pub struct CandidateFinder<'a> {
    index: &'a ReferenceIndex,
}

impl<'a> CandidateFinder<'a> {
    pub fn new(index: &'a ReferenceIndex) -> Self {
        Self { index }
    }

    /// Union of the city-prefix and region candidates, city first, each
    /// record at most once, never more than `limit` ids.
    ///
    /// Returns nothing when neither a city nor a region is given; the whole
    /// gazetteer is never scanned.
    pub fn find_candidates(&self, city: &str, region: &str, limit: usize) -> Vec<RecordId> {
        let mut seen: HashSet<RecordId> = HashSet::new();
        let mut result = Vec::new();

        let by_city = self.index.candidate_ids_by_city_prefix(city);
        let by_region = self.index.candidate_ids_by_region(region);

        for &id in by_city.iter().chain(by_region) {
            if result.len() >= limit {
                break;
            }
            if seen.insert(id) {
                result.push(id);
            }
        }

        result
    }
}
