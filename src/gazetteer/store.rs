use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use thiserror::Error;

use crate::core::record::ReferenceRecord;
use crate::core::types::RecordId;
use crate::normalize::{normalize_city, normalize_region, normalize_street};

#[derive(Error, Debug)]
pub enum GazetteerError {
    #[error("Failed to read gazetteer: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse gazetteer: {0}")]
    ParseError(#[from] csv::Error),

    #[error("Could not decode {path} with any supported encoding (tried {tried})")]
    UndecodableSource { path: String, tried: String },

    #[error("Gazetteer is missing required column '{0}'")]
    MissingColumn(String),

    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),

    #[error("Failed to encode snapshot: {0}")]
    SnapshotEncodeError(#[from] bincode::Error),

    #[error("Failed to persist snapshot: {0}")]
    SnapshotPersistError(#[from] tempfile::PersistError),
}

/// City prefix lengths inserted into the prefix map for every record
pub const CITY_PREFIX_LENGTHS: [usize; 2] = [2, 3];

/// Prefix length used when looking a query city up
pub const QUERY_PREFIX_LENGTH: usize = 2;

/// First `n` characters of `s`, or `None` when `s` is shorter
fn char_prefix(s: &str, n: usize) -> Option<&str> {
    match s.char_indices().nth(n) {
        Some((offset, _)) => Some(&s[..offset]),
        None if s.chars().count() == n => Some(s),
        None => None,
    }
}

/// Shortest normalized query answered by [`ReferenceIndex::search_cities`]
pub const CITY_SUGGESTION_PREFIX: usize = 3;

/// Settlement type prefixes in the order suggestions list them
const SETTLEMENT_RANKING: [&str; 4] = ["м.", "смт.", "с.", "с-ще"];

/// A settlement as the gazetteer lists it. The region tells apart
/// settlements that share a name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Settlement {
    /// Name with its type prefix, e.g. `м. Бровари`
    pub city: String,
    pub region: String,
    /// Districts its rows fall in; cities often span several
    pub districts: Vec<String>,
}

impl Settlement {
    /// Group records into settlements by exact city and region
    fn collect<'r>(records: impl Iterator<Item = &'r ReferenceRecord>) -> Vec<Self> {
        let mut grouped: BTreeMap<(&str, &str), BTreeSet<&str>> = BTreeMap::new();
        for record in records {
            let districts = grouped
                .entry((record.city.as_str(), record.region.as_str()))
                .or_default();
            if !record.district().is_empty() {
                districts.insert(record.district());
            }
        }

        grouped
            .into_iter()
            .map(|((city, region), districts)| Self {
                city: city.to_string(),
                region: region.to_string(),
                districts: districts.into_iter().map(str::to_string).collect(),
            })
            .collect()
    }

    fn holds(&self, record: &ReferenceRecord) -> bool {
        record.city == self.city && record.region == self.region
    }

    /// Cities first, then urban-type settlements, villages, hamlets
    fn kind_rank(&self) -> usize {
        let city = self.city.trim_start();
        SETTLEMENT_RANKING
            .iter()
            .position(|prefix| city.starts_with(prefix))
            .unwrap_or(SETTLEMENT_RANKING.len())
    }
}

impl fmt::Display for Settlement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.city)?;
        if !self.districts.is_empty() {
            write!(f, ", {}", self.districts.join(" / "))?;
        }
        if !self.region.is_empty() {
            write!(f, ", {}", self.region)?;
        }
        Ok(())
    }
}

/// Summary counts over a loaded index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    pub total_records: usize,
    pub indexed_prefixes: usize,
    pub indexed_regions: usize,
}

/// The reference gazetteer with its lookup maps.
///
/// Built once, then only read. Every id stored in either map points into
/// `records`; the three collections are only ever constructed together.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReferenceIndex {
    /// All gazetteer rows in source order
    records: Vec<ReferenceRecord>,

    /// Index: 2- and 3-character prefix of the normalized city -> record ids
    by_city_prefix: HashMap<String, Vec<RecordId>>,

    /// Index: normalized region -> record ids
    by_region: HashMap<String, Vec<RecordId>>,
}

impl ReferenceIndex {
    /// Create an empty index
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index over `records`, deriving both lookup maps
    #[must_use]
    pub fn from_records(records: Vec<ReferenceRecord>) -> Self {
        let mut by_city_prefix: HashMap<String, Vec<RecordId>> = HashMap::new();
        let mut by_region: HashMap<String, Vec<RecordId>> = HashMap::new();

        for (i, record) in records.iter().enumerate() {
            let id = RecordId(i);

            // Both granularities so two-letter queries still resolve
            for len in CITY_PREFIX_LENGTHS {
                if let Some(prefix) = char_prefix(&record.normalized_city, len) {
                    by_city_prefix.entry(prefix.to_string()).or_default().push(id);
                }
            }

            if !record.normalized_region.is_empty() {
                by_region
                    .entry(record.normalized_region.clone())
                    .or_default()
                    .push(id);
            }
        }

        Self {
            records,
            by_city_prefix,
            by_region,
        }
    }

    /// Reassemble an index from previously built parts, checking that every
    /// id in both maps refers to a stored record.
    ///
    /// # Errors
    ///
    /// Returns `GazetteerError::InvalidSnapshot` when a map holds an id past
    /// the end of `records`.
    pub fn from_parts(
        records: Vec<ReferenceRecord>,
        by_city_prefix: HashMap<String, Vec<RecordId>>,
        by_region: HashMap<String, Vec<RecordId>>,
    ) -> Result<Self, GazetteerError> {
        let len = records.len();
        let dangling = by_city_prefix
            .values()
            .chain(by_region.values())
            .flatten()
            .find(|id| id.index() >= len);

        if let Some(id) = dangling {
            return Err(GazetteerError::InvalidSnapshot(format!(
                "record id {id} out of range for {len} records"
            )));
        }

        Ok(Self {
            records,
            by_city_prefix,
            by_region,
        })
    }

    #[must_use]
    pub fn records(&self) -> &[ReferenceRecord] {
        &self.records
    }

    #[must_use]
    pub fn get(&self, id: RecordId) -> Option<&ReferenceRecord> {
        self.records.get(id.index())
    }

    #[must_use]
    pub fn city_prefix_map(&self) -> &HashMap<String, Vec<RecordId>> {
        &self.by_city_prefix
    }

    #[must_use]
    pub fn region_map(&self) -> &HashMap<String, Vec<RecordId>> {
        &self.by_region
    }

    /// Ids of records whose normalized city shares the query's first two
    /// characters. Empty when the normalized query is shorter than that.
    #[must_use]
    pub fn candidate_ids_by_city_prefix(&self, city: &str) -> &[RecordId] {
        let normalized = normalize_city(city);
        char_prefix(&normalized, QUERY_PREFIX_LENGTH)
            .and_then(|prefix| self.by_city_prefix.get(prefix))
            .map_or(&[], Vec::as_slice)
    }

    /// Ids of records in exactly the query's normalized region
    #[must_use]
    pub fn candidate_ids_by_region(&self, region: &str) -> &[RecordId] {
        let normalized = normalize_region(region);
        if normalized.is_empty() {
            return &[];
        }
        self.by_region.get(&normalized).map_or(&[], Vec::as_slice)
    }

    /// Records sharing the query city's two-character prefix
    #[must_use]
    pub fn get_candidates_by_city_prefix(&self, city: &str) -> Vec<&ReferenceRecord> {
        self.resolve(self.candidate_ids_by_city_prefix(city))
    }

    /// Records in the query's region
    #[must_use]
    pub fn get_candidates_by_region(&self, region: &str) -> Vec<&ReferenceRecord> {
        self.resolve(self.candidate_ids_by_region(region))
    }

    fn resolve(&self, ids: &[RecordId]) -> Vec<&ReferenceRecord> {
        ids.iter().filter_map(|&id| self.get(id)).collect()
    }

    /// Settlements whose normalized name contains the normalized query,
    /// looked up by the query's three-character prefix.
    ///
    /// Cities rank before urban-type settlements, villages and hamlets; at
    /// most `limit` are returned. Queries shorter than three characters
    /// after normalization return nothing.
    #[must_use]
    pub fn search_cities(&self, query: &str, limit: usize) -> Vec<Settlement> {
        let needle = normalize_city(query);
        let Some(prefix) = char_prefix(&needle, CITY_SUGGESTION_PREFIX) else {
            return Vec::new();
        };

        let ids = self.by_city_prefix.get(prefix).map_or(&[][..], Vec::as_slice);
        let mut found = Settlement::collect(
            ids.iter()
                .filter_map(|&id| self.get(id))
                .filter(|record| record.normalized_city.contains(&needle)),
        );
        found.sort_by(|a, b| a.kind_rank().cmp(&b.kind_rank()).then_with(|| a.cmp(b)));
        found.truncate(limit);
        found
    }

    /// Every settlement whose normalized name equals the normalized `city`
    #[must_use]
    pub fn settlements_named(&self, city: &str) -> Vec<Settlement> {
        let normalized = normalize_city(city);
        if normalized.is_empty() {
            return Vec::new();
        }

        Settlement::collect(
            self.get_candidates_by_city_prefix(city)
                .into_iter()
                .filter(|record| record.normalized_city == normalized),
        )
    }

    fn records_in(&self, settlement: &Settlement) -> Vec<&ReferenceRecord> {
        self.candidate_ids_by_city_prefix(&settlement.city)
            .iter()
            .filter_map(|&id| self.get(id))
            .filter(|record| settlement.holds(record))
            .collect()
    }

    /// Distinct street names of a settlement, sorted
    #[must_use]
    pub fn streets_of(&self, settlement: &Settlement) -> Vec<&str> {
        self.records_in(settlement)
            .into_iter()
            .map(|record| record.street.as_str())
            .filter(|street| !street.is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Buildings of the streets in `settlement` whose normalized name
    /// contains the normalized `street`, grouped by postal index.
    ///
    /// Rows without a postal index are left out.
    #[must_use]
    pub fn buildings_of(&self, settlement: &Settlement, street: &str) -> BTreeMap<String, Vec<String>> {
        let mut by_index: BTreeMap<String, Vec<String>> = BTreeMap::new();
        let needle = normalize_street(street);
        if needle.is_empty() {
            return by_index;
        }

        for record in self.records_in(settlement) {
            if record.postal_index.is_empty() || !record.normalized_street.contains(&needle) {
                continue;
            }
            let buildings = by_index.entry(record.postal_index.clone()).or_default();
            for building in record.buildings_list() {
                if !buildings.iter().any(|b| b == building) {
                    buildings.push(building.to_string());
                }
            }
        }

        by_index
    }

    #[must_use]
    pub fn stats(&self) -> IndexStats {
        IndexStats {
            total_records: self.records.len(),
            indexed_prefixes: self.by_city_prefix.len(),
            indexed_regions: self.by_region.len(),
        }
    }

    /// Number of records in the index
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the index holds no records
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
