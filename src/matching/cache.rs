//! On-disk cache of resolved addresses for repeated batch runs.
//!
//! The cache is a JSON file mapping a query key to the stored result and the
//! time it was stored. Entries older than the expiry are dropped on load and
//! ignored on lookup. The file also records the [`MatchingConfig`] the
//! results were produced under; a cache written under a different
//! configuration is started afresh.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, warn};

use crate::core::address::QueryAddress;
use crate::matching::MatchingConfig;

/// Days a cached result stays valid unless configured otherwise
pub const DEFAULT_EXPIRY_DAYS: i64 = 30;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Result cache I/O failed: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Result cache is not valid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Failed to persist result cache: {0}")]
    PersistError(#[from] tempfile::PersistError),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheEntry<T> {
    result: T,
    cached_at: DateTime<Utc>,
}

#[derive(Deserialize)]
#[serde(bound(deserialize = "T: DeserializeOwned"))]
struct CacheFile<T> {
    config: serde_json::Value,
    entries: HashMap<String, CacheEntry<T>>,
}

/// Cache key of a query: the MD5 digest (hex) of its trimmed, lowercased
/// fields joined by `|`.
///
/// Empty fields keep their slot so `Київ||1` and `Київ|1|` stay distinct.
#[must_use]
pub fn cache_key(query: &QueryAddress) -> String {
    let joined = [
        query.city(),
        query.street(),
        query.building(),
        query.region(),
        query.district(),
        query.postal_index(),
    ]
    .iter()
    .map(|field| field.trim().to_lowercase())
    .collect::<Vec<_>>()
    .join("|");

    format!("{:x}", md5::compute(joined.as_bytes()))
}

/// Results keyed by [`cache_key`], persisted as JSON at `path`
pub struct ResultCache<T> {
    path: PathBuf,
    config: serde_json::Value,
    expiry: Duration,
    entries: HashMap<String, CacheEntry<T>>,
    hits: usize,
    dirty: bool,
}

impl<T: Serialize + DeserializeOwned + Clone> ResultCache<T> {
    /// Open the cache at `path` for results produced under `config`.
    ///
    /// A missing, unreadable or foreign cache file yields an empty cache;
    /// it is replaced on the next [`save`](Self::save).
    #[must_use]
    pub fn open(path: &Path, config: &MatchingConfig, expiry_days: i64) -> Self {
        Self::open_at(path, config, expiry_days, Utc::now())
    }

    fn open_at(path: &Path, config: &MatchingConfig, expiry_days: i64, now: DateTime<Utc>) -> Self {
        let config = serde_json::to_value(config).unwrap_or_default();
        let mut cache = Self {
            path: path.to_path_buf(),
            config,
            expiry: Duration::days(expiry_days.max(0)),
            entries: HashMap::new(),
            hits: 0,
            dirty: false,
        };

        match read_cache_file::<T>(path) {
            Ok(Some(file)) if file.config == cache.config => {
                cache.entries = file.entries;
                let before = cache.entries.len();
                let expiry = cache.expiry;
                cache.entries.retain(|_, entry| now - entry.cached_at <= expiry);
                cache.dirty = cache.entries.len() != before;
                debug!(
                    "Result cache {}: {} entries, {} expired",
                    path.display(),
                    cache.entries.len(),
                    before - cache.entries.len()
                );
            }
            Ok(Some(_)) => {
                debug!("Result cache {} was built with another configuration", path.display());
                cache.dirty = true;
            }
            Ok(None) => {}
            Err(e) => {
                warn!("Ignoring unreadable result cache {}: {e}", path.display());
                cache.dirty = true;
            }
        }

        cache
    }

    /// Cached result for `key` if it has not expired
    pub fn get(&mut self, key: &str) -> Option<T> {
        self.get_at(key, Utc::now())
    }

    fn get_at(&mut self, key: &str, now: DateTime<Utc>) -> Option<T> {
        let entry = self.entries.get(key)?;
        if now - entry.cached_at > self.expiry {
            self.entries.remove(key);
            self.dirty = true;
            return None;
        }
        self.hits += 1;
        Some(entry.result.clone())
    }

    pub fn insert(&mut self, key: String, result: T) {
        self.insert_at(key, result, Utc::now());
    }

    fn insert_at(&mut self, key: String, result: T, now: DateTime<Utc>) {
        self.entries.insert(
            key,
            CacheEntry {
                result,
                cached_at: now,
            },
        );
        self.dirty = true;
    }

    /// Lookups answered from the cache so far
    #[must_use]
    pub fn hits(&self) -> usize {
        self.hits
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Write the cache back if anything changed, atomically.
    ///
    /// # Errors
    ///
    /// Returns an error if the temporary file cannot be created, written, or
    /// renamed into place.
    pub fn save(&mut self) -> Result<(), CacheError> {
        if !self.dirty {
            return Ok(());
        }

        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        let mut tmp = NamedTempFile::new_in(dir)?;
        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            serde_json::to_writer_pretty(
                &mut writer,
                &CacheFileRef {
                    config: &self.config,
                    entries: &self.entries,
                },
            )?;
            writer.flush()?;
        }
        tmp.persist(&self.path)?;

        self.dirty = false;
        Ok(())
    }
}

#[derive(Serialize)]
struct CacheFileRef<'a, T> {
    config: &'a serde_json::Value,
    entries: &'a HashMap<String, CacheEntry<T>>,
}

fn read_cache_file<T: DeserializeOwned>(path: &Path) -> Result<Option<CacheFile<T>>, CacheError> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    Ok(Some(serde_json::from_reader(BufReader::new(file))?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn kyiv() -> QueryAddress {
        QueryAddress::new()
            .with_city(" Київ ")
            .with_street("Хрещатик")
            .with_building("22")
    }

    #[test]
    fn test_cache_key_is_normalized_and_positional() {
        assert_eq!(
            cache_key(&kyiv()),
            format!("{:x}", md5::compute("київ|хрещатик|22|||".as_bytes()))
        );
        assert_eq!(cache_key(&kyiv()).len(), 32);
        assert_eq!(
            cache_key(&kyiv()),
            cache_key(&QueryAddress::new().with_city("КИЇВ").with_street("хрещатик ").with_building("22"))
        );
        assert_ne!(
            cache_key(&QueryAddress::new().with_city("Київ").with_building("1")),
            cache_key(&QueryAddress::new().with_city("Київ").with_street("1")),
        );
    }

    #[test]
    fn test_round_trip_through_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("results.json");
        let config = MatchingConfig::default();

        let mut cache: ResultCache<String> = ResultCache::open(&path, &config, DEFAULT_EXPIRY_DAYS);
        assert!(cache.is_empty());
        cache.insert(cache_key(&kyiv()), "01001".to_string());
        cache.save().unwrap();

        let mut reopened: ResultCache<String> = ResultCache::open(&path, &config, DEFAULT_EXPIRY_DAYS);
        assert_eq!(reopened.len(), 1);
        assert_eq!(reopened.get(&cache_key(&kyiv())).as_deref(), Some("01001"));
        assert_eq!(reopened.hits(), 1);
        assert!(reopened.get("одеса||||").is_none());
    }

    #[test]
    fn test_expired_entries_are_dropped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("results.json");
        let config = MatchingConfig::default();
        let now = Utc::now();

        let mut cache: ResultCache<u32> = ResultCache::open_at(&path, &config, 30, now);
        cache.insert_at("old".to_string(), 1, now - Duration::days(31));
        cache.insert_at("fresh".to_string(), 2, now - Duration::days(29));
        assert_eq!(cache.get_at("old", now), None);
        assert_eq!(cache.get_at("fresh", now), Some(2));
        cache.save().unwrap();

        let reopened: ResultCache<u32> = ResultCache::open_at(&path, &config, 30, now);
        assert_eq!(reopened.len(), 1);

        let later: ResultCache<u32> = ResultCache::open_at(&path, &config, 30, now + Duration::days(2));
        assert!(later.is_empty());
    }

    #[test]
    fn test_other_configuration_starts_fresh() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("results.json");

        let mut cache: ResultCache<u32> = ResultCache::open(&path, &MatchingConfig::default(), 30);
        cache.insert("key".to_string(), 1);
        cache.save().unwrap();

        let strict = MatchingConfig {
            similarity_threshold: 0.9,
            ..MatchingConfig::default()
        };
        let reopened: ResultCache<u32> = ResultCache::open(&path, &strict, 30);
        assert!(reopened.is_empty());
    }

    #[test]
    fn test_corrupt_file_is_ignored() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("results.json");
        std::fs::write(&path, "not json").unwrap();

        let mut cache: ResultCache<u32> = ResultCache::open(&path, &MatchingConfig::default(), 30);
        assert!(cache.is_empty());
        cache.insert("key".to_string(), 7);
        cache.save().unwrap();

        let mut reopened: ResultCache<u32> = ResultCache::open(&path, &MatchingConfig::default(), 30);
        assert_eq!(reopened.get("key"), Some(7));
    }
}
