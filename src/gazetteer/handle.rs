use std::sync::{Arc, PoisonError, RwLock};

use tracing::info;

use super::loader::GazetteerLoader;
use super::store::{GazetteerError, ReferenceIndex};

/// Shared, lazily loaded gazetteer.
///
/// Readers take an `Arc` snapshot and keep it for as long as they need;
/// [`GazetteerHandle::refresh`] builds a new index off to the side and
/// swaps it in, so in-flight searches never observe a half-built index.
#[derive(Debug)]
pub struct GazetteerHandle {
    loader: GazetteerLoader,
    current: RwLock<Option<Arc<ReferenceIndex>>>,
}

impl GazetteerHandle {
    /// Handle that loads nothing until first use
    pub fn new(loader: GazetteerLoader) -> Self {
        Self {
            loader,
            current: RwLock::new(None),
        }
    }

    /// Handle with an index installed up front
    pub fn with_index(loader: GazetteerLoader, index: ReferenceIndex) -> Self {
        Self {
            loader,
            current: RwLock::new(Some(Arc::new(index))),
        }
    }

    #[must_use]
    pub fn loader(&self) -> &GazetteerLoader {
        &self.loader
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Current index, loading it (snapshot first) on first call
    ///
    /// # Errors
    ///
    /// Returns an error if the first load fails. Later calls retry.
    pub fn snapshot(&self) -> Result<Arc<ReferenceIndex>, GazetteerError> {
        if let Some(index) = self
            .current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            return Ok(Arc::clone(index));
        }

        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        // Another caller may have finished loading while we waited
        if let Some(index) = current.as_ref() {
            return Ok(Arc::clone(index));
        }

        let outcome = self.loader.load(false)?;
        info!("Gazetteer ready from {}", outcome.origin);
        let index = Arc::new(outcome.index);
        *current = Some(Arc::clone(&index));
        Ok(index)
    }

    /// Re-parse the source, ignoring the snapshot, and swap the result in
    ///
    /// # Errors
    ///
    /// Returns an error if the reload fails; the previous index stays installed.
    pub fn refresh(&self) -> Result<Arc<ReferenceIndex>, GazetteerError> {
        let outcome = self.loader.load(true)?;
        info!("Gazetteer refreshed from {}", outcome.origin);
        Ok(self.install(outcome.index))
    }

    /// Replace the current index, returning the new one
    pub fn install(&self, index: ReferenceIndex) -> Arc<ReferenceIndex> {
        let index = Arc::new(index);
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::clone(&index));
        index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::record::{RecordFields, ReferenceRecord};
    use tempfile::TempDir;

    fn index_of(city: &str) -> ReferenceIndex {
        ReferenceIndex::from_records(vec![ReferenceRecord::new(RecordFields {
            city: city.to_string(),
            ..RecordFields::default()
        })])
    }

    #[test]
    fn test_install_swaps_but_readers_keep_old_index() {
        let handle = GazetteerHandle::with_index(GazetteerLoader::new("unused.csv"), index_of("м. Київ"));
        let before = handle.snapshot().unwrap();

        handle.install(index_of("м. Львів"));
        let after = handle.snapshot().unwrap();

        assert_eq!(before.records()[0].city, "м. Київ");
        assert_eq!(after.records()[0].city, "м. Львів");
    }

    #[test]
    fn test_lazy_load_from_source() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("gazetteer.csv");
        std::fs::write(&source, "Область;Населений пункт\nКиївська область;м. Київ\n").unwrap();

        let handle = GazetteerHandle::new(GazetteerLoader::new(&source));
        assert!(!handle.is_loaded());

        let index = handle.snapshot().unwrap();
        assert!(handle.is_loaded());
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_failed_refresh_keeps_previous_index() {
        let dir = TempDir::new().unwrap();
        let loader = GazetteerLoader::new(dir.path().join("missing.csv"));
        let handle = GazetteerHandle::with_index(loader, index_of("м. Київ"));

        assert!(handle.refresh().is_err());
        assert_eq!(handle.snapshot().unwrap().records()[0].city, "м. Київ");
    }
}
