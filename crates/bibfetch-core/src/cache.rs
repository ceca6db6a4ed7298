//! Process-lifetime memoization of parsed reference lists and rendered
//! bibliographies, keyed by document path.
//!
//! The cache has no expiry and no partial eviction: entries live until
//! [`clear()`](DocumentCache::clear) wipes everything. Builders are
//! fallible; a builder error propagates to the caller and nothing is
//! stored, so a failed document can be retried later.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;

use crate::Reference;

#[derive(Debug, Default)]
pub struct DocumentCache {
    refs: DashMap<PathBuf, Arc<Vec<Reference>>>,
    bibs: DashMap<PathBuf, Arc<String>>,
}

impl DocumentCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached reference list for `path`, or run `build` and store its
    /// output.
    pub fn refs_or_build<E>(
        &self,
        path: &Path,
        build: impl FnOnce() -> Result<Vec<Reference>, E>,
    ) -> Result<Arc<Vec<Reference>>, E> {
        if let Some(cached) = self.refs.get(path) {
            tracing::debug!(path = %path.display(), "reference list cache hit");
            return Ok(Arc::clone(cached.value()));
        }
        let built = Arc::new(build()?);
        self.refs.insert(path.to_path_buf(), Arc::clone(&built));
        Ok(built)
    }

    /// Cached rendered bibliography for `path`, or await `build` and store
    /// its output.
    pub async fn bib_or_build<F, E>(&self, path: &Path, build: F) -> Result<Arc<String>, E>
    where
        F: Future<Output = Result<String, E>>,
    {
        if let Some(cached) = self.bibs.get(path) {
            tracing::debug!(path = %path.display(), "bibliography cache hit");
            return Ok(Arc::clone(cached.value()));
        }
        let built = Arc::new(build.await?);
        self.bibs.insert(path.to_path_buf(), Arc::clone(&built));
        Ok(built)
    }

    /// Wipe all cached reference lists and bibliographies unconditionally.
    pub fn clear(&self) {
        self.refs.clear();
        self.bibs.clear();
        tracing::debug!("document cache cleared");
    }
}
