//! Live index holder with load-or-build and atomic rebuild
//!
//! The store owns the path of the persisted index and the currently installed
//! [`InvertedIndex`]. Readers take a cheap `Arc` snapshot; a rebuild constructs
//! a new index, persists it (write-then-rename), then swaps the pointer under a
//! single-writer lock. Searches already running finish on the old snapshot.

use crate::index::InvertedIndex;
use crate::index_file::{load_index, write_index};
use crate::normalizer::Normalizer;
use crate::scorer::Bm25Params;
use cascade_core::{CascadeError, CascadeResult, Document, IndexConfig};
use parking_lot::{Mutex, RwLock};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Holder of the live lexical index for one configured path.
pub struct IndexStore {
    /// Location of the persisted index
    path: PathBuf,
    /// Normalizer used for (re)builds
    normalizer: Normalizer,
    /// Scoring constants used for (re)builds
    params: Bm25Params,
    /// Installed index, if any
    current: RwLock<Option<Arc<InvertedIndex>>>,
    /// Serializes rebuilds so only one writer touches the file at a time
    rebuild_lock: Mutex<()>,
}

impl IndexStore {
    /// Create a store with nothing installed, without touching the disk.
    ///
    /// Used when the persisted file is about to be replaced regardless of its
    /// contents; see [`open`](Self::open) to load it.
    pub fn new(config: &IndexConfig) -> Self {
        IndexStore {
            path: config.path.clone(),
            normalizer: Normalizer::new(config.language),
            params: Bm25Params::from(config),
            current: RwLock::new(None),
            rebuild_lock: Mutex::new(()),
        }
    }

    /// Open the store, loading the persisted index if one exists.
    ///
    /// A missing or empty file leaves the store without an index; searches then
    /// fail with `IndexUnavailable` until [`rebuild`](Self::rebuild) runs.
    ///
    /// # Errors
    ///
    /// `Persistence` if the file exists but cannot be read or decoded, `Config`
    /// if it was built with a different analyzer language than configured.
    pub fn open(config: &IndexConfig) -> CascadeResult<Self> {
        let store = Self::new(config);
        if let Some(index) = store.load()? {
            *store.current.write() = Some(Arc::new(index));
        }
        Ok(store)
    }

    /// Load the persisted index, or build from `corpus` and persist it.
    ///
    /// `corpus` is only invoked when no usable index file exists.
    pub fn load_or_build<F>(config: &IndexConfig, corpus: F) -> CascadeResult<Self>
    where
        F: FnOnce() -> CascadeResult<Vec<Document>>,
    {
        let store = Self::open(config)?;
        if store.is_ready() {
            return Ok(store);
        }
        tracing::info!(
            target: "cascade::store",
            path = %store.path.display(),
            "No persisted index, building from corpus"
        );
        store.rebuild(corpus()?)?;
        Ok(store)
    }

    fn load(&self) -> CascadeResult<Option<InvertedIndex>> {
        let loaded =
            load_index(&self.path).map_err(|e| CascadeError::persistence(&self.path, e))?;
        let Some(mut index) = loaded else {
            return Ok(None);
        };
        if index.language() != self.normalizer.language() {
            return Err(CascadeError::config(format!(
                "index at '{}' was built for {:?} but the configured language is {:?}; rebuild the index",
                self.path.display(),
                index.language(),
                self.normalizer.language()
            )));
        }
        // Postings do not depend on k1/b, so configured constants take over.
        if index.params() != self.params {
            tracing::warn!(
                target: "cascade::store",
                path = %self.path.display(),
                persisted_k1 = index.params().k1,
                persisted_b = index.params().b,
                k1 = self.params.k1,
                b = self.params.b,
                "Persisted BM25 parameters differ from config; using config"
            );
            index.params = self.params;
        }
        tracing::info!(
            target: "cascade::store",
            path = %self.path.display(),
            documents = index.total_docs(),
            "Loaded persisted index"
        );
        Ok(Some(index))
    }

    /// Build a new index from `documents`, persist it, then swap it in.
    ///
    /// The live index is untouched if persisting fails. An empty corpus still
    /// produces (and installs) a valid empty index.
    pub fn rebuild(&self, documents: Vec<Document>) -> CascadeResult<Arc<InvertedIndex>> {
        let _writer = self.rebuild_lock.lock();

        if documents.is_empty() {
            tracing::warn!(target: "cascade::store", "{}", CascadeError::EmptyCorpus);
        }

        let index = Arc::new(InvertedIndex::build(documents, &self.normalizer, self.params));
        write_index(&self.path, &index).map_err(|e| {
            tracing::warn!(
                target: "cascade::store",
                path = %self.path.display(),
                error = %e,
                "Failed to persist rebuilt index"
            );
            CascadeError::persistence(&self.path, e)
        })?;

        *self.current.write() = Some(Arc::clone(&index));
        Ok(index)
    }

    /// Snapshot of the installed index.
    ///
    /// # Errors
    ///
    /// `IndexUnavailable` if nothing has been built or loaded.
    pub fn current(&self) -> CascadeResult<Arc<InvertedIndex>> {
        self.current
            .read()
            .as_ref()
            .map(Arc::clone)
            .ok_or(CascadeError::IndexUnavailable)
    }

    /// True once an index is installed
    pub fn is_ready(&self) -> bool {
        self.current.read().is_some()
    }

    /// Location of the persisted index
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Normalizer matching the installed index
    pub fn normalizer(&self) -> Normalizer {
        self.normalizer
    }
}

// ============================================================================
// Tests
// ============================================================================
