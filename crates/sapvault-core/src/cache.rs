//! Shared cache of the derived rotation matrix.
//!
//! Derivation costs `O(N³)`, so the matrix is computed once per rotation and
//! shared by every encryption. Readers take the read lock only long enough
//! to clone an `Arc`; rotation work happens with no lock held.
//!
//! # Concurrency
//!
//! Double-checked locking: a miss under the read lock escalates to the write
//! lock and re-checks before deriving, so concurrent cold readers trigger a
//! single derivation. [`MatrixCache::invalidate`] is safe to race with
//! readers: in-flight requests keep the entry they already cloned and finish
//! with the old rotation.

use std::{
    panic::{AssertUnwindSafe, catch_unwind},
    sync::{
        Arc, PoisonError, RwLock,
        atomic::{AtomicU64, Ordering},
    },
    time::Instant,
};

use sapvault_crypto::{OrthogonalMatrix, generate_orthogonal_matrix};
use zeroize::Zeroize;

use crate::{CoreError, SeedConfig, storage::ConfigStore};

/// Dimensions above this log a slow-derivation warning.
pub const LARGE_DIMENSION_WARNING: usize = 2048;

/// A derived rotation paired with the configuration it came from.
#[derive(Debug)]
pub struct CacheEntry {
    matrix: OrthogonalMatrix,
    config: SeedConfig,
}

impl CacheEntry {
    /// Derive the rotation matrix for `config`.
    pub fn derive(config: SeedConfig) -> Result<Self, CoreError> {
        let matrix = generate_orthogonal_matrix(config.seed().as_bytes(), config.dimension())
            .map_err(CoreError::Derivation)?;
        Ok(Self { matrix, config })
    }

    /// Secret rotation `Q`.
    pub fn matrix(&self) -> &OrthogonalMatrix {
        &self.matrix
    }

    /// Configuration the matrix was derived from.
    pub fn config(&self) -> &SeedConfig {
        &self.config
    }
}

/// Process-wide matrix cache.
///
/// Holds at most one entry. Poisoned locks are recovered: the slot is only
/// ever replaced whole, so a panic elsewhere cannot leave it half-written.
#[derive(Debug, Default)]
pub struct MatrixCache {
    slot: RwLock<Option<Arc<CacheEntry>>>,
    derivations: AtomicU64,
}

impl MatrixCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached entry, deriving it from `store` on a miss.
    ///
    /// # Errors
    ///
    /// - `NotConfigured`: the store holds no configuration
    /// - `Storage`: the store failed; the cache stays empty
    /// - `SeedDecode` / `CorruptConfig`: the stored record is malformed
    /// - `Derivation`: the matrix failed its orthogonality check
    /// - `Internal`: loading or derivation panicked; the cache stays empty
    pub fn get_matrix_and_config(
        &self,
        store: &impl ConfigStore,
    ) -> Result<Arc<CacheEntry>, CoreError> {
        if let Some(entry) = self.cached() {
            return Ok(entry);
        }

        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);

        // Another caller may have derived while we waited for the write lock
        if let Some(entry) = slot.as_ref() {
            return Ok(Arc::clone(entry));
        }

        let entry = match catch_unwind(AssertUnwindSafe(|| Self::load_and_derive(store))) {
            Ok(result) => Arc::new(result?),
            Err(_) => {
                tracing::error!("panic while filling matrix cache; request aborted");
                return Err(CoreError::Internal);
            },
        };
        self.derivations.fetch_add(1, Ordering::Relaxed);

        *slot = Some(Arc::clone(&entry));
        Ok(entry)
    }

    fn load_and_derive(store: &impl ConfigStore) -> Result<CacheEntry, CoreError> {
        let stored = store.load_config()?.ok_or(CoreError::NotConfigured)?;
        let config = SeedConfig::decode(&stored)?;
        let dimension = config.dimension();

        if dimension > LARGE_DIMENSION_WARNING {
            tracing::warn!(dimension, "deriving rotation matrix for large dimension");
        }

        let started = Instant::now();
        let entry = CacheEntry::derive(config).inspect_err(|e| {
            tracing::error!(dimension, error = %e, "rotation matrix derivation failed");
        })?;

        tracing::info!(
            dimension,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "derived rotation matrix"
        );
        Ok(entry)
    }

    /// Current entry without deriving.
    pub fn cached(&self) -> Option<Arc<CacheEntry>> {
        self.slot.read().unwrap_or_else(PoisonError::into_inner).as_ref().map(Arc::clone)
    }

    /// Drop the cached entry.
    ///
    /// The matrix is zeroized now if no reader holds it, or when the last
    /// in-flight reader releases it. The next read re-derives from the store.
    pub fn invalidate(&self) {
        let taken = self.slot.write().unwrap_or_else(PoisonError::into_inner).take();

        let Some(entry) = taken else {
            return;
        };
        let dimension = entry.config.dimension();
        match Arc::try_unwrap(entry) {
            Ok(mut entry) => entry.matrix.zeroize(),
            Err(_shared) => {
                tracing::debug!(dimension, "invalidated matrix still held by in-flight requests");
            },
        }
        tracing::info!(dimension, "matrix cache invalidated");
    }

    /// Whether an entry is currently cached.
    pub fn is_populated(&self) -> bool {
        self.slot.read().unwrap_or_else(PoisonError::into_inner).is_some()
    }

    /// Number of successful derivations since construction.
    pub fn derivation_count(&self) -> u64 {
        self.derivations.load(Ordering::Relaxed)
    }
}
