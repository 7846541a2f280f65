//! Chaotic configuration store for fault injection testing
//!
//! Store wrapper that randomly fails operations to test that rotation and
//! encryption surface storage faults without corrupting cached state.

#![allow(clippy::disallowed_types, reason = "Locking simple RNG state")]

use std::sync::{
    Arc, Mutex, PoisonError,
    atomic::{AtomicUsize, Ordering},
};

use super::{ConfigStore, StorageError};
use crate::StoredSeedConfig;

/// Chaotic store wrapper that randomly injects failures
///
/// Delegates to an underlying store but fails operations based on a
/// configured failure rate. Uses Arc<Mutex<>> for the RNG state, making it
/// Clone and thread-safe.
#[derive(Clone)]
pub struct ChaoticConfigStore<S: ConfigStore> {
    inner: S,
    /// Failure rate (0.0 = never fail, 1.0 = always fail)
    failure_rate: f64,
    /// RNG state for deterministic chaos
    rng: Arc<Mutex<ChaoticRng>>,
    operation_count: Arc<AtomicUsize>,
}

/// Linear congruential generator; reproducible with the same seed.
struct ChaoticRng {
    state: u64,
}

impl ChaoticRng {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Next value in [0.0, 1.0)
    fn next(&mut self) -> f64 {
        // Numerical Recipes constants
        const A: u64 = 1_664_525;
        const C: u64 = 1_013_904_223;
        const M: u64 = 1u64 << 32;

        self.state = (A.wrapping_mul(self.state).wrapping_add(C)) % M;
        (self.state as f64) / (M as f64)
    }
}

impl<S: ConfigStore> ChaoticConfigStore<S> {
    /// Create a new chaotic wrapper with a fixed default seed
    ///
    /// # Panics
    ///
    /// Panics if `failure_rate` is not in [0.0, 1.0]
    pub fn new(inner: S, failure_rate: f64) -> Self {
        Self::with_seed(inner, failure_rate, 0x1234_5678_9ABC_DEF0)
    }

    /// Create with explicit seed for reproducible chaos
    ///
    /// # Panics
    ///
    /// Panics if `failure_rate` is not in [0.0, 1.0]
    pub fn with_seed(inner: S, failure_rate: f64, seed: u64) -> Self {
        assert!(
            (0.0..=1.0).contains(&failure_rate),
            "failure_rate must be between 0.0 and 1.0, got {failure_rate}"
        );

        Self {
            inner,
            failure_rate,
            rng: Arc::new(Mutex::new(ChaoticRng::new(seed))),
            operation_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Underlying store (for checking invariants after chaos).
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Total number of store operations attempted.
    pub fn operation_count(&self) -> usize {
        self.operation_count.load(Ordering::Relaxed)
    }

    fn inject(&self, operation: &str) -> Result<(), StorageError> {
        self.operation_count.fetch_add(1, Ordering::Relaxed);
        let roll = self.rng.lock().unwrap_or_else(PoisonError::into_inner).next();
        if roll < self.failure_rate {
            return Err(StorageError::Io(format!("chaos: injected {operation} failure")));
        }
        Ok(())
    }
}

impl<S: ConfigStore> ConfigStore for ChaoticConfigStore<S> {
    fn load_config(&self) -> Result<Option<StoredSeedConfig>, StorageError> {
        self.inject("load")?;
        self.inner.load_config()
    }

    fn store_config(&self, config: &StoredSeedConfig) -> Result<(), StorageError> {
        self.inject("store")?;
        self.inner.store_config(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryConfigStore;

    fn stored() -> StoredSeedConfig {
        StoredSeedConfig {
            seed: vec![7; 32],
            dimension: 4,
            scaling_factor: 1.0,
            approximation_factor: 1.0,
        }
    }

    #[test]
    fn test_zero_failure_rate_never_fails() {
        let store = ChaoticConfigStore::new(MemoryConfigStore::new(), 0.0);
        for _ in 0..100 {
            store.store_config(&stored()).unwrap();
            assert!(store.load_config().unwrap().is_some());
        }
        assert_eq!(store.operation_count(), 200);
    }

    #[test]
    fn test_full_failure_rate_always_fails() {
        let store = ChaoticConfigStore::new(MemoryConfigStore::new(), 1.0);

        assert!(matches!(store.store_config(&stored()), Err(StorageError::Io(_))));
        assert!(matches!(store.load_config(), Err(StorageError::Io(_))));
        assert_eq!(store.inner().load_config().unwrap(), None);
    }

    #[test]
    fn test_same_seed_same_failures() {
        let a = ChaoticConfigStore::with_seed(MemoryConfigStore::new(), 0.5, 42);
        let b = ChaoticConfigStore::with_seed(MemoryConfigStore::new(), 0.5, 42);

        let outcomes_a: Vec<bool> = (0..50).map(|_| a.load_config().is_ok()).collect();
        let outcomes_b: Vec<bool> = (0..50).map(|_| b.load_config().is_ok()).collect();
        assert_eq!(outcomes_a, outcomes_b);
    }

    #[test]
    #[should_panic(expected = "failure_rate must be between")]
    fn test_rejects_invalid_rate() {
        let _ = ChaoticConfigStore::new(MemoryConfigStore::new(), 1.5);
    }
}
