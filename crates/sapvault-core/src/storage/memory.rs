#![allow(clippy::disallowed_types, reason = "Synchronous in-memory operations only")]

use std::sync::{Arc, Mutex, PoisonError};

use super::{ConfigStore, StorageError};
use crate::StoredSeedConfig;

/// In-memory configuration store for testing and single-process use
///
/// All state is wrapped in Arc<Mutex<>> so clones share one record. A
/// poisoned mutex is recovered rather than propagated: the record is only
/// ever replaced whole, so it cannot be observed half-written.
#[derive(Clone, Default)]
pub struct MemoryConfigStore {
    inner: Arc<Mutex<MemoryConfigStoreInner>>,
}

#[derive(Default)]
struct MemoryConfigStoreInner {
    /// Current configuration, if any rotation happened
    config: Option<StoredSeedConfig>,

    /// Number of successful writes
    writes: u64,
}

impl MemoryConfigStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful `store_config` calls.
    ///
    /// Useful for debugging and testing.
    pub fn write_count(&self) -> u64 {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).writes
    }
}

impl ConfigStore for MemoryConfigStore {
    fn load_config(&self) -> Result<Option<StoredSeedConfig>, StorageError> {
        Ok(self.inner.lock().unwrap_or_else(PoisonError::into_inner).config.clone())
    }

    fn store_config(&self, config: &StoredSeedConfig) -> Result<(), StorageError> {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.config = Some(config.clone());
        inner.writes += 1;
        Ok(())
    }
}
