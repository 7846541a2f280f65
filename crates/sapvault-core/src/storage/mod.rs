//! Configuration store abstraction
//!
//! Trait-based abstraction for persisting the rotation configuration. The
//! trait is synchronous (no async) to keep the engine free of any runtime.
//! The store is the single source of truth; the engine never caches a read
//! beyond the [`crate::MatrixCache`] entry derived from it.

mod chaotic;
mod error;
mod memory;
mod redb;

pub use chaotic::ChaoticConfigStore;
pub use error::StorageError;
pub use memory::MemoryConfigStore;

pub use self::redb::RedbConfigStore;
use crate::StoredSeedConfig;

/// Key under which the rotation configuration is persisted.
///
/// Invalidation signals naming this key flush the matrix cache.
pub const CONFIG_STORAGE_KEY: &str = "config/seed";

/// Storage abstraction for the rotation configuration
///
/// Must be Clone (shared between the backend and operators), Send + Sync
/// (thread-safe), and synchronous. Implementations typically share internal
/// state via Arc, so clones access the same underlying storage. Reads must be
/// strongly consistent within a single process.
pub trait ConfigStore: Clone + Send + Sync + 'static {
    /// Load the current configuration.
    ///
    /// Returns `None` if no rotation has ever been written.
    fn load_config(&self) -> Result<Option<StoredSeedConfig>, StorageError>;

    /// Persist a configuration, replacing any previous one.
    ///
    /// # Invariants
    ///
    /// - Post: a subsequent `load_config` returns exactly `config`
    fn store_config(&self, config: &StoredSeedConfig) -> Result<(), StorageError>;
}
