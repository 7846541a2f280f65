//! Sapvault engine.
//!
//! Stateful half of the Scale-And-Perturb construction: rotation
//! configuration, its persistence, the shared matrix cache, scratch buffers
//! and the encryption pipeline. The math lives in [`sapvault_crypto`]; this
//! crate decides when it runs and who shares the result.
//!
//! # Components
//!
//! - [`SeedConfig`]: immutable rotation (seed + public parameters)
//! - [`ConfigStore`]: persistence trait with memory, Redb and chaotic impls
//! - [`MatrixCache`]: derive-once, share-many cache of the rotation matrix
//! - [`BufferPool`]: scrub-on-release scratch vectors
//! - [`EncryptionPipeline`]: `C = s·Q·v + λ` with panic containment
//!
//! # Request Flow
//!
//! ```text
//! plaintext ──► validate_plaintext
//!                   │
//!                   ▼
//! MatrixCache ──► Arc<CacheEntry> (Q, SeedConfig)
//!                   │
//!                   ▼
//! EncryptionPipeline (pooled buffers) ──► ciphertext
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod buffer;
mod cache;
pub mod config;
mod error;
mod pipeline;
pub mod storage;

pub use buffer::{BufferPool, DEFAULT_MAX_RETAINED, PooledBuffer};
pub use cache::{CacheEntry, LARGE_DIMENSION_WARNING, MatrixCache};
pub use config::{RotationParams, SeedConfig, StoredSeedConfig};
pub use error::CoreError;
pub use pipeline::{EncryptionPipeline, MAX_SQUARED_NORM, validate_plaintext};
pub use storage::{
    CONFIG_STORAGE_KEY, ChaoticConfigStore, ConfigStore, MemoryConfigStore, RedbConfigStore,
    StorageError,
};
