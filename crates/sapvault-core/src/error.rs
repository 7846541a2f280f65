//! Engine error types.
//!
//! Follows the taxonomy clients and operators need to tell apart:
//! - Configuration errors: invalid parameters, missing configuration
//! - Input validation errors: dimension, finiteness, magnitude
//! - Cryptographic faults: seed decoding, derivation, noise sampling
//! - Resource faults: storage failures, caught panics

use sapvault_crypto::CryptoError;
use thiserror::Error;

use crate::storage::StorageError;

/// Errors from configuration, caching and encryption
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    /// No configuration has been written yet
    #[error("seed not configured - rotate the configuration first")]
    NotConfigured,

    /// A rotation parameter is out of range
    #[error("invalid {field}: {reason}")]
    InvalidParameter {
        /// Parameter name as exposed to callers
        field: &'static str,
        /// What was wrong with it
        reason: String,
    },

    /// Plaintext length differs from the configured dimension
    #[error("vector dimension {actual} does not match configured dimension {expected}")]
    DimensionMismatch {
        /// Configured dimension
        expected: usize,
        /// Supplied vector length
        actual: usize,
    },

    /// Plaintext coordinate is NaN or infinite
    #[error("vector element {index} is invalid (NaN or Inf)")]
    NonFiniteCoordinate {
        /// Index of the first offending coordinate
        index: usize,
    },

    /// Squared norm of the plaintext exceeds the ceiling
    #[error("vector magnitude too large")]
    NormTooLarge,

    /// A ciphertext coordinate overflowed
    #[error("encryption resulted in invalid value at index {index}")]
    NonFiniteCiphertext {
        /// Index of the first offending coordinate
        index: usize,
    },

    /// Entropy source failed while generating a rotation seed
    #[error("generate seed: {0}")]
    SeedGeneration(CryptoError),

    /// Persisted seed could not be decoded
    #[error("decode seed: {0}")]
    SeedDecode(CryptoError),

    /// Persisted parameters fail validation
    #[error("stored configuration is corrupt: {0}")]
    CorruptConfig(String),

    /// Matrix derivation or its orthogonality check failed
    #[error("matrix derivation failed: {0}")]
    Derivation(CryptoError),

    /// Noise sampling failed (zero-norm direction, entropy failure)
    #[error("noise sampling failed: {0}")]
    Noise(CryptoError),

    /// Configuration store failed
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Unexpected computational fault, caught at the pipeline boundary
    #[error("internal error")]
    Internal,
}

impl CoreError {
    /// Returns true if the caller can fix this by changing the request or
    /// configuring the engine.
    ///
    /// Client errors are surfaced as-is and never retried automatically.
    /// Everything else is an internal fault: log the detail, return an opaque
    /// error, and let a later request retry.
    pub fn is_client_error(&self) -> bool {
        match self {
            Self::NotConfigured
            | Self::InvalidParameter { .. }
            | Self::DimensionMismatch { .. }
            | Self::NonFiniteCoordinate { .. }
            | Self::NormTooLarge => true,

            Self::NonFiniteCiphertext { .. }
            | Self::SeedGeneration(_)
            | Self::SeedDecode(_)
            | Self::CorruptConfig(_)
            | Self::Derivation(_)
            | Self::Noise(_)
            | Self::Storage(_)
            | Self::Internal => false,
        }
    }
}
