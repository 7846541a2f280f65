//! Entropy abstraction.
//!
//! Decouples key generation from the operating system so rotation and noise
//! keying can be driven by any source. Production uses [`OsEntropy`].

use crate::CryptoError;

/// Source of cryptographically secure random bytes.
///
/// # Invariants
///
/// - Production implementations MUST return OS-grade entropy
/// - Failure is reported, never papered over with weaker randomness
pub trait EntropySource: Send + Sync {
    /// Fills `buffer` with random bytes.
    fn fill_bytes(&self, buffer: &mut [u8]) -> Result<(), CryptoError>;
}

/// Operating system entropy via getrandom.
///
/// Provides OS-level cryptographic randomness (e.g. `getrandom(2)` or
/// /dev/urandom on Linux, `BCryptGenRandom` on Windows). Suitable for rotation
/// seeds and per-request noise keys.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsEntropy;

impl OsEntropy {
    /// Create a new OS entropy source.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl EntropySource for OsEntropy {
    fn fill_bytes(&self, buffer: &mut [u8]) -> Result<(), CryptoError> {
        getrandom::fill(buffer).map_err(|e| CryptoError::Entropy(e.to_string()))
    }
}

impl<E: EntropySource + ?Sized> EntropySource for &E {
    fn fill_bytes(&self, buffer: &mut [u8]) -> Result<(), CryptoError> {
        (**self).fill_bytes(buffer)
    }
}
