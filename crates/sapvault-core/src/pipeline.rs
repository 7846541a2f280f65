//! Scale-And-Perturb encryption: `C = s·Q·v + λ`.
//!
//! The pipeline validates the plaintext, rotates it with the cached matrix,
//! scales it, and adds noise drawn from the ball of radius `s·β/4`. All
//! intermediates live in pooled buffers that are scrubbed on release; only
//! the ciphertext leaves as a fresh allocation.
//!
//! Computational faults (a panic inside rotation or sampling) are caught at
//! this boundary and surface as [`CoreError::Internal`]. Plaintext values are
//! never logged.

use std::panic::{AssertUnwindSafe, catch_unwind};

use sapvault_crypto::{EntropySource, sample_noise_into};

use crate::{BufferPool, CacheEntry, CoreError};

/// Ceiling on the squared Euclidean norm of a plaintext.
pub const MAX_SQUARED_NORM: f64 = 1e12;

/// Check a plaintext against the configured dimension.
///
/// Checks run in order: length, finiteness, magnitude.
///
/// # Errors
///
/// - `DimensionMismatch`: `plaintext.len() != dimension`
/// - `NonFiniteCoordinate`: first NaN or infinite coordinate
/// - `NormTooLarge`: `‖v‖² > MAX_SQUARED_NORM`
pub fn validate_plaintext(plaintext: &[f64], dimension: usize) -> Result<(), CoreError> {
    if plaintext.len() != dimension {
        return Err(CoreError::DimensionMismatch { expected: dimension, actual: plaintext.len() });
    }
    if let Some(index) = plaintext.iter().position(|x| !x.is_finite()) {
        return Err(CoreError::NonFiniteCoordinate { index });
    }
    let squared_norm: f64 = plaintext.iter().map(|x| x * x).sum();
    if squared_norm > MAX_SQUARED_NORM {
        return Err(CoreError::NormTooLarge);
    }
    Ok(())
}

/// Encrypts plaintexts against a cached rotation.
///
/// Stateless apart from its buffer pool; share one per process.
#[derive(Debug, Default)]
pub struct EncryptionPipeline {
    pool: BufferPool,
}

impl EncryptionPipeline {
    /// Create a pipeline with a default-sized buffer pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a pipeline over an existing pool.
    pub fn with_pool(pool: BufferPool) -> Self {
        Self { pool }
    }

    /// Buffer pool backing this pipeline.
    pub fn pool(&self) -> &BufferPool {
        &self.pool
    }

    /// Encrypt `plaintext` under the rotation held by `entry`.
    ///
    /// Noise is drawn from a newly keyed stream, so repeated calls on the
    /// same plaintext produce different ciphertexts.
    ///
    /// # Errors
    ///
    /// - Input validation errors from [`validate_plaintext`]
    /// - `Noise`: noise sampling failed
    /// - `NonFiniteCiphertext`: a ciphertext coordinate overflowed
    /// - `Internal`: a computational fault was caught
    pub fn encrypt(
        &self,
        plaintext: &[f64],
        entry: &CacheEntry,
        entropy: &impl EntropySource,
    ) -> Result<Vec<f64>, CoreError> {
        validate_plaintext(plaintext, entry.config().dimension())?;

        match catch_unwind(AssertUnwindSafe(|| self.encrypt_validated(plaintext, entry, entropy))) {
            Ok(result) => result,
            Err(_) => {
                tracing::error!(
                    dimension = entry.config().dimension(),
                    "panic during encryption; request aborted"
                );
                Err(CoreError::Internal)
            },
        }
    }

    fn encrypt_validated(
        &self,
        plaintext: &[f64],
        entry: &CacheEntry,
        entropy: &impl EntropySource,
    ) -> Result<Vec<f64>, CoreError> {
        let config = entry.config();
        let dimension = config.dimension();
        let scaling_factor = config.scaling_factor();

        let mut input = self.pool.acquire(dimension);
        input.copy_from_slice(plaintext);

        // The copy is what gets rotated; re-check it rather than the caller's slice
        if let Some(index) = input.iter().position(|x| !x.is_finite()) {
            return Err(CoreError::NonFiniteCoordinate { index });
        }

        let mut rotated = self.pool.acquire(dimension);
        if let Err(e) = entry.matrix().rotate_into(&input, &mut rotated) {
            tracing::error!(
                dimension,
                error = %e,
                "cached matrix does not match its configuration"
            );
            return Err(CoreError::Internal);
        }

        let mut noise = self.pool.acquire(dimension);
        sample_noise_into(&mut noise, scaling_factor, config.approximation_factor(), entropy)
            .map_err(CoreError::Noise)?;

        let mut staging = self.pool.acquire(dimension);
        for (i, out) in staging.iter_mut().enumerate() {
            let value = scaling_factor * rotated[i] + noise[i];
            if !value.is_finite() {
                return Err(CoreError::NonFiniteCiphertext { index: i });
            }
            *out = value;
        }

        Ok(staging.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use sapvault_crypto::{CryptoError, OsEntropy, Seed};

    use super::*;
    use crate::{RotationParams, SeedConfig};

    fn entry(dimension: usize, scaling_factor: f64, approximation_factor: f64) -> CacheEntry {
        let params = RotationParams { dimension, scaling_factor, approximation_factor };
        let config = SeedConfig::new(Seed::from_bytes([0x42; 32]), params).unwrap();
        CacheEntry::derive(config).unwrap()
    }

    fn norm(v: &[f64]) -> f64 {
        v.iter().map(|x| x * x).sum::<f64>().sqrt()
    }

    struct FailingEntropy;

    impl EntropySource for FailingEntropy {
        fn fill_bytes(&self, _dest: &mut [u8]) -> Result<(), CryptoError> {
            Err(CryptoError::Entropy("unavailable".to_string()))
        }
    }

    struct PanickingEntropy;

    impl EntropySource for PanickingEntropy {
        fn fill_bytes(&self, _dest: &mut [u8]) -> Result<(), CryptoError> {
            panic!("entropy source exploded");
        }
    }

    #[test]
    fn validation_order() {
        assert_eq!(
            validate_plaintext(&[f64::NAN; 3], 4),
            Err(CoreError::DimensionMismatch { expected: 4, actual: 3 })
        );
        assert_eq!(
            validate_plaintext(&[1e7, f64::NAN, f64::INFINITY, 0.0], 4),
            Err(CoreError::NonFiniteCoordinate { index: 1 })
        );
        assert_eq!(validate_plaintext(&[1e6, 1.0, 0.0, 0.0], 4), Err(CoreError::NormTooLarge));
        assert_eq!(validate_plaintext(&[1e6, 0.0, 0.0, 0.0], 4), Ok(()));
    }

    #[test]
    fn squared_norm_overflow_is_too_large() {
        assert_eq!(validate_plaintext(&[1e200, 1e200], 2), Err(CoreError::NormTooLarge));
    }

    #[test]
    fn zero_noise_is_pure_rotation() {
        let entry = entry(4, 1.0, 0.0);
        let pipeline = EncryptionPipeline::new();

        let c = pipeline.encrypt(&[1.0, 0.0, 0.0, 0.0], &entry, &OsEntropy).unwrap();

        for (row, value) in c.iter().enumerate() {
            assert_eq!(*value, entry.matrix().get(row, 0).unwrap());
        }
    }

    #[test]
    fn scaling_factor_scales_norm() {
        let entry = entry(16, 3.0, 0.0);
        let pipeline = EncryptionPipeline::new();
        let v: Vec<f64> = (0..16_i32).map(f64::from).collect();

        let c = pipeline.encrypt(&v, &entry, &OsEntropy).unwrap();

        assert!((norm(&c) - 3.0 * norm(&v)).abs() < 1e-9 * norm(&v));
    }

    #[test]
    fn repeated_encryptions_differ_within_noise_bound() {
        let entry = entry(32, 2.0, 4.0);
        let pipeline = EncryptionPipeline::new();
        let v = vec![0.5; 32];

        let c1 = pipeline.encrypt(&v, &entry, &OsEntropy).unwrap();
        let c2 = pipeline.encrypt(&v, &entry, &OsEntropy).unwrap();

        assert_ne!(c1, c2);
        let gap: Vec<f64> = c1.iter().zip(&c2).map(|(a, b)| a - b).collect();
        assert!(norm(&gap) <= 2.0 * entry.config().params().noise_radius() + 1e-9);
    }

    #[test]
    fn zero_plaintext_stays_in_ball() {
        let entry = entry(128, 1.0, 5.0);
        let pipeline = EncryptionPipeline::new();

        let c = pipeline.encrypt(&[0.0; 128], &entry, &OsEntropy).unwrap();

        assert_eq!(c.len(), 128);
        assert!(norm(&c) <= 1.25 + 1e-12);
    }

    #[test]
    fn entropy_failure_is_noise_error() {
        let entry = entry(4, 1.0, 1.0);
        let pipeline = EncryptionPipeline::new();

        let err = pipeline.encrypt(&[1.0; 4], &entry, &FailingEntropy).unwrap_err();
        assert!(matches!(err, CoreError::Noise(CryptoError::Entropy(_))));
    }

    #[test]
    fn panic_is_contained_and_buffers_returned() {
        let entry = entry(4, 1.0, 1.0);
        let pipeline = EncryptionPipeline::new();

        let err = pipeline.encrypt(&[1.0; 4], &entry, &PanickingEntropy).unwrap_err();
        assert_eq!(err, CoreError::Internal);
        assert_eq!(pipeline.pool().idle(), 3);

        // Pipeline stays usable afterwards
        assert!(pipeline.encrypt(&[1.0; 4], &entry, &OsEntropy).is_ok());
    }

    #[test]
    fn overflowing_ciphertext_is_rejected() {
        let entry = entry(2, f64::MAX, 0.0);
        let pipeline = EncryptionPipeline::new();

        let err = pipeline.encrypt(&[1e5, 1e5], &entry, &OsEntropy).unwrap_err();
        assert!(matches!(err, CoreError::NonFiniteCiphertext { .. }));
    }

    #[test]
    fn invalid_input_touches_no_buffers() {
        let entry = entry(4, 1.0, 1.0);
        let pipeline = EncryptionPipeline::new();

        assert!(pipeline.encrypt(&[1.0; 3], &entry, &OsEntropy).is_err());
        assert_eq!(pipeline.pool().idle(), 0);
    }
}
