//! Rotation configuration.
//!
//! A [`SeedConfig`] is created by a rotation and never mutated: the next
//! rotation supersedes it. The engine only ever holds read-only copies; the
//! configuration store owns the persisted [`StoredSeedConfig`].

use std::fmt;

use sapvault_crypto::{EntropySource, MAX_DIMENSION, Seed, noise_radius};
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::CoreError;

/// Default vector dimension (OpenAI text-embedding-3-small).
pub const DEFAULT_DIMENSION: usize = 1536;

/// Default scaling factor `s`.
pub const DEFAULT_SCALING_FACTOR: f64 = 1.0;

/// Default approximation factor `β`.
pub const DEFAULT_APPROXIMATION_FACTOR: f64 = 5.0;

/// Matrix size above which rotations carry a memory warning.
///
/// 1536² × 8 bytes is about 18 MB; 4096² × 8 bytes is about 128 MB.
pub const MEMORY_WARNING_THRESHOLD: u64 = 100 * 1024 * 1024;

/// Bytes needed for an `N×N` matrix of `f64`.
pub fn estimated_matrix_bytes(dimension: usize) -> u64 {
    let n = dimension as u64;
    n.saturating_mul(n).saturating_mul(8)
}

/// Public Scale-And-Perturb parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RotationParams {
    /// Vector dimension `N`, in `1..=8192`
    pub dimension: usize,
    /// Scaling factor `s`, strictly positive
    pub scaling_factor: f64,
    /// Approximation factor `β`, non-negative
    pub approximation_factor: f64,
}

impl Default for RotationParams {
    fn default() -> Self {
        Self {
            dimension: DEFAULT_DIMENSION,
            scaling_factor: DEFAULT_SCALING_FACTOR,
            approximation_factor: DEFAULT_APPROXIMATION_FACTOR,
        }
    }
}

impl RotationParams {
    /// Build and validate parameters from caller-supplied values.
    ///
    /// `dimension` is signed so negative requests are rejected rather than
    /// wrapped.
    pub fn new(
        dimension: i64,
        scaling_factor: f64,
        approximation_factor: f64,
    ) -> Result<Self, CoreError> {
        if dimension <= 0 {
            return Err(CoreError::InvalidParameter {
                field: "dimension",
                reason: format!("must be positive (got {dimension})"),
            });
        }
        let dimension = usize::try_from(dimension).map_err(|_| CoreError::InvalidParameter {
            field: "dimension",
            reason: format!("exceeds maximum allowed {MAX_DIMENSION}"),
        })?;

        let params = Self { dimension, scaling_factor, approximation_factor };
        params.validate()?;
        Ok(params)
    }

    /// Check every parameter against its allowed range.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.dimension == 0 {
            return Err(CoreError::InvalidParameter {
                field: "dimension",
                reason: "must be positive (got 0)".to_string(),
            });
        }
        if self.dimension > MAX_DIMENSION {
            return Err(CoreError::InvalidParameter {
                field: "dimension",
                reason: format!("{} exceeds maximum allowed {MAX_DIMENSION}", self.dimension),
            });
        }
        if !self.scaling_factor.is_finite() || self.scaling_factor <= 0.0 {
            return Err(CoreError::InvalidParameter {
                field: "scaling_factor",
                reason: format!("must be positive (got {})", self.scaling_factor),
            });
        }
        if !self.approximation_factor.is_finite() || self.approximation_factor < 0.0 {
            return Err(CoreError::InvalidParameter {
                field: "approximation_factor",
                reason: format!("must be non-negative (got {})", self.approximation_factor),
            });
        }
        if !self.noise_radius().is_finite() {
            return Err(CoreError::InvalidParameter {
                field: "approximation_factor",
                reason: format!(
                    "noise radius s·β/4 overflows (s = {}, β = {})",
                    self.scaling_factor, self.approximation_factor
                ),
            });
        }
        Ok(())
    }

    /// Estimated matrix memory in bytes.
    pub fn estimated_matrix_bytes(&self) -> u64 {
        estimated_matrix_bytes(self.dimension)
    }

    /// Warning text when the derived matrix would exceed
    /// [`MEMORY_WARNING_THRESHOLD`].
    pub fn memory_warning(&self) -> Option<String> {
        let bytes = self.estimated_matrix_bytes();
        (bytes > MEMORY_WARNING_THRESHOLD).then(|| {
            format!(
                "Dimension {} requires approx {} MB of memory for the matrix.",
                self.dimension,
                bytes / 1024 / 1024
            )
        })
    }

    /// Radius of the noise ball, `s·β/4`.
    pub fn noise_radius(&self) -> f64 {
        noise_radius(self.scaling_factor, self.approximation_factor)
    }
}

/// An immutable rotation: secret seed plus public parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct SeedConfig {
    seed: Seed,
    params: RotationParams,
}

impl SeedConfig {
    /// Pair a seed with validated parameters.
    pub fn new(seed: Seed, params: RotationParams) -> Result<Self, CoreError> {
        params.validate()?;
        Ok(Self { seed, params })
    }

    /// Create a new rotation with a freshly generated seed.
    pub fn rotate(params: RotationParams, entropy: &impl EntropySource) -> Result<Self, CoreError> {
        params.validate()?;
        let seed = Seed::generate(entropy).map_err(CoreError::SeedGeneration)?;
        Ok(Self { seed, params })
    }

    /// Decode a persisted record.
    ///
    /// # Errors
    ///
    /// - `SeedDecode`: the stored seed is not 32 bytes
    /// - `CorruptConfig`: stored parameters fail validation
    pub fn decode(stored: &StoredSeedConfig) -> Result<Self, CoreError> {
        let seed = Seed::from_slice(&stored.seed).map_err(CoreError::SeedDecode)?;

        let dimension = usize::try_from(stored.dimension)
            .map_err(|_| CoreError::CorruptConfig(format!("dimension {}", stored.dimension)))?;
        let params = RotationParams {
            dimension,
            scaling_factor: stored.scaling_factor,
            approximation_factor: stored.approximation_factor,
        };
        params.validate().map_err(|e| CoreError::CorruptConfig(e.to_string()))?;

        Ok(Self { seed, params })
    }

    /// Persisted form of this configuration.
    pub fn to_stored(&self) -> StoredSeedConfig {
        StoredSeedConfig {
            seed: self.seed.as_bytes().to_vec(),
            dimension: self.params.dimension as u64,
            scaling_factor: self.params.scaling_factor,
            approximation_factor: self.params.approximation_factor,
        }
    }

    /// Secret rotation seed.
    pub fn seed(&self) -> &Seed {
        &self.seed
    }

    /// Public parameters.
    pub fn params(&self) -> &RotationParams {
        &self.params
    }

    /// Vector dimension `N`.
    pub fn dimension(&self) -> usize {
        self.params.dimension
    }

    /// Scaling factor `s`.
    pub fn scaling_factor(&self) -> f64 {
        self.params.scaling_factor
    }

    /// Approximation factor `β`.
    pub fn approximation_factor(&self) -> f64 {
        self.params.approximation_factor
    }
}

/// Persisted configuration record.
///
/// Seed bytes are zeroized on drop and redacted from `Debug`.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredSeedConfig {
    /// Raw seed bytes; 32 for a well-formed record
    pub seed: Vec<u8>,
    /// Vector dimension
    pub dimension: u64,
    /// Scaling factor `s`
    pub scaling_factor: f64,
    /// Approximation factor `β`
    pub approximation_factor: f64,
}

impl fmt::Debug for StoredSeedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoredSeedConfig")
            .field("seed", &"<redacted>")
            .field("dimension", &self.dimension)
            .field("scaling_factor", &self.scaling_factor)
            .field("approximation_factor", &self.approximation_factor)
            .finish()
    }
}

impl Drop for StoredSeedConfig {
    fn drop(&mut self) {
        self.seed.zeroize();
    }
}
