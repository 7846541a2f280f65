//! Error types for cryptographic operations

use thiserror::Error;

/// Errors from seed handling, matrix derivation and noise sampling
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CryptoError {
    /// Dimension is zero or above the hard ceiling
    #[error("dimension {dimension} outside allowed range 1..={max}")]
    InvalidDimension {
        /// Requested dimension
        dimension: usize,
        /// Largest accepted dimension
        max: usize,
    },

    /// Seed material is not exactly 256 bits
    #[error("invalid seed length: expected {expected} bytes, got {actual}")]
    InvalidSeedLength {
        /// Required seed length in bytes
        expected: usize,
        /// Length that was supplied
        actual: usize,
    },

    /// Matrix handed to the orthogonality check is not square
    #[error("matrix is not square: {rows}x{cols}")]
    NotSquare {
        /// Row count
        rows: usize,
        /// Column count
        cols: usize,
    },

    /// `Qᵗ·Q` deviates from the identity beyond tolerance
    #[error("orthogonality check failed at ({row}, {col}): deviation {deviation:e}")]
    NotOrthogonal {
        /// Row of the first violating entry
        row: usize,
        /// Column of the first violating entry
        col: usize,
        /// Absolute deviation from the Kronecker delta
        deviation: f64,
    },

    /// Vector length does not match the matrix dimension
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Matrix dimension
        expected: usize,
        /// Supplied vector length
        actual: usize,
    },

    /// Scaling or approximation factor unusable for noise sampling
    #[error(
        "invalid noise parameters: scaling factor {scaling_factor}, \
         approximation factor {approximation_factor}"
    )]
    InvalidNoiseParameters {
        /// Scaling factor `s`
        scaling_factor: f64,
        /// Approximation factor `β`
        approximation_factor: f64,
    },

    /// The sampled Gaussian direction had zero norm
    #[error("generated normal vector has zero norm")]
    ZeroNormDirection,

    /// The operating system entropy source failed
    #[error("entropy source failure: {0}")]
    Entropy(String),
}

impl CryptoError {
    /// Returns true if this error stems from caller-supplied input.
    ///
    /// Everything else is an internal fault: a broken invariant during
    /// derivation or an unavailable entropy source.
    pub fn is_input_error(&self) -> bool {
        match self {
            Self::InvalidDimension { .. }
            | Self::InvalidSeedLength { .. }
            | Self::DimensionMismatch { .. }
            | Self::InvalidNoiseParameters { .. } => true,

            Self::NotSquare { .. }
            | Self::NotOrthogonal { .. }
            | Self::ZeroNormDirection
            | Self::Entropy(_) => false,
        }
    }
}
