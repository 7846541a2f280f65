//! Sapvault Cryptographic Primitives
//!
//! Building blocks for approximate distance-comparison-preserving encryption
//! with the Scale-And-Perturb construction `C = s·Q·v + λ`. Pure functions
//! with no I/O and no logging. Entropy is supplied by the caller through
//! [`EntropySource`] so tests can reason about every random draw.
//!
//! # Key Lifecycle
//!
//! A rotation produces a fresh 256-bit [`Seed`]. The seed deterministically
//! keys a [`DerivationRng`], which fills a Gaussian matrix whose QR
//! factorization yields the secret rotation `Q`. Every encryption keys a new
//! [`NoiseRng`] from fresh entropy and draws a perturbation from a ball.
//!
//! ```text
//! Rotation Seed (32 bytes)
//!        │
//!        ▼
//! ChaCha20 → Gaussian N×N matrix
//!        │
//!        ▼
//! Householder QR → Q (sign-corrected, Haar distributed)
//!        │
//!        ▼
//! Qᵗ·Q ≈ I check → OrthogonalMatrix
//!
//! Fresh entropy (per request)
//!        │
//!        ▼
//! ChaCha20 → direction u, radius x → λ with ‖λ‖ ≤ s·β/4
//! ```
//!
//! # Security
//!
//! Seed discipline:
//! - The deterministic and the per-request generators are distinct types;
//!   a [`NoiseRng`] cannot be keyed from a caller-chosen seed
//! - Both generators consume the whole 256-bit key, never a truncated integer
//!
//! Memory hygiene:
//! - [`Seed`] and [`OrthogonalMatrix`] are zeroized on drop
//! - Intermediate Gaussian and triangular factors are zeroized after QR
//!
//! Unlinkability:
//! - Noise is drawn from a newly keyed stream for every encryption, so two
//!   encryptions of the same vector differ

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod entropy;
mod error;
pub mod matrix;
pub mod noise;
pub mod rng;

pub use entropy::{EntropySource, OsEntropy};
pub use error::CryptoError;
pub use matrix::{
    MAX_DIMENSION, ORTHOGONALITY_TOLERANCE, OrthogonalMatrix, generate_orthogonal_matrix,
    validate_orthogonality,
};
pub use noise::{noise_radius, sample_noise, sample_noise_into};
pub use rng::{DerivationRng, NoiseRng, SEED_LEN, Seed};
