//! Secret rotation matrices.
//!
//! `Q` is derived from a Gaussian matrix by QR factorization, which yields a
//! rotation distributed according to the Haar measure on the orthogonal
//! group once the columns are sign-corrected against the diagonal of `R`.
//! Derivation costs `O(N³)`; callers cache the result per rotation.

use std::fmt;

use nalgebra::DMatrix;
use zeroize::Zeroize;

use crate::{CryptoError, DerivationRng, Seed};

/// Largest accepted dimension. Matrix memory is `O(N²)`.
pub const MAX_DIMENSION: usize = 8192;

/// Absolute per-entry tolerance for `Qᵗ·Q ≈ I`.
pub const ORTHOGONALITY_TOLERANCE: f64 = 1e-6;

/// A validated `N×N` orthogonal matrix.
///
/// Read-only once constructed. The backing storage is zeroized on drop.
pub struct OrthogonalMatrix {
    inner: DMatrix<f64>,
}

impl OrthogonalMatrix {
    /// Side length `N`.
    pub fn dimension(&self) -> usize {
        self.inner.nrows()
    }

    /// Entry at `(row, col)`, or `None` when out of range.
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.inner.get((row, col)).copied()
    }

    /// Borrow the underlying matrix.
    pub fn as_matrix(&self) -> &DMatrix<f64> {
        &self.inner
    }

    /// Dense product `output = Q · input`.
    ///
    /// Both slices must have length `N`. Walks `Q` column by column to follow
    /// its column-major layout.
    pub fn rotate_into(&self, input: &[f64], output: &mut [f64]) -> Result<(), CryptoError> {
        let n = self.dimension();
        if input.len() != n {
            return Err(CryptoError::DimensionMismatch { expected: n, actual: input.len() });
        }
        if output.len() != n {
            return Err(CryptoError::DimensionMismatch { expected: n, actual: output.len() });
        }

        output.fill(0.0);
        for (column, &x) in self.inner.column_iter().zip(input) {
            for (out, &q) in output.iter_mut().zip(column.iter()) {
                *out += q * x;
            }
        }

        Ok(())
    }

    /// Allocating variant of [`Self::rotate_into`].
    pub fn rotate(&self, input: &[f64]) -> Result<Vec<f64>, CryptoError> {
        let mut output = vec![0.0; self.dimension()];
        self.rotate_into(input, &mut output)?;
        Ok(output)
    }
}

impl fmt::Debug for OrthogonalMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrthogonalMatrix")
            .field("dimension", &self.dimension())
            .finish_non_exhaustive()
    }
}

impl Zeroize for OrthogonalMatrix {
    fn zeroize(&mut self) {
        self.inner.as_mut_slice().zeroize();
    }
}

impl Drop for OrthogonalMatrix {
    fn drop(&mut self) {
        self.zeroize();
    }
}

/// Derive an orthogonal matrix from a 256-bit seed.
///
/// Deterministic: identical `(seed, dimension)` pairs yield bit-identical
/// matrices.
///
/// # Errors
///
/// - `InvalidDimension`: `dimension` is 0 or above [`MAX_DIMENSION`]
/// - `InvalidSeedLength`: `seed` is not exactly 32 bytes
/// - `NotOrthogonal`: the factorization failed the self-check; the matrix is
///   discarded rather than returned approximately orthogonal
pub fn generate_orthogonal_matrix(
    seed: &[u8],
    dimension: usize,
) -> Result<OrthogonalMatrix, CryptoError> {
    if dimension == 0 || dimension > MAX_DIMENSION {
        return Err(CryptoError::InvalidDimension { dimension, max: MAX_DIMENSION });
    }
    let seed = Seed::from_slice(seed)?;

    let mut rng = DerivationRng::from_seed(&seed);
    let gaussian = DMatrix::from_fn(dimension, dimension, |_, _| rng.standard_normal());

    // `qr()` consumes the Gaussian matrix; its storage becomes the packed
    // factorization and is released by `unpack`.
    let (mut q, mut r) = gaussian.qr().unpack();

    // Householder QR leaves the signs of diag(R) arbitrary. Flipping the
    // matching columns of Q pins them positive, which makes Q Haar distributed.
    for j in 0..dimension {
        if r[(j, j)] < 0.0 {
            for value in q.column_mut(j).iter_mut() {
                *value = -*value;
            }
        }
    }
    r.as_mut_slice().zeroize();

    let mut matrix = OrthogonalMatrix { inner: q };
    if let Err(e) = validate_orthogonality(&matrix.inner) {
        matrix.zeroize();
        return Err(e);
    }

    Ok(matrix)
}

/// Check `Qᵗ·Q ≈ I` within [`ORTHOGONALITY_TOLERANCE`].
///
/// Reports the first violating entry in row-major order.
pub fn validate_orthogonality(q: &DMatrix<f64>) -> Result<(), CryptoError> {
    let (rows, cols) = q.shape();
    if rows != cols {
        return Err(CryptoError::NotSquare { rows, cols });
    }

    let mut product = q.tr_mul(q);
    let mut violation = None;

    'search: for row in 0..rows {
        for col in 0..cols {
            let expected = if row == col { 1.0 } else { 0.0 };
            let deviation = (product[(row, col)] - expected).abs();
            if deviation.is_nan() || deviation > ORTHOGONALITY_TOLERANCE {
                violation = Some(CryptoError::NotOrthogonal { row, col, deviation });
                break 'search;
            }
        }
    }

    product.as_mut_slice().zeroize();
    violation.map_or(Ok(()), Err)
}
