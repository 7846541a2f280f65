//! Perturbation sampling from a `d`-ball.
//!
//! The noise term `λ` is drawn uniformly from the ball of radius `s·β/4`:
//!
//! 1. `u ← N(0, I_d)`
//! 2. `x' ← U[0, 1)`
//! 3. `x ← (s·β/4) · x'^(1/d)`
//! 4. `λ ← u · x / ‖u‖`
//!
//! Every call keys a fresh [`NoiseRng`], so samples are independent across
//! requests.

use crate::{CryptoError, EntropySource, NoiseRng};

/// Radius of the noise ball, `s·β/4`.
pub fn noise_radius(scaling_factor: f64, approximation_factor: f64) -> f64 {
    scaling_factor * approximation_factor / 4.0
}

/// Sample a noise vector into `out`, whose length is the dimension.
///
/// Keys a new [`NoiseRng`] from `entropy` for this call only.
///
/// # Errors
///
/// - `InvalidDimension`: `out` is empty
/// - `InvalidNoiseParameters`: `s` not finite and positive, `β` not finite
///   and non-negative, or `s·β/4` overflows
/// - `ZeroNormDirection`: the Gaussian direction was the zero vector
/// - `Entropy`: the entropy source failed
pub fn sample_noise_into(
    out: &mut [f64],
    scaling_factor: f64,
    approximation_factor: f64,
    entropy: &impl EntropySource,
) -> Result<(), CryptoError> {
    check_parameters(out.len(), scaling_factor, approximation_factor)?;
    let mut rng = NoiseRng::fresh(entropy)?;
    fill_ball(&mut rng, out, noise_radius(scaling_factor, approximation_factor))
}

/// Allocating variant of [`sample_noise_into`].
pub fn sample_noise(
    dimension: usize,
    scaling_factor: f64,
    approximation_factor: f64,
    entropy: &impl EntropySource,
) -> Result<Vec<f64>, CryptoError> {
    let mut out = vec![0.0; dimension];
    sample_noise_into(&mut out, scaling_factor, approximation_factor, entropy)?;
    Ok(out)
}

fn check_parameters(
    dimension: usize,
    scaling_factor: f64,
    approximation_factor: f64,
) -> Result<(), CryptoError> {
    if dimension == 0 || dimension > crate::MAX_DIMENSION {
        return Err(CryptoError::InvalidDimension { dimension, max: crate::MAX_DIMENSION });
    }

    let scale_ok = scaling_factor.is_finite() && scaling_factor > 0.0;
    let beta_ok = approximation_factor.is_finite() && approximation_factor >= 0.0;
    let radius_ok = noise_radius(scaling_factor, approximation_factor).is_finite();
    if !scale_ok || !beta_ok || !radius_ok {
        return Err(CryptoError::InvalidNoiseParameters { scaling_factor, approximation_factor });
    }

    Ok(())
}

/// Core sampler. `out` holds `u` until it is rescaled in place.
fn fill_ball(rng: &mut NoiseRng, out: &mut [f64], radius: f64) -> Result<(), CryptoError> {
    let mut norm_sq = 0.0;
    for value in out.iter_mut() {
        let z = rng.standard_normal();
        *value = z;
        norm_sq += z * z;
    }

    let norm = norm_sq.sqrt();
    if norm == 0.0 {
        out.fill(0.0);
        return Err(CryptoError::ZeroNormDirection);
    }

    let x_prime = rng.uniform_f64();
    let x = radius * x_prime.powf(1.0 / out.len() as f64);

    let scale = x / norm;
    for value in out.iter_mut() {
        *value *= scale;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::OsEntropy;

    fn norm(v: &[f64]) -> f64 {
        v.iter().map(|x| x * x).sum::<f64>().sqrt()
    }

    #[test]
    fn radius_formula() {
        assert_eq!(noise_radius(1.0, 4.0), 1.0);
        assert_eq!(noise_radius(10.0, 2.0), 5.0);
        assert_eq!(noise_radius(3.0, 0.0), 0.0);
    }

    #[test]
    fn sample_has_requested_length() {
        let noise = sample_noise(100, 1.0, 0.1, &OsEntropy).unwrap();
        assert_eq!(noise.len(), 100);
        assert!(noise.iter().any(|&x| x != 0.0), "noise vector is all zeros");
    }

    #[test]
    fn sample_stays_inside_ball() {
        let (s, beta) = (2.0, 3.0);
        let bound = noise_radius(s, beta) * (1.0 + 1e-12);

        for dim in [1, 2, 7, 128] {
            for _ in 0..50 {
                let noise = sample_noise(dim, s, beta, &OsEntropy).unwrap();
                assert!(norm(&noise) <= bound, "dim {dim}: norm {} > {bound}", norm(&noise));
            }
        }
    }

    #[test]
    fn zero_approximation_factor_gives_zero_noise() {
        let noise = sample_noise(16, 1.0, 0.0, &OsEntropy).unwrap();
        assert!(noise.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn independent_calls_differ() {
        let a = sample_noise(32, 1.0, 1.0, &OsEntropy).unwrap();
        let b = sample_noise(32, 1.0, 1.0, &OsEntropy).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn fixed_key_is_reproducible() {
        let mut a = vec![0.0; 16];
        let mut b = vec![0.0; 16];
        fill_ball(&mut NoiseRng::with_test_key([7; 32]), &mut a, 1.0).unwrap();
        fill_ball(&mut NoiseRng::with_test_key([7; 32]), &mut b, 1.0).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn radius_distribution_concentrates_near_boundary() {
        // For uniform sampling in a d-ball, P(‖λ‖ ≤ r·R) = r^d. At d = 64
        // almost every sample lies beyond half the radius.
        let mut rng = NoiseRng::with_test_key([3; 32]);
        let mut out = vec![0.0; 64];
        let mut inner = 0;
        for _ in 0..200 {
            fill_ball(&mut rng, &mut out, 1.0).unwrap();
            if norm(&out) < 0.5 {
                inner += 1;
            }
        }
        assert_eq!(inner, 0);
    }

    #[test]
    fn rejects_empty_dimension() {
        assert!(matches!(
            sample_noise(0, 1.0, 1.0, &OsEntropy),
            Err(CryptoError::InvalidDimension { dimension: 0, .. })
        ));
    }

    #[test]
    fn rejects_bad_parameters() {
        let cases = [
            (0.0, 1.0),
            (-1.0, 1.0),
            (f64::NAN, 1.0),
            (1.0, -0.5),
            (1.0, f64::INFINITY),
            (1e308, 8.0),
        ];
        for (s, beta) in cases {
            assert!(
                matches!(
                    sample_noise(4, s, beta, &OsEntropy),
                    Err(CryptoError::InvalidNoiseParameters { .. })
                ),
                "s={s} beta={beta}"
            );
        }
    }

    #[test]
    fn entropy_failure_is_reported() {
        struct Broken;
        impl EntropySource for Broken {
            fn fill_bytes(&self, _buffer: &mut [u8]) -> Result<(), CryptoError> {
                Err(CryptoError::Entropy("unavailable".to_string()))
            }
        }

        assert_eq!(
            sample_noise(4, 1.0, 1.0, &Broken),
            Err(CryptoError::Entropy("unavailable".to_string()))
        );
    }
}
