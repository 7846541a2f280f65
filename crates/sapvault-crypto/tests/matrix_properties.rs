//! Property-based tests for rotation derivation and noise sampling
//!
//! These tests verify the Scale-And-Perturb building blocks for arbitrary
//! seeds and dimensions, not just fixed vectors:
//! - Derived matrices pass the orthogonality check
//! - Derivation is a pure function of `(seed, dimension)`
//! - Rotations preserve pairwise distances
//! - Noise never leaves the `s·β/4` ball

use proptest::prelude::*;
use sapvault_crypto::{
    OsEntropy, generate_orthogonal_matrix, noise_radius, sample_noise, validate_orthogonality,
};

fn distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum::<f64>().sqrt()
}

#[test]
fn prop_generated_matrix_is_orthogonal() {
    proptest!(ProptestConfig::with_cases(32), |(
        seed in prop::array::uniform32(any::<u8>()),
        dim in 1usize..48,
    )| {
        let q = generate_orthogonal_matrix(&seed, dim).expect("derivation should succeed");

        prop_assert_eq!(q.dimension(), dim);
        prop_assert!(validate_orthogonality(q.as_matrix()).is_ok());
    });
}

#[test]
fn prop_generation_is_deterministic() {
    proptest!(ProptestConfig::with_cases(16), |(
        seed in prop::array::uniform32(any::<u8>()),
        dim in 1usize..32,
    )| {
        let a = generate_orthogonal_matrix(&seed, dim).expect("derivation should succeed");
        let b = generate_orthogonal_matrix(&seed, dim).expect("derivation should succeed");

        // PROPERTY: Re-derivation after a cache flush reproduces the rotation
        for (x, y) in a.as_matrix().iter().zip(b.as_matrix().iter()) {
            prop_assert_eq!(x.to_bits(), y.to_bits());
        }
    });
}

#[test]
fn prop_rotation_is_isometry() {
    proptest!(ProptestConfig::with_cases(32), |(
        seed in prop::array::uniform32(any::<u8>()),
        pair in (1usize..40).prop_flat_map(|dim| (
            prop::collection::vec(-100.0f64..100.0, dim),
            prop::collection::vec(-100.0f64..100.0, dim),
        )),
    )| {
        let (v1, v2) = pair;
        let q = generate_orthogonal_matrix(&seed, v1.len()).expect("derivation should succeed");

        let r1 = q.rotate(&v1).expect("dimensions match");
        let r2 = q.rotate(&v2).expect("dimensions match");

        let plain = distance(&v1, &v2);
        let rotated = distance(&r1, &r2);

        // PROPERTY: ‖Q·v1 − Q·v2‖ ≈ ‖v1 − v2‖
        prop_assert!((plain - rotated).abs() <= 1e-9 * plain.max(1.0),
            "plain {} vs rotated {}", plain, rotated);
    });
}

#[test]
fn prop_noise_within_ball() {
    proptest!(|(
        dim in 1usize..256,
        scaling_factor in 0.001f64..1000.0,
        approximation_factor in 0.0f64..50.0,
    )| {
        let noise = sample_noise(dim, scaling_factor, approximation_factor, &OsEntropy)
            .expect("valid parameters");

        let norm = noise.iter().map(|x| x * x).sum::<f64>().sqrt();
        let radius = noise_radius(scaling_factor, approximation_factor);

        prop_assert_eq!(noise.len(), dim);
        prop_assert!(norm <= radius * (1.0 + 1e-12), "norm {} exceeds radius {}", norm, radius);
    });
}
