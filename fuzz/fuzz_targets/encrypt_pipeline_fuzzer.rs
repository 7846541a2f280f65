//! Fuzz target for the encryption pipeline
//!
//! Encrypts arbitrary coordinates (including NaN, infinities and huge
//! magnitudes) under arbitrary parameters.
//!
//! # Invariants
//!
//! - The pipeline NEVER panics and never reports `Internal`
//! - A ciphertext has the configured dimension and only finite values
//! - With `β = 0` the ciphertext norm is `s·‖v‖`
//! - Buffers are returned to the pool on every path

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use sapvault_core::{CacheEntry, CoreError, EncryptionPipeline, RotationParams, SeedConfig};
use sapvault_crypto::{OsEntropy, Seed};

#[derive(Debug, Arbitrary)]
struct Scenario {
    seed: [u8; 32],
    /// Dimension 1-32
    dimension: u8,
    scaling_factor: f64,
    approximation_factor: f64,
    values: Vec<f64>,
}

fn norm(v: &[f64]) -> f64 {
    v.iter().map(|x| x * x).sum::<f64>().sqrt()
}

fuzz_target!(|scenario: Scenario| {
    let dimension = usize::from(scenario.dimension % 32) + 1;
    let params = RotationParams {
        dimension,
        scaling_factor: scenario.scaling_factor,
        approximation_factor: scenario.approximation_factor,
    };
    let Ok(config) = SeedConfig::new(Seed::from_bytes(scenario.seed), params) else {
        return;
    };
    let entry = CacheEntry::derive(config).expect("valid parameters derive");
    let pipeline = EncryptionPipeline::new();

    match pipeline.encrypt(&scenario.values, &entry, &OsEntropy) {
        Ok(ciphertext) => {
            assert_eq!(ciphertext.len(), dimension);
            assert!(ciphertext.iter().all(|x| x.is_finite()));

            if params.approximation_factor == 0.0 {
                let expected = params.scaling_factor * norm(&scenario.values);
                let actual = norm(&ciphertext);
                assert!((expected - actual).abs() <= 1e-6 * expected.max(1.0));
            }
        },
        Err(CoreError::Internal) => panic!("pipeline reported an internal fault"),
        Err(_) => {},
    }

    assert!(pipeline.pool().idle() <= 4);
});
