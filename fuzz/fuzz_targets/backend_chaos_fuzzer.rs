//! Fuzz target for the backend under configuration store failures
//!
//! Interleaves rotations, encryptions and invalidation signals while the
//! store randomly fails.
//!
//! # Invariants
//!
//! - The backend NEVER panics on storage errors
//! - Storage faults surface as opaque internal errors
//! - A successful encryption always matches the dimension of the latest
//!   committed rotation

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use sapvault_core::{CONFIG_STORAGE_KEY, ChaoticConfigStore, ConfigStore, MemoryConfigStore};
use sapvault_crypto::OsEntropy;
use sapvault_server::{Backend, EncryptRequest, RotateRequest, ServerError};

#[derive(Debug, Arbitrary)]
struct Scenario {
    chaos_seed: u64,
    /// Failure rate 0-9 maps to 0%-90%
    failure_rate_tenth: u8,
    operations: Vec<Operation>,
}

#[derive(Debug, Arbitrary)]
enum Operation {
    Rotate { dimension: i8 },
    Encrypt { dimension: u8, fill: f64 },
    Invalidate { config_key: bool },
}

fuzz_target!(|scenario: Scenario| {
    let failure_rate = f64::from(scenario.failure_rate_tenth % 10) / 10.0;
    let store =
        ChaoticConfigStore::with_seed(MemoryConfigStore::new(), failure_rate, scenario.chaos_seed);
    let backend = Backend::new(store, OsEntropy);

    for operation in scenario.operations.iter().take(32) {
        match operation {
            Operation::Rotate { dimension } => {
                let request = RotateRequest {
                    dimension: Some(i64::from(*dimension)),
                    ..RotateRequest::default()
                };
                match backend.rotate(&request) {
                    Ok(response) => assert_eq!(response.dimension as i64, i64::from(*dimension)),
                    Err(ServerError::Client(_)) => assert!(*dimension <= 0),
                    Err(ServerError::Internal) => {},
                }
            },
            Operation::Encrypt { dimension, fill } => {
                let values = vec![*fill; usize::from(*dimension)];
                let result = backend.encrypt(&EncryptRequest::from_values(&values), "fuzz");

                if let Ok(response) = result {
                    let committed = backend.store().inner().load_config().expect("inner store");
                    let committed = committed.expect("encryption implies a configuration");
                    assert_eq!(response.ciphertext.len() as u64, committed.dimension);
                }
            },
            Operation::Invalidate { config_key } => {
                let key = if *config_key { CONFIG_STORAGE_KEY } else { "config/unrelated" };
                backend.invalidate(key);
            },
        }
    }
});
