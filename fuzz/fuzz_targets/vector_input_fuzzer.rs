//! Fuzz target for encrypt request decoding
//!
//! Feeds arbitrary bytes through JSON decoding of `EncryptRequest` and
//! `VectorInput::parse`, plus the command-line form.
//!
//! # Invariants
//!
//! - Decoding NEVER panics
//! - A successfully parsed vector contains only finite values
//! - Every rejection is a client error

#![no_main]

use libfuzzer_sys::fuzz_target;
use sapvault_server::{EncryptRequest, VectorInput};

fn check(input: &VectorInput) {
    match input.parse() {
        Ok(values) => assert!(values.iter().all(|x| x.is_finite())),
        Err(e) => assert!(e.is_client_error()),
    }
}

fuzz_target!(|data: &[u8]| {
    if let Ok(request) = serde_json::from_slice::<EncryptRequest>(data) {
        if let Some(input) = request.vector.as_ref() {
            check(input);
        }
    }

    if let Ok(text) = std::str::from_utf8(data) {
        check(&VectorInput::from_arg(text));
    }
});
