//! Sapvault operations surface.
//!
//! Wraps [`sapvault_core`]'s engine in the operations an embedding host
//! exposes: Rotate, Encrypt, and the storage invalidation signal.
//!
//! # Components
//!
//! - [`Backend`]: owns the store, matrix cache, buffers and entropy source
//! - [`VectorInput`]: lenient decoding of caller-supplied vectors
//! - [`ServerError`]: client-actionable or opaque internal failures
//!
//! # Logging
//!
//! Operational events go through `tracing`. Each encryption emits one record
//! on the [`AUDIT_TARGET`] target carrying the vector dimension and the
//! caller identity; vector contents and key material are never logged.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod backend;
mod error;
mod request;

pub use backend::{AUDIT_TARGET, Backend};
pub use error::ServerError;
pub use request::{
    EncryptRequest, EncryptResponse, RotateRequest, RotateResponse, Scalar, VectorInput,
};
