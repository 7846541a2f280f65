//! Server error types.
//!
//! Two audiences: clients get an actionable message or an opaque failure;
//! operators get the detail through the log.

use sapvault_core::CoreError;
use thiserror::Error;

/// Errors returned by [`crate::Backend`] operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServerError {
    /// The request or the engine state needs fixing by the caller.
    ///
    /// The message is safe to return verbatim; it never contains vector
    /// values or key material.
    #[error("{0}")]
    Client(String),

    /// Any other failure.
    ///
    /// Rendered as an opaque message. The underlying cause was logged when
    /// this error was created. Retrying later may succeed.
    #[error("internal error")]
    Internal,
}

impl ServerError {
    /// Returns true for [`ServerError::Client`].
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Client(_))
    }
}

impl From<CoreError> for ServerError {
    fn from(err: CoreError) -> Self {
        if err.is_client_error() {
            Self::Client(err.to_string())
        } else {
            tracing::error!(error = %err, "request failed");
            Self::Internal
        }
    }
}
