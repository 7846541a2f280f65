//! The Rotate, Encrypt and Invalidate operations.

use std::sync::Arc;

use sapvault_core::{
    CONFIG_STORAGE_KEY, ConfigStore, CoreError, EncryptionPipeline, MatrixCache, RotationParams,
    SeedConfig,
};
use sapvault_crypto::EntropySource;
use zeroize::Zeroizing;

use crate::{EncryptRequest, EncryptResponse, RotateRequest, RotateResponse, ServerError};

/// Tracing target for per-request audit records.
pub const AUDIT_TARGET: &str = "sapvault::audit";

/// Encryption backend.
///
/// Owns every piece of process state: the configuration store, the shared
/// matrix cache, the buffer pool and the entropy source. Clone the store or
/// share the backend behind an `Arc`; there is no global instance.
pub struct Backend<S: ConfigStore, E: EntropySource> {
    store: S,
    cache: Arc<MatrixCache>,
    pipeline: EncryptionPipeline,
    entropy: E,
}

impl<S: ConfigStore, E: EntropySource> Backend<S, E> {
    /// Create a backend with an empty cache.
    pub fn new(store: S, entropy: E) -> Self {
        Self::with_cache(store, Arc::new(MatrixCache::new()), entropy)
    }

    /// Create a backend sharing an existing cache.
    pub fn with_cache(store: S, cache: Arc<MatrixCache>, entropy: E) -> Self {
        Self { store, cache, pipeline: EncryptionPipeline::new(), entropy }
    }

    /// Configuration store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Matrix cache.
    pub fn cache(&self) -> &Arc<MatrixCache> {
        &self.cache
    }

    /// Replace the rotation with a freshly seeded one.
    ///
    /// Persists the new configuration, then invalidates the cache so the next
    /// encryption derives the new matrix. Requests already holding the old
    /// matrix finish with it.
    pub fn rotate(&self, request: &RotateRequest) -> Result<RotateResponse, ServerError> {
        let defaults = RotationParams::default();
        let params = RotationParams::new(
            request.dimension.unwrap_or(defaults.dimension as i64),
            request.scaling_factor.unwrap_or(defaults.scaling_factor),
            request.approximation_factor.unwrap_or(defaults.approximation_factor),
        )?;

        let mut warnings = Vec::new();
        if let Some(warning) = params.memory_warning() {
            tracing::warn!(
                dimension = params.dimension,
                estimated_bytes = params.estimated_matrix_bytes(),
                "configured dimension requires significant memory"
            );
            warnings.push(warning);
        }

        let config = SeedConfig::rotate(params, &self.entropy)?;
        self.store.store_config(&config.to_stored()).map_err(CoreError::from)?;
        self.cache.invalidate();

        tracing::info!(
            dimension = params.dimension,
            scaling_factor = params.scaling_factor,
            approximation_factor = params.approximation_factor,
            "configuration rotated"
        );

        Ok(RotateResponse {
            dimension: params.dimension,
            scaling_factor: params.scaling_factor,
            approximation_factor: params.approximation_factor,
            warnings,
        })
    }

    /// Encrypt one vector under the current rotation.
    ///
    /// `caller` identifies the requester in the audit record. Vector values
    /// are never logged.
    pub fn encrypt(
        &self,
        request: &EncryptRequest,
        caller: &str,
    ) -> Result<EncryptResponse, ServerError> {
        let input = request
            .vector
            .as_ref()
            .ok_or_else(|| ServerError::Client("vector is required".to_string()))?;
        let plaintext = Zeroizing::new(input.parse()?);

        let entry = self.cache.get_matrix_and_config(&self.store)?;
        sapvault_core::validate_plaintext(&plaintext, entry.config().dimension())?;

        tracing::info!(
            target: AUDIT_TARGET,
            dimension = entry.config().dimension(),
            caller,
            "vector encryption request"
        );

        let ciphertext = self.pipeline.encrypt(&plaintext, &entry, &self.entropy)?;
        Ok(EncryptResponse { ciphertext })
    }

    /// Handle a storage invalidation signal.
    ///
    /// Only [`CONFIG_STORAGE_KEY`] affects the cache; other keys are ignored.
    pub fn invalidate(&self, key: &str) {
        if key == CONFIG_STORAGE_KEY {
            self.cache.invalidate();
        }
    }

    /// Whether a rotation has ever been written.
    pub fn config_exists(&self) -> Result<bool, ServerError> {
        let stored = self.store.load_config().map_err(CoreError::from)?;
        Ok(stored.is_some())
    }
}
