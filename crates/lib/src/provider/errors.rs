//! Provider error types.

use std::sync::Arc;

use thiserror::Error;

/// Errors raised while obtaining the repository from a [`DaoProvider`](super::DaoProvider).
///
/// # Stability
///
/// - New variants may be added in minor versions (enum is `#[non_exhaustive]`)
/// - Helper methods like `is_*()` provide stable APIs
#[non_exhaustive]
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    /// Initialization has not completed yet.
    #[error("user directory is not ready")]
    NotReady,

    /// The backend failed to initialize.
    #[error("user directory backend failed to initialize: {reason}")]
    BackendInit {
        /// Display form of the underlying failure
        reason: String,
        /// The underlying failure
        #[source]
        source: Arc<crate::Error>,
    },

    /// The initializer went away without publishing an outcome.
    #[error("user directory initialization was aborted")]
    InitAborted,
}

impl ProviderError {
    /// Wrap an initialization failure.
    pub fn backend_init(err: impl Into<crate::Error>) -> Self {
        Self::from_shared(Arc::new(err.into()))
    }

    pub(crate) fn from_shared(source: Arc<crate::Error>) -> Self {
        ProviderError::BackendInit {
            reason: source.to_string(),
            source,
        }
    }

    /// Check if initialization has simply not finished yet.
    pub fn is_not_ready(&self) -> bool {
        matches!(self, ProviderError::NotReady)
    }

    /// Check if the backend failed, or never reported, its initialization.
    pub fn is_backend_init_error(&self) -> bool {
        matches!(
            self,
            ProviderError::BackendInit { .. } | ProviderError::InitAborted
        )
    }
}

impl From<ProviderError> for crate::Error {
    fn from(err: ProviderError) -> Self {
        crate::Error::Provider(err)
    }
}
