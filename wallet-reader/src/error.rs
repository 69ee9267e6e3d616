//! Unified error types for the wallet reader.

use thiserror::Error;

use crate::provider::ProviderError;

/// Top-level error type for the wallet reader.
///
/// A missing provider is deliberately absent from this enum: it is a normal
/// state, represented as `None` by the accessors.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration file could not be resolved, read, or parsed.
    #[error("config: {0}")]
    Config(String),

    /// Configuration failure with an underlying cause.
    #[error("config: {context}: {source}")]
    ConfigWith {
        /// What was being attempted.
        context: String,
        /// Underlying cause.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The provider rejected or failed a request.
    #[error("provider request `{method}` failed: {source}")]
    ProviderRequest {
        /// JSON-RPC method name.
        method: String,
        /// Provider-level cause.
        #[source]
        source: ProviderError,
    },

    /// The provider answered, but not with the shape the method promises.
    #[error("invalid `{method}` response: {reason}")]
    InvalidResponse {
        /// JSON-RPC method name.
        method: &'static str,
        /// What was wrong with the payload.
        reason: String,
    },

    /// The remote chain directory could not be fetched or decoded.
    #[error("chain directory unavailable: {0}")]
    DirectoryUnavailable(String),
}

impl Error {
    /// Shorthand for [`Error::Config`].
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Shorthand for [`Error::ConfigWith`].
    pub fn config_with<E>(context: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::ConfigWith {
            context: context.into(),
            source: Box::new(source),
        }
    }

    pub(crate) fn invalid_response(method: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidResponse {
            method,
            reason: reason.into(),
        }
    }

    /// Returns the provider-level cause if this is a [`Error::ProviderRequest`].
    #[must_use]
    pub const fn provider_error(&self) -> Option<&ProviderError> {
        match self {
            Self::ProviderRequest { source, .. } => Some(source),
            _ => None,
        }
    }
}
