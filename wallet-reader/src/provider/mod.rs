//! Wallet provider capability.
//!
//! - [`Provider`] — the injected capability: one `request` operation plus an
//!   optional account-change notification channel.
//! - [`HttpProvider`] — JSON-RPC 2.0 over HTTP.
//!
//! Providers speak raw JSON. Typed decoding lives in [`crate::wallet`].

use std::borrow::Cow;
use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;

mod http;
#[cfg(test)]
pub(crate) mod stub;

pub use self::http::{DEFAULT_POLL_INTERVAL, HttpProvider, MIN_POLL_INTERVAL};

/// EIP-1193 code for a request the user rejected.
pub const USER_REJECTED: i64 = 4001;
/// EIP-1193 code for a method or account the origin is not authorized for.
pub const UNAUTHORIZED: i64 = 4100;
/// EIP-1193 code for a method the provider does not support.
pub const UNSUPPORTED_METHOD: i64 = 4200;
/// EIP-1193 code for a provider disconnected from all chains.
pub const DISCONNECTED: i64 = 4900;
/// EIP-1193 code for a provider disconnected from the requested chain.
pub const CHAIN_DISCONNECTED: i64 = 4901;

/// Boxed future returned by [`Provider::request`].
pub type ProviderFuture<'a> = Pin<Box<dyn Future<Output = Result<Value, ProviderError>> + Send + 'a>>;

/// A `{method, params}` request, forwarded to the provider verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcRequest {
    /// JSON-RPC method name, e.g. `eth_accounts`.
    pub method: Cow<'static, str>,
    /// Positional parameters.
    #[serde(default)]
    pub params: Vec<Value>,
}

impl RpcRequest {
    /// Creates a request with no parameters.
    pub fn new(method: impl Into<Cow<'static, str>>) -> Self {
        Self {
            method: method.into(),
            params: Vec::new(),
        }
    }

    /// Creates a request with the given positional parameters.
    pub fn with_params(method: impl Into<Cow<'static, str>>, params: Vec<Value>) -> Self {
        Self {
            method: method.into(),
            params,
        }
    }
}

/// Failure reported by a provider.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProviderError {
    /// The provider answered with a JSON-RPC error object.
    #[error("rpc error {code}: {message}")]
    Rpc {
        /// Numeric error code (EIP-1193 or JSON-RPC).
        code: i64,
        /// Human-readable message.
        message: String,
        /// Optional structured detail.
        data: Option<Value>,
    },

    /// The request never produced an answer (connection, HTTP status, ...).
    #[error("transport: {0}")]
    Transport(String),

    /// The answer could not be understood as a JSON-RPC response.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl ProviderError {
    /// Builds an [`ProviderError::Rpc`] without `data`.
    pub fn rpc(code: i64, message: impl Into<String>) -> Self {
        Self::Rpc {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// Returns the error code for [`ProviderError::Rpc`].
    #[must_use]
    pub const fn code(&self) -> Option<i64> {
        match self {
            Self::Rpc { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Whether the user declined the request in the wallet's prompt.
    #[must_use]
    pub const fn is_user_rejection(&self) -> bool {
        matches!(self.code(), Some(USER_REJECTED))
    }
}

/// An externally supplied wallet capability.
///
/// Implementors forward `request` to whatever backs the wallet: an HTTP
/// endpoint, an IPC socket, a test double.
pub trait Provider: Send + Sync {
    /// Sends a single request and resolves to the provider's raw result.
    fn request(&self, request: RpcRequest) -> ProviderFuture<'_>;

    /// Subscribes to "accounts changed" notifications.
    ///
    /// Each message carries the full new account list, empty on disconnect.
    /// Returns `None` when the provider cannot notify.
    fn accounts_changed(&self) -> Option<broadcast::Receiver<Vec<String>>> {
        None
    }
}
