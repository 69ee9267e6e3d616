//! Uniform call primitive over an optional [`Provider`].
//!
//! [`Gateway`] holds the capability handed to it at construction. When no
//! provider was supplied every call resolves to `Ok(None)`: "no wallet" is a
//! state, not a failure.

use std::borrow::Cow;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::Error;
use crate::provider::{Provider, RpcRequest};

/// Shared handle to an optional wallet provider.
#[derive(Clone, Default)]
pub struct Gateway {
    provider: Option<Arc<dyn Provider>>,
}

impl Gateway {
    /// Creates a gateway around `provider`.
    #[must_use]
    pub fn new(provider: Arc<dyn Provider>) -> Self {
        Self {
            provider: Some(provider),
        }
    }

    /// Creates a gateway with no provider. Every call yields `Ok(None)`.
    #[must_use]
    pub const fn disconnected() -> Self {
        Self { provider: None }
    }

    /// Creates a gateway from an optional provider.
    #[must_use]
    pub fn from_option(provider: Option<Arc<dyn Provider>>) -> Self {
        Self { provider }
    }

    /// Whether a provider capability is held.
    #[must_use]
    pub const fn is_available(&self) -> bool {
        self.provider.is_some()
    }

    /// Forwards `{method, params}` to the provider.
    ///
    /// Resolves to `Ok(None)` without a provider.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ProviderRequest`] if the provider fails the request.
    pub async fn call(
        &self,
        method: impl Into<Cow<'static, str>>,
        params: Vec<Value>,
    ) -> Result<Option<Value>, Error> {
        let request = RpcRequest::with_params(method, params);
        let Some(provider) = &self.provider else {
            tracing::trace!(method = %request.method, "no provider, empty result");
            return Ok(None);
        };

        let method = request.method.clone();
        tracing::debug!(%method, "provider request");
        match provider.request(request).await {
            Ok(value) => Ok(Some(value)),
            Err(source) => {
                tracing::debug!(%method, error = %source, "provider request failed");
                Err(Error::ProviderRequest {
                    method: method.into_owned(),
                    source,
                })
            }
        }
    }

    /// Registers `handler` for "accounts changed" notifications.
    ///
    /// The handler receives the full new account list, empty on disconnect,
    /// and runs to completion before the next notification is taken. The
    /// returned subscription is inert when there is no provider or the
    /// provider cannot notify. Must be called within a tokio runtime.
    pub fn on_accounts_changed<F, Fut>(&self, mut handler: F) -> AccountsSubscription
    where
        F: FnMut(Vec<String>) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let token = CancellationToken::new();
        let Some(mut receiver) = self
            .provider
            .as_ref()
            .and_then(|provider| provider.accounts_changed())
        else {
            return AccountsSubscription { token, task: None };
        };

        let cancelled = token.clone();
        let task = tokio::spawn(async move {
            loop {
                let accounts = tokio::select! {
                    () = cancelled.cancelled() => break,
                    message = receiver.recv() => message,
                };
                match accounts {
                    Ok(accounts) => handler(accounts).await,
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "account notifications dropped");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });

        AccountsSubscription {
            token,
            task: Some(task),
        }
    }
}

impl fmt::Debug for Gateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gateway")
            .field("available", &self.is_available())
            .finish()
    }
}

/// Handle to an account-change registration.
///
/// Dropping the handle also unsubscribes.
#[derive(Debug)]
pub struct AccountsSubscription {
    token: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl AccountsSubscription {
    /// Whether notifications are still being delivered.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.token.is_cancelled() && self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Stops delivery and waits for an in-flight handler to finish.
    pub async fn unsubscribe(mut self) {
        self.token.cancel();
        if let Some(task) = self.task.take() {
            // Only fails if the handler panicked, which already surfaced.
            let _ = task.await;
        }
    }
}

impl Drop for AccountsSubscription {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
