//! JSON-RPC 2.0 provider over HTTP.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use url::Url;

use super::{Provider, ProviderError, ProviderFuture, RpcRequest};

/// Default interval between `eth_accounts` polls for change notifications.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(4);

/// Shortest accepted polling interval.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

const EVENT_CAPACITY: usize = 16;

/// [`Provider`] that posts JSON-RPC envelopes to a single HTTP endpoint.
///
/// Plain HTTP has no push channel, so account changes are detected by
/// polling `eth_accounts` while anyone is subscribed.
pub struct HttpProvider {
    transport: Arc<Transport>,
    poll_interval: Duration,
    events: broadcast::Sender<Vec<String>>,
    poller: Mutex<Option<JoinHandle<()>>>,
}

struct Transport {
    client: Client,
    url: Url,
    next_id: AtomicU64,
}

#[derive(Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
    #[serde(default)]
    data: Option<Value>,
}

impl HttpProvider {
    /// Creates a provider for `url` with a fresh HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Transport`] if the HTTP client cannot be built.
    pub fn new(url: Url) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ProviderError::Transport(format!("HTTP client build failed: {e}")))?;
        Ok(Self::with_client(client, url))
    }

    /// Creates a provider for `url` reusing an existing client.
    #[must_use]
    pub fn with_client(client: Client, url: Url) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            transport: Arc::new(Transport {
                client,
                url,
                next_id: AtomicU64::new(1),
            }),
            poll_interval: DEFAULT_POLL_INTERVAL,
            events,
            poller: Mutex::new(None),
        }
    }

    /// Sets the `eth_accounts` polling interval used for change notifications.
    ///
    /// Values below [`MIN_POLL_INTERVAL`] are raised to it.
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval.max(MIN_POLL_INTERVAL);
        self
    }

    /// Endpoint this provider talks to.
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.transport.url
    }

    fn ensure_poller(&self) {
        let mut poller = self.poller.lock().unwrap_or_else(PoisonError::into_inner);
        if poller.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return;
        }
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!("no tokio runtime, account change polling disabled");
            return;
        };
        let transport = Arc::clone(&self.transport);
        let events = self.events.clone();
        let interval = self.poll_interval;
        *poller = Some(runtime.spawn(poll_accounts(transport, events, interval)));
    }
}

impl fmt::Debug for HttpProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpProvider")
            .field("url", &self.transport.url.as_str())
            .field("poll_interval", &self.poll_interval)
            .finish_non_exhaustive()
    }
}

impl Drop for HttpProvider {
    fn drop(&mut self) {
        let poller = self.poller.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = poller.take() {
            handle.abort();
        }
    }
}

impl Provider for HttpProvider {
    fn request(&self, request: RpcRequest) -> ProviderFuture<'_> {
        let transport = Arc::clone(&self.transport);
        Box::pin(async move { transport.send(&request).await })
    }

    fn accounts_changed(&self) -> Option<broadcast::Receiver<Vec<String>>> {
        let receiver = self.events.subscribe();
        self.ensure_poller();
        Some(receiver)
    }
}

impl Transport {
    async fn send(&self, request: &RpcRequest) -> Result<Value, ProviderError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": request.method,
            "params": request.params,
        });

        let response = self
            .client
            .post(self.url.clone())
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(describe(e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Transport(format!("HTTP status {status}")));
        }

        let response: RpcResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        match (response.error, response.result) {
            (Some(error), _) => Err(ProviderError::Rpc {
                code: error.code,
                message: error.message,
                data: error.data,
            }),
            (None, result) => Ok(result.unwrap_or(Value::Null)),
        }
    }
}

/// Strips URLs out of reqwest errors; RPC URLs often embed API keys.
fn describe(error: reqwest::Error) -> String {
    if error.is_connect() {
        "connection refused or unreachable".to_owned()
    } else if error.is_timeout() {
        "connection timed out".to_owned()
    } else if error.is_body() {
        "response body error".to_owned()
    } else {
        error.without_url().to_string()
    }
}

async fn poll_accounts(
    transport: Arc<Transport>,
    events: broadcast::Sender<Vec<String>>,
    interval: Duration,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut last: Option<Vec<String>> = None;

    loop {
        ticker.tick().await;
        if events.receiver_count() == 0 {
            tracing::debug!("no account subscribers left, polling stopped");
            break;
        }

        let accounts = match transport.send(&RpcRequest::new("eth_accounts")).await {
            Ok(value) => serde_json::from_value::<Vec<String>>(value),
            Err(error) => {
                tracing::warn!(%error, "eth_accounts poll failed");
                continue;
            }
        };
        let accounts = match accounts {
            Ok(accounts) => accounts,
            Err(error) => {
                tracing::warn!(%error, "eth_accounts poll returned a non-list");
                continue;
            }
        };

        if last.as_ref() != Some(&accounts) {
            if last.is_some() {
                tracing::debug!(count = accounts.len(), "accounts changed");
                // A send error only means every receiver dropped since the check above.
                let _ = events.send(accounts.clone());
            }
            last = Some(accounts);
        }
    }
}
