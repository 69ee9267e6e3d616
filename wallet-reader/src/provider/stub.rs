//! Scripted provider for unit tests.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use serde_json::Value;
use tokio::sync::broadcast;

use super::{Provider, ProviderError, ProviderFuture, RpcRequest};

/// Answers each method with a fixed reply and records every request.
pub(crate) struct StubProvider {
    replies: HashMap<String, Result<Value, ProviderError>>,
    calls: Mutex<Vec<RpcRequest>>,
    events: broadcast::Sender<Vec<String>>,
}

impl StubProvider {
    pub(crate) fn new() -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            replies: HashMap::new(),
            calls: Mutex::new(Vec::new()),
            events,
        }
    }

    pub(crate) fn reply(mut self, method: &str, value: Value) -> Self {
        self.replies.insert(method.to_owned(), Ok(value));
        self
    }

    pub(crate) fn fail(mut self, method: &str, error: ProviderError) -> Self {
        self.replies.insert(method.to_owned(), Err(error));
        self
    }

    pub(crate) fn calls(&self) -> Vec<RpcRequest> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Pushes an account-change notification to current subscribers.
    pub(crate) fn emit_accounts(&self, accounts: &[&str]) {
        let accounts = accounts.iter().map(|a| (*a).to_owned()).collect();
        let _ = self.events.send(accounts);
    }
}

impl Provider for StubProvider {
    fn request(&self, request: RpcRequest) -> ProviderFuture<'_> {
        let reply = self.replies.get(request.method.as_ref()).cloned();
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());
        Box::pin(async move {
            reply.unwrap_or_else(|| {
                Err(ProviderError::rpc(
                    super::UNSUPPORTED_METHOD,
                    format!("no stub reply for {}", request.method),
                ))
            })
        })
    }

    fn accounts_changed(&self) -> Option<broadcast::Receiver<Vec<String>>> {
        Some(self.events.subscribe())
    }
}
