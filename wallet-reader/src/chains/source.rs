//! Where the chain directory comes from.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use reqwest::Client;
use serde_json::Value;
use url::Url;

use super::ChainRecord;
use crate::error::Error;

/// Public chain directory.
pub const DEFAULT_CHAINS_URL: &str = "https://chainid.network/chains.json";

/// Boxed future returned by [`ChainSource::fetch`].
pub type SourceFuture<'a> = Pin<Box<dyn Future<Output = Result<Vec<ChainRecord>, Error>> + Send + 'a>>;

/// Fetches the full list of chain records.
pub trait ChainSource: Send + Sync {
    /// Retrieves the directory.
    ///
    /// Implementations report every failure as [`Error::DirectoryUnavailable`].
    fn fetch(&self) -> SourceFuture<'_>;
}

/// [`ChainSource`] backed by an HTTP `GET` of a JSON array.
#[derive(Clone)]
pub struct HttpChainSource {
    client: Client,
    url: Url,
}

impl HttpChainSource {
    /// Creates a source for `url` with a fresh HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DirectoryUnavailable`] if the HTTP client cannot be built.
    pub fn new(url: Url) -> Result<Self, Error> {
        let client = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::DirectoryUnavailable(format!("HTTP client build failed: {e}")))?;
        Ok(Self { client, url })
    }

    /// Directory URL.
    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }

    async fn get(&self) -> Result<Vec<ChainRecord>, Error> {
        let response = self
            .client
            .get(self.url.clone())
            .send()
            .await
            .map_err(|e| Error::DirectoryUnavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::DirectoryUnavailable(format!(
                "GET {} returned {status}",
                self.url
            )));
        }

        let entries: Vec<Value> = response
            .json()
            .await
            .map_err(|e| Error::DirectoryUnavailable(format!("undecodable directory: {e}")))?;
        Ok(decode_entries(entries))
    }
}

impl fmt::Debug for HttpChainSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpChainSource")
            .field("url", &self.url.as_str())
            .finish_non_exhaustive()
    }
}

impl ChainSource for HttpChainSource {
    fn fetch(&self) -> SourceFuture<'_> {
        Box::pin(self.get())
    }
}

/// Decodes directory entries one by one so a single malformed record does
/// not take the whole directory down.
fn decode_entries(entries: Vec<Value>) -> Vec<ChainRecord> {
    let total = entries.len();
    let records: Vec<ChainRecord> = entries
        .into_iter()
        .filter_map(|entry| match serde_json::from_value::<ChainRecord>(entry) {
            Ok(record) => Some(record),
            Err(error) => {
                tracing::debug!(%error, "skipping malformed chain record");
                None
            }
        })
        .collect();
    if records.len() < total {
        tracing::warn!(
            skipped = total - records.len(),
            total,
            "chain directory contained malformed records"
        );
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;
    use serde_json::json;

    fn source_for(server: &mockito::ServerGuard) -> HttpChainSource {
        let url = Url::parse(&format!("{}/chains.json", server.url())).expect("mock url");
        HttpChainSource::new(url).expect("client")
    }

    #[tokio::test]
    async fn fetches_and_decodes() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/chains.json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!([
                    { "chainId": 1, "name": "Ethereum Mainnet",
                      "nativeCurrency": { "name": "Ether", "symbol": "ETH", "decimals": 18 } },
                    { "chainId": 137, "name": "Polygon Mainnet",
                      "nativeCurrency": { "name": "POL", "symbol": "POL", "decimals": 18 } },
                    { "name": "missing chain id" }
                ])
                .to_string(),
            )
            .create_async()
            .await;

        let records = source_for(&server).fetch().await.expect("directory");

        assert_eq!(records.len(), 2);
        assert_eq!(records[1].chain_id, 137);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn server_error_is_directory_unavailable() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/chains.json")
            .with_status(503)
            .create_async()
            .await;

        let error = source_for(&server).fetch().await.expect_err("unavailable");
        assert!(matches!(error, Error::DirectoryUnavailable(_)));
    }

    #[tokio::test]
    async fn non_array_body_is_directory_unavailable() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/chains.json")
            .with_status(200)
            .with_body(r#"{"chains": []}"#)
            .create_async()
            .await;

        let error = source_for(&server).fetch().await.expect_err("unavailable");
        assert!(matches!(error, Error::DirectoryUnavailable(_)));
    }
}
