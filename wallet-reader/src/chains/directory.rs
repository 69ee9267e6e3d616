//! Process-lifetime cache of the chain directory.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::SystemTime;

use tokio::sync::OnceCell;

use super::{ChainRecord, ChainSource};
use crate::error::Error;
use crate::wallet::Wallet;

/// Memoised chain directory.
///
/// Lifecycle: constructed empty, populated by the first successful
/// [`list_chains`](Self::list_chains), never invalidated afterwards.
/// Overlapping first calls share one fetch. A failed fetch leaves the cache
/// empty so the next call retries.
pub struct ChainDirectory {
    source: Arc<dyn ChainSource>,
    cache: OnceCell<CacheEntry>,
}

struct CacheEntry {
    chains: Vec<ChainRecord>,
    by_id: HashMap<u64, usize>,
    fetched_at: SystemTime,
}

impl CacheEntry {
    fn new(chains: Vec<ChainRecord>) -> Self {
        let mut by_id = HashMap::with_capacity(chains.len());
        for (index, chain) in chains.iter().enumerate() {
            // First record wins on duplicate ids.
            by_id.entry(chain.chain_id).or_insert(index);
        }
        Self {
            chains,
            by_id,
            fetched_at: SystemTime::now(),
        }
    }
}

impl ChainDirectory {
    /// Creates an empty directory that will fetch from `source`.
    #[must_use]
    pub fn new(source: Arc<dyn ChainSource>) -> Self {
        Self {
            source,
            cache: OnceCell::new(),
        }
    }

    /// All chain records.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DirectoryUnavailable`] if the directory has not been
    /// fetched yet and fetching fails.
    pub async fn list_chains(&self) -> Result<&[ChainRecord], Error> {
        let entry = self
            .cache
            .get_or_try_init(|| async {
                tracing::debug!("fetching chain directory");
                let chains = self.source.fetch().await.inspect_err(|error| {
                    tracing::warn!(%error, "chain directory fetch failed");
                })?;
                tracing::info!(count = chains.len(), "chain directory cached");
                Ok::<_, Error>(CacheEntry::new(chains))
            })
            .await?;
        Ok(&entry.chains)
    }

    /// The record whose id is exactly `chain_id`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DirectoryUnavailable`] if the directory cannot be fetched.
    pub async fn chain_by_id(&self, chain_id: u64) -> Result<Option<&ChainRecord>, Error> {
        self.list_chains().await?;
        Ok(self.cache.get().and_then(|entry| {
            entry
                .by_id
                .get(&chain_id)
                .and_then(|&index| entry.chains.get(index))
        }))
    }

    /// The record of the chain `wallet` is connected to.
    ///
    /// `None` when there is no provider or the chain is not in the directory.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ProviderRequest`] or [`Error::InvalidResponse`] from
    /// the chain id query, or [`Error::DirectoryUnavailable`].
    pub async fn current_chain(&self, wallet: &Wallet) -> Result<Option<&ChainRecord>, Error> {
        let Some(chain_id) = wallet.chain_id().await? else {
            return Ok(None);
        };
        let chain = self.chain_by_id(chain_id).await?;
        if chain.is_none() {
            tracing::debug!(chain_id, "chain not in directory");
        }
        Ok(chain)
    }

    /// When the directory was cached, `None` while still empty.
    #[must_use]
    pub fn fetched_at(&self) -> Option<SystemTime> {
        self.cache.get().map(|entry| entry.fetched_at)
    }

    /// Whether the directory has been cached.
    #[must_use]
    pub fn is_cached(&self) -> bool {
        self.cache.initialized()
    }
}

impl fmt::Debug for ChainDirectory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainDirectory")
            .field("cached", &self.is_cached())
            .field("fetched_at", &self.fetched_at())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chains::SourceFuture;
    use crate::gateway::Gateway;
    use crate::provider::stub::StubProvider;
    use serde_json::json;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Serves scripted fetch outcomes in order, repeating the last one.
    struct ScriptedSource {
        outcomes: Mutex<Vec<Result<Vec<ChainRecord>, String>>>,
        fetches: AtomicUsize,
        delay: Duration,
    }

    impl ScriptedSource {
        fn new(outcomes: Vec<Result<Vec<ChainRecord>, String>>) -> Self {
            Self {
                outcomes: Mutex::new(outcomes),
                fetches: AtomicUsize::new(0),
                delay: Duration::ZERO,
            }
        }

        fn fetches(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    impl ChainSource for ScriptedSource {
        fn fetch(&self) -> SourceFuture<'_> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            let outcome = {
                let mut outcomes = self.outcomes.lock().expect("lock");
                if outcomes.len() > 1 {
                    outcomes.remove(0)
                } else {
                    outcomes[0].clone()
                }
            };
            let delay = self.delay;
            Box::pin(async move {
                tokio::time::sleep(delay).await;
                outcome.map_err(Error::DirectoryUnavailable)
            })
        }
    }

    fn record(chain_id: u64, name: &str) -> ChainRecord {
        serde_json::from_value(json!({
            "chainId": chain_id,
            "name": name,
            "nativeCurrency": { "name": "Ether", "symbol": "ETH", "decimals": 18 }
        }))
        .expect("record")
    }

    fn directory() -> Vec<ChainRecord> {
        vec![
            record(1, "Ethereum Mainnet"),
            record(10, "OP Mainnet"),
            record(137, "Polygon Mainnet"),
        ]
    }

    #[tokio::test]
    async fn fetches_once_and_returns_same_list() {
        let source = Arc::new(ScriptedSource::new(vec![Ok(directory())]));
        let chains = ChainDirectory::new(source.clone());
        assert!(!chains.is_cached());

        let first = chains.list_chains().await.expect("first");
        let second = chains.list_chains().await.expect("second");

        assert!(std::ptr::eq(first, second));
        assert_eq!(first.len(), 3);
        assert_eq!(source.fetches(), 1);
        assert!(chains.fetched_at().is_some());
    }

    #[tokio::test]
    async fn overlapping_first_calls_share_one_fetch() {
        let mut source = ScriptedSource::new(vec![Ok(directory())]);
        source.delay = Duration::from_millis(20);
        let source = Arc::new(source);
        let chains = ChainDirectory::new(source.clone());

        let (a, b, c) = tokio::join!(
            chains.list_chains(),
            chains.list_chains(),
            chains.chain_by_id(10),
        );

        assert!(a.is_ok() && b.is_ok());
        assert_eq!(c.expect("lookup").map(|r| r.name.as_str()), Some("OP Mainnet"));
        assert_eq!(source.fetches(), 1);
    }

    #[tokio::test]
    async fn failed_fetch_is_not_cached() {
        let source = Arc::new(ScriptedSource::new(vec![
            Err("connection reset".to_owned()),
            Ok(directory()),
        ]));
        let chains = ChainDirectory::new(source.clone());

        let error = chains.list_chains().await.expect_err("first fetch fails");
        assert!(matches!(error, Error::DirectoryUnavailable(_)));
        assert!(!chains.is_cached());
        assert!(chains.fetched_at().is_none());

        assert_eq!(chains.list_chains().await.expect("retry").len(), 3);
        assert!(chains.is_cached());
        assert_eq!(source.fetches(), 2);
    }

    #[tokio::test]
    async fn lookup_by_id() {
        let chains = ChainDirectory::new(Arc::new(ScriptedSource::new(vec![Ok(directory())])));

        let polygon = chains.chain_by_id(137).await.expect("ok").expect("present");
        assert_eq!(polygon.name, "Polygon Mainnet");
        assert!(chains.chain_by_id(999).await.expect("ok").is_none());
    }

    #[tokio::test]
    async fn duplicate_ids_resolve_to_first_record() {
        let records = vec![record(5, "first"), record(5, "second")];
        let chains = ChainDirectory::new(Arc::new(ScriptedSource::new(vec![Ok(records)])));

        let chain = chains.chain_by_id(5).await.expect("ok").expect("present");
        assert_eq!(chain.name, "first");
    }

    #[tokio::test]
    async fn current_chain_coerces_hex_id() {
        let chains = ChainDirectory::new(Arc::new(ScriptedSource::new(vec![Ok(directory())])));
        let stub = StubProvider::new().reply("eth_chainId", json!("0x1"));
        let wallet = Wallet::new(Gateway::new(Arc::new(stub)));

        let chain = chains.current_chain(&wallet).await.expect("ok").expect("known");
        assert_eq!(chain.chain_id, 1);
        assert_eq!(chain.name, "Ethereum Mainnet");
    }

    #[tokio::test]
    async fn current_chain_without_provider_skips_fetch() {
        let source = Arc::new(ScriptedSource::new(vec![Ok(directory())]));
        let chains = ChainDirectory::new(source.clone());
        let wallet = Wallet::new(Gateway::disconnected());

        assert!(chains.current_chain(&wallet).await.expect("ok").is_none());
        assert_eq!(source.fetches(), 0);
    }
}
