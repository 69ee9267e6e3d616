//! Wallet Reader
//!
//! Reads the address, balance and active chain of a connected EVM wallet
//! through an injected [`Provider`](provider::Provider) capability.
//!
//! - [`gateway`] — uniform call primitive that tolerates a missing provider.
//! - [`wallet`] — typed `eth_accounts` / `eth_requestAccounts` /
//!   `eth_getBalance` / `eth_chainId` accessors.
//! - [`chains`] — the public chain directory, fetched once and memoised.
//! - [`state`] — wallet state, account summary and account-change watch.
//!
//! ```no_run
//! use std::sync::Arc;
//! use wallet_reader::chains::{ChainDirectory, DEFAULT_CHAINS_URL, HttpChainSource};
//! use wallet_reader::gateway::Gateway;
//! use wallet_reader::provider::HttpProvider;
//! use wallet_reader::wallet::Wallet;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let provider = HttpProvider::new("http://127.0.0.1:8545".parse()?)?;
//! let wallet = Wallet::new(Gateway::new(Arc::new(provider)));
//! let chains = ChainDirectory::new(Arc::new(HttpChainSource::new(DEFAULT_CHAINS_URL.parse()?)?));
//! if let Some(chain) = chains.current_chain(&wallet).await? {
//!     println!("connected to {}", chain.name);
//! }
//! # Ok(())
//! # }
//! ```

pub mod chains;
pub mod config;
pub mod error;
pub mod gateway;
pub mod provider;
pub mod state;
pub mod units;
pub mod wallet;
