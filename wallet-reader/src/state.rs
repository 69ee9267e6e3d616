//! Wallet state resolution and account summaries.

use alloy_primitives::{Address, U256};

use crate::chains::{ChainDirectory, ChainRecord};
use crate::error::Error;
use crate::gateway::AccountsSubscription;
use crate::units::{DEFAULT_DECIMALS, to_display};
use crate::wallet::{BlockTag, Wallet};

/// What the wallet currently allows us to see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletState {
    /// No provider capability.
    NotInstalled,
    /// A provider exists but exposes no accounts.
    NotAuthenticated,
    /// At least one account is exposed.
    Connected {
        /// Exposed accounts, primary first.
        accounts: Vec<Address>,
    },
}

impl WalletState {
    /// Resolves the state from the wallet's account list.
    ///
    /// An `eth_accounts` failure is logged and read as "not authenticated".
    pub async fn resolve(wallet: &Wallet) -> Self {
        if !wallet.gateway().is_available() {
            return Self::NotInstalled;
        }
        match wallet.accounts().await {
            Ok(accounts) => Self::from_accounts(accounts),
            Err(error) => {
                tracing::warn!(%error, "could not list accounts");
                Self::NotAuthenticated
            }
        }
    }

    /// State of an available provider exposing `accounts`.
    #[must_use]
    pub fn from_accounts(accounts: Vec<Address>) -> Self {
        if accounts.is_empty() {
            Self::NotAuthenticated
        } else {
            Self::Connected { accounts }
        }
    }

    /// Primary account when connected.
    #[must_use]
    pub fn primary(&self) -> Option<Address> {
        match self {
            Self::Connected { accounts } => accounts.first().copied(),
            _ => None,
        }
    }
}

/// Address, balance and chain of the primary account.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountSummary {
    /// Primary account.
    pub address: Address,
    /// Balance in the smallest unit.
    pub balance: U256,
    /// Chain the wallet is on, `None` if unknown to the directory.
    pub chain: Option<ChainRecord>,
}

impl AccountSummary {
    /// Loads the summary for the primary account.
    ///
    /// `None` unless the wallet is connected. A directory outage degrades to
    /// an unknown chain.
    ///
    /// # Errors
    ///
    /// Returns provider failures from the account, balance or chain id reads.
    pub async fn load(
        wallet: &Wallet,
        chains: &ChainDirectory,
        block: BlockTag,
    ) -> Result<Option<Self>, Error> {
        let Some(address) = wallet.accounts().await?.first().copied() else {
            return Ok(None);
        };
        let Some(balance) = wallet.balance(address, block).await? else {
            return Ok(None);
        };
        let chain = match chains.current_chain(wallet).await {
            Ok(chain) => chain.cloned(),
            Err(Error::DirectoryUnavailable(reason)) => {
                tracing::warn!(%reason, "chain directory unavailable, chain unknown");
                None
            }
            Err(error) => return Err(error),
        };
        Ok(Some(Self {
            address,
            balance,
            chain,
        }))
    }

    /// Decimals used for display: the chain's, or 18.
    #[must_use]
    pub fn decimals(&self) -> u8 {
        self.chain.as_ref().map_or(DEFAULT_DECIMALS, ChainRecord::decimals)
    }

    /// Balance in display units.
    #[must_use]
    pub fn display_balance(&self) -> f64 {
        to_display(self.balance, self.decimals())
    }

    /// Native currency symbol, if the chain is known.
    #[must_use]
    pub fn symbol(&self) -> Option<&str> {
        self.chain.as_ref().map(ChainRecord::symbol)
    }
}

/// Notification produced by [`watch_accounts`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountUpdate {
    /// State after the change.
    pub state: WalletState,
    /// Fresh balance of the primary account, `None` if it could not be read.
    pub balance: Option<U256>,
}

/// Follows account changes, refreshing the primary account's balance.
///
/// Balance read failures are logged and reported as `balance: None`; the
/// watch keeps running.
pub fn watch_accounts<F>(wallet: &Wallet, block: BlockTag, on_update: F) -> AccountsSubscription
where
    F: Fn(AccountUpdate) + Send + Sync + 'static,
{
    let on_update = std::sync::Arc::new(on_update);
    let reader = wallet.clone();
    wallet.on_accounts_changed(move |accounts| {
        let reader = reader.clone();
        let on_update = std::sync::Arc::clone(&on_update);
        async move {
            let state = WalletState::from_accounts(accounts);
            let balance = match state.primary() {
                Some(address) => match reader.balance(address, block).await {
                    Ok(balance) => balance,
                    Err(error) => {
                        tracing::warn!(%address, %error, "balance refresh failed");
                        None
                    }
                },
                None => None,
            };
            on_update(AccountUpdate { state, balance });
        }
    })
}
