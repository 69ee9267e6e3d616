//! Typed wallet accessors over the [`Gateway`].
//!
//! Each operation is a fixed method name and parameter shape:
//!
//! | Operation | Method |
//! |-----------|--------|
//! | [`Wallet::accounts`] | `eth_accounts` |
//! | [`Wallet::request_accounts`] | `eth_requestAccounts` |
//! | [`Wallet::balance`] | `eth_getBalance` |
//! | [`Wallet::chain_id`] | `eth_chainId` |

use std::fmt;
use std::future::Future;
use std::str::FromStr;

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Error;
use crate::gateway::{AccountsSubscription, Gateway};
use crate::provider::ProviderError;

const ETH_ACCOUNTS: &str = "eth_accounts";
const ETH_REQUEST_ACCOUNTS: &str = "eth_requestAccounts";
const ETH_GET_BALANCE: &str = "eth_getBalance";
const ETH_CHAIN_ID: &str = "eth_chainId";

/// Block at which state is read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BlockTag {
    /// Most recent block.
    #[default]
    Latest,
    /// Genesis block.
    Earliest,
    /// Pending state.
    Pending,
    /// Latest safe head.
    Safe,
    /// Latest finalized block.
    Finalized,
    /// Explicit block height.
    Number(u64),
}

impl BlockTag {
    fn to_param(self) -> Value {
        Value::String(self.to_string())
    }
}

impl fmt::Display for BlockTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Latest => f.write_str("latest"),
            Self::Earliest => f.write_str("earliest"),
            Self::Pending => f.write_str("pending"),
            Self::Safe => f.write_str("safe"),
            Self::Finalized => f.write_str("finalized"),
            Self::Number(n) => write!(f, "{n:#x}"),
        }
    }
}

impl FromStr for BlockTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "latest" => Ok(Self::Latest),
            "earliest" => Ok(Self::Earliest),
            "pending" => Ok(Self::Pending),
            "safe" => Ok(Self::Safe),
            "finalized" => Ok(Self::Finalized),
            other => parse_u64(other)
                .map(Self::Number)
                .ok_or_else(|| format!("invalid block tag '{other}'")),
        }
    }
}

impl Serialize for BlockTag {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for BlockTag {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Outcome of asking the user for account access.
#[derive(Debug, Clone, PartialEq)]
pub enum Authentication {
    /// Access granted to these accounts.
    Granted(Vec<Address>),
    /// The provider refused: user rejected the prompt, or the request failed.
    Denied(ProviderError),
    /// There is no provider to ask.
    Unavailable,
}

/// Read and authentication operations against the connected wallet.
#[derive(Debug, Clone, Default)]
pub struct Wallet {
    gateway: Gateway,
}

impl Wallet {
    /// Creates accessors over `gateway`.
    #[must_use]
    pub const fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    /// The underlying gateway.
    #[must_use]
    pub const fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    /// Lists accounts the wallet has exposed to us.
    ///
    /// An empty list means "not authorized", and is also what a missing
    /// provider yields.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ProviderRequest`] if the provider fails, or
    /// [`Error::InvalidResponse`] if the reply is not a list of addresses.
    pub async fn accounts(&self) -> Result<Vec<Address>, Error> {
        match self.gateway.call(ETH_ACCOUNTS, Vec::new()).await? {
            Some(value) => parse_accounts(ETH_ACCOUNTS, value),
            None => Ok(Vec::new()),
        }
    }

    /// Asks the wallet to grant account access, which may prompt the user.
    ///
    /// Rejection is an expected outcome and is never returned as an error.
    pub async fn request_accounts(&self) -> Authentication {
        match self.gateway.call(ETH_REQUEST_ACCOUNTS, Vec::new()).await {
            Ok(None) => Authentication::Unavailable,
            Ok(Some(value)) => match parse_accounts(ETH_REQUEST_ACCOUNTS, value) {
                Ok(accounts) => Authentication::Granted(accounts),
                Err(error) => {
                    tracing::warn!(%error, "account access reply unreadable");
                    Authentication::Denied(ProviderError::InvalidResponse(error.to_string()))
                }
            },
            Err(Error::ProviderRequest { source, .. }) => {
                tracing::warn!(error = %source, "account access denied");
                Authentication::Denied(source)
            }
            Err(error) => Authentication::Denied(ProviderError::Transport(error.to_string())),
        }
    }

    /// Balance of `address` at `block`, in the chain's smallest unit.
    ///
    /// `None` when there is no provider.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ProviderRequest`] if the provider fails, or
    /// [`Error::InvalidResponse`] if the reply is not a quantity.
    pub async fn balance(&self, address: Address, block: BlockTag) -> Result<Option<U256>, Error> {
        let params = vec![Value::String(address.to_string()), block.to_param()];
        self.gateway
            .call(ETH_GET_BALANCE, params)
            .await?
            .map(|value| parse_quantity(ETH_GET_BALANCE, &value))
            .transpose()
    }

    /// Numeric id of the chain the wallet is connected to.
    ///
    /// Accepts a hex string (`"0x1"`), a decimal string or a JSON number.
    /// `None` when there is no provider.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ProviderRequest`] if the provider fails, or
    /// [`Error::InvalidResponse`] if the reply is not a chain id.
    pub async fn chain_id(&self) -> Result<Option<u64>, Error> {
        self.gateway
            .call(ETH_CHAIN_ID, Vec::new())
            .await?
            .map(|value| parse_chain_id(&value))
            .transpose()
    }

    /// Registers `handler` for account changes, see
    /// [`Gateway::on_accounts_changed`].
    ///
    /// Addresses that fail to parse are logged and skipped.
    pub fn on_accounts_changed<F, Fut>(&self, mut handler: F) -> AccountsSubscription
    where
        F: FnMut(Vec<Address>) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.gateway.on_accounts_changed(move |raw| {
            let accounts = raw
                .iter()
                .filter_map(|account| match account.parse::<Address>() {
                    Ok(address) => Some(address),
                    Err(error) => {
                        tracing::warn!(%account, %error, "ignoring unparsable account");
                        None
                    }
                })
                .collect();
            handler(accounts)
        })
    }
}

fn parse_accounts(method: &'static str, value: Value) -> Result<Vec<Address>, Error> {
    match value {
        // Some providers answer `null` instead of `[]` before authorization.
        Value::Null => Ok(Vec::new()),
        value => serde_json::from_value(value)
            .map_err(|e| Error::invalid_response(method, format!("expected address list: {e}"))),
    }
}

fn parse_quantity(method: &'static str, value: &Value) -> Result<U256, Error> {
    match value {
        Value::String(s) => U256::from_str(s.trim())
            .map_err(|e| Error::invalid_response(method, format!("bad quantity '{s}': {e}"))),
        Value::Number(n) => n
            .as_u64()
            .map(U256::from)
            .ok_or_else(|| Error::invalid_response(method, format!("bad quantity {n}"))),
        other => Err(Error::invalid_response(
            method,
            format!("expected quantity, got {other}"),
        )),
    }
}

/// Coerces an `eth_chainId` reply to a number.
///
/// # Errors
///
/// Returns [`Error::InvalidResponse`] if `value` is not a non-negative
/// integer, hex string or decimal string.
pub fn parse_chain_id(value: &Value) -> Result<u64, Error> {
    let parsed = match value {
        Value::String(s) => parse_u64(s.trim()),
        Value::Number(n) => n.as_u64(),
        _ => None,
    };
    parsed.ok_or_else(|| Error::invalid_response(ETH_CHAIN_ID, format!("bad chain id {value}")))
}

fn parse_u64(s: &str) -> Option<u64> {
    match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => s.parse().ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::RpcRequest;
    use crate::provider::stub::StubProvider;
    use serde_json::json;
    use std::sync::Arc;

    const ALICE: &str = "0x00000000000000000000000000000000000a11ce";

    fn wallet_with(stub: StubProvider) -> (Wallet, Arc<StubProvider>) {
        let stub = Arc::new(stub);
        (Wallet::new(Gateway::new(stub.clone())), stub)
    }

    #[tokio::test]
    async fn empty_account_list_is_not_an_error() {
        let (wallet, _) = wallet_with(StubProvider::new().reply("eth_accounts", json!([])));
        assert!(wallet.accounts().await.expect("ok").is_empty());
    }

    #[tokio::test]
    async fn accounts_are_parsed() {
        let (wallet, _) = wallet_with(StubProvider::new().reply("eth_accounts", json!([ALICE])));
        let accounts = wallet.accounts().await.expect("ok");
        assert_eq!(accounts, vec![ALICE.parse::<Address>().expect("address")]);
    }

    #[tokio::test]
    async fn no_provider_degrades_to_empty() {
        let wallet = Wallet::new(Gateway::disconnected());
        assert!(wallet.accounts().await.expect("ok").is_empty());
        assert_eq!(wallet.chain_id().await.expect("ok"), None);
        assert_eq!(
            wallet.balance(Address::ZERO, BlockTag::Latest).await.expect("ok"),
            None
        );
        assert_eq!(wallet.request_accounts().await, Authentication::Unavailable);
    }

    #[tokio::test]
    async fn rejected_authentication_is_caught() {
        let (wallet, _) = wallet_with(
            StubProvider::new().fail("eth_requestAccounts", ProviderError::rpc(4001, "User rejected")),
        );
        match wallet.request_accounts().await {
            Authentication::Denied(error) => assert!(error.is_user_rejection()),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn granted_authentication() {
        let (wallet, _) = wallet_with(StubProvider::new().reply("eth_requestAccounts", json!([ALICE])));
        assert!(matches!(
            wallet.request_accounts().await,
            Authentication::Granted(accounts) if accounts.len() == 1
        ));
    }

    #[tokio::test]
    async fn balance_defaults_to_latest_and_parses_hex() {
        let (wallet, stub) =
            wallet_with(StubProvider::new().reply("eth_getBalance", json!("0xde0b6b3a7640000")));
        let address: Address = ALICE.parse().expect("address");

        let balance = wallet
            .balance(address, BlockTag::default())
            .await
            .expect("ok");

        assert_eq!(balance, Some(U256::from(1_000_000_000_000_000_000_u128)));
        assert_eq!(
            stub.calls(),
            vec![RpcRequest::with_params(
                "eth_getBalance",
                vec![json!(address.to_string()), json!("latest")],
            )]
        );
    }

    #[tokio::test]
    async fn malformed_balance_is_invalid_response() {
        let (wallet, _) = wallet_with(StubProvider::new().reply("eth_getBalance", json!({"oops": 1})));
        let error = wallet
            .balance(Address::ZERO, BlockTag::Latest)
            .await
            .expect_err("invalid");
        assert!(matches!(error, Error::InvalidResponse { method: "eth_getBalance", .. }));
    }

    #[tokio::test]
    async fn chain_id_coercion() {
        for (reply, expected) in [(json!("0x1"), 1), (json!("137"), 137), (json!(10), 10)] {
            let (wallet, _) = wallet_with(StubProvider::new().reply("eth_chainId", reply));
            assert_eq!(wallet.chain_id().await.expect("ok"), Some(expected));
        }
    }

    #[test]
    fn chain_id_rejects_garbage() {
        assert!(parse_chain_id(&json!("0xzz")).is_err());
        assert!(parse_chain_id(&json!(-1)).is_err());
        assert!(parse_chain_id(&json!(null)).is_err());
    }

    #[test]
    fn block_tag_wire_format() {
        assert_eq!(BlockTag::Latest.to_string(), "latest");
        assert_eq!(BlockTag::Number(255).to_string(), "0xff");
        assert_eq!("0x10".parse::<BlockTag>(), Ok(BlockTag::Number(16)));
        assert_eq!("finalized".parse::<BlockTag>(), Ok(BlockTag::Finalized));
        assert!("tomorrow".parse::<BlockTag>().is_err());
    }
}
