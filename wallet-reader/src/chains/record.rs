//! Chain metadata records as published by the public chain directory.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::units::DEFAULT_DECIMALS;

/// Native currency of a chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeCurrency {
    /// Display name, e.g. `Ether`.
    #[serde(default)]
    pub name: String,
    /// Ticker symbol, e.g. `ETH`.
    pub symbol: String,
    /// Number of decimals between the smallest unit and the display unit.
    #[serde(default = "default_decimals")]
    pub decimals: u8,
}

const fn default_decimals() -> u8 {
    DEFAULT_DECIMALS
}

/// Block explorer entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Explorer {
    /// Explorer name.
    pub name: String,
    /// Base URL.
    #[serde(default)]
    pub url: String,
    /// Explorer API standard, e.g. `EIP3091`.
    #[serde(default)]
    pub standard: Option<String>,
}

/// One chain in the directory. Identity is [`ChainRecord::chain_id`].
///
/// Fields the directory adds beyond the ones modelled here are kept in
/// [`ChainRecord::extra`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainRecord {
    /// EIP-155 chain id.
    pub chain_id: u64,
    /// Human-readable name, e.g. `Ethereum Mainnet`.
    pub name: String,
    /// Chain family, e.g. `ETH`.
    #[serde(default)]
    pub chain: Option<String>,
    /// Short name, e.g. `eth`.
    #[serde(default)]
    pub short_name: Option<String>,
    /// Network id (often equal to the chain id).
    #[serde(default)]
    pub network_id: Option<u64>,
    /// Native currency.
    pub native_currency: NativeCurrency,
    /// Public RPC endpoints.
    #[serde(default, alias = "rpcUrls")]
    pub rpc: Vec<String>,
    /// Block explorers.
    #[serde(default)]
    pub explorers: Vec<Explorer>,
    /// Project homepage.
    #[serde(default, rename = "infoURL", alias = "infoUrl")]
    pub info_url: Option<String>,
    /// Faucet URLs.
    #[serde(default)]
    pub faucets: Vec<String>,
    /// Icon identifier.
    #[serde(default)]
    pub icon: Option<String>,
    /// SLIP-44 coin type.
    #[serde(default)]
    pub slip44: Option<u64>,
    /// Remaining fields, verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ChainRecord {
    /// Decimals of the native currency.
    #[must_use]
    pub const fn decimals(&self) -> u8 {
        self.native_currency.decimals
    }

    /// Ticker symbol of the native currency.
    #[must_use]
    pub fn symbol(&self) -> &str {
        &self.native_currency.symbol
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_directory_entry() {
        let record: ChainRecord = serde_json::from_value(json!({
            "name": "Ethereum Mainnet",
            "chain": "ETH",
            "icon": "ethereum",
            "rpc": ["https://cloudflare-eth.com"],
            "features": [{ "name": "EIP155" }, { "name": "EIP1559" }],
            "faucets": [],
            "nativeCurrency": { "name": "Ether", "symbol": "ETH", "decimals": 18 },
            "infoURL": "https://ethereum.org",
            "shortName": "eth",
            "chainId": 1,
            "networkId": 1,
            "slip44": 60,
            "ens": { "registry": "0x00000000000C2E074eC69A0dFb2997BA6C7d2e1e" },
            "explorers": [{ "name": "etherscan", "url": "https://etherscan.io", "standard": "EIP3091" }]
        }))
        .expect("valid record");

        assert_eq!(record.chain_id, 1);
        assert_eq!(record.symbol(), "ETH");
        assert_eq!(record.decimals(), 18);
        assert_eq!(record.short_name.as_deref(), Some("eth"));
        assert_eq!(record.explorers.len(), 1);
        assert_eq!(record.info_url.as_deref(), Some("https://ethereum.org"));
        assert!(record.extra.contains_key("ens"));
        assert!(record.extra.contains_key("features"));
    }

    #[test]
    fn rpc_urls_alias_and_default_decimals() {
        let record: ChainRecord = serde_json::from_value(json!({
            "chainId": 10,
            "name": "OP Mainnet",
            "nativeCurrency": { "symbol": "ETH" },
            "rpcUrls": ["https://mainnet.optimism.io"]
        }))
        .expect("valid record");

        assert_eq!(record.rpc, vec!["https://mainnet.optimism.io".to_owned()]);
        assert_eq!(record.decimals(), DEFAULT_DECIMALS);
    }
}
