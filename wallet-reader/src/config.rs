//! Configuration loading and default template generation.
//!
//! This module provides:
//!
//! - [`Config`] — wallet reader settings.
//! - [`load_config`] — Reads and parses a TOML configuration file.
//! - [`generate_default_config`] — Produces a commented TOML template.
//!
//! # Configuration File Format
//!
//! ```toml
//! rpc_url = "$WALLET_RPC_URL"
//! chains_url = "https://chainid.network/chains.json"
//! block_tag = "latest"
//! poll_interval_secs = 4
//! log_level = "info"
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::chains::DEFAULT_CHAINS_URL;
use crate::error::Error;
use crate::wallet::BlockTag;

/// Wallet reader settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// JSON-RPC endpoint of the wallet. Absent means "no wallet installed".
    ///
    /// Supports environment variable references: `"$VAR"` or `"${VAR}"`.
    #[serde(default)]
    pub rpc_url: Option<String>,
    /// Chain directory location.
    #[serde(default = "default_chains_url")]
    pub chains_url: String,
    /// Block at which balances are read.
    #[serde(default)]
    pub block_tag: BlockTag,
    /// Interval between account polls when watching (default: 4).
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// Log filter used when `RUST_LOG` is not set (default: `info`).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_chains_url() -> String {
    DEFAULT_CHAINS_URL.to_owned()
}

const fn default_poll_interval_secs() -> u64 {
    4
}

fn default_log_level() -> String {
    "info".to_owned()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rpc_url: None,
            chains_url: default_chains_url(),
            block_tag: BlockTag::default(),
            poll_interval_secs: default_poll_interval_secs(),
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// Resolved wallet endpoint, `None` when not configured.
    ///
    /// # Errors
    ///
    /// Returns an error if a referenced environment variable is missing or
    /// the result is not a valid URL.
    pub fn rpc_url(&self) -> Result<Option<Url>, Error> {
        self.rpc_url
            .as_deref()
            .map(|raw| parse_url("rpc_url", &resolve_env(raw)?))
            .transpose()
    }

    /// Resolved chain directory URL.
    ///
    /// # Errors
    ///
    /// Returns an error if a referenced environment variable is missing or
    /// the result is not a valid URL.
    pub fn chains_url(&self) -> Result<Url, Error> {
        parse_url("chains_url", &resolve_env(&self.chains_url)?)
    }

    /// Account polling interval.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Checks values the type system does not rule out.
    ///
    /// # Errors
    ///
    /// Returns an error if `poll_interval_secs` is zero.
    pub fn validate(&self) -> Result<(), Error> {
        if self.poll_interval_secs == 0 {
            return Err(Error::config("poll_interval_secs must be at least 1"));
        }
        Ok(())
    }
}

fn parse_url(key: &str, value: &str) -> Result<Url, Error> {
    // Don't echo the value: RPC URLs routinely carry API keys.
    Url::parse(value).map_err(|e| Error::config_with(format!("invalid {key}"), e))
}

/// Resolve an environment-variable reference (`$VAR` or `${VAR}`), returning
/// the literal string unchanged if it does not match either pattern.
fn resolve_env(value: &str) -> Result<String, Error> {
    let var_name = if let Some(inner) = value.strip_prefix("${").and_then(|v| v.strip_suffix('}'))
    {
        Some(inner)
    } else {
        value
            .strip_prefix('$')
            .filter(|name| !name.is_empty() && name.chars().all(|c| c.is_alphanumeric() || c == '_'))
    };

    match var_name {
        Some(name) => std::env::var(name).map_err(|_| {
            Error::config(format!(
                "env var '{name}' not found (referenced as '{value}')"
            ))
        }),
        None => Ok(value.to_owned()),
    }
}

/// Load configuration from a TOML file at the given path.
///
/// # Errors
///
/// Returns an error if the file cannot be resolved, read or parsed, or if
/// a value is out of range.
pub fn load_config(path: &Path) -> Result<Config, Error> {
    let config_path = path.canonicalize().map_err(|e| {
        Error::config_with(
            format!("failed to resolve config path '{}'", path.display()),
            e,
        )
    })?;
    let content = std::fs::read_to_string(&config_path).map_err(|e| {
        Error::config_with(
            format!("failed to read config file '{}'", config_path.display()),
            e,
        )
    })?;
    let config: Config = toml::from_str(&content).map_err(|e| {
        Error::config_with(
            format!("failed to parse TOML config '{}'", config_path.display()),
            e,
        )
    })?;
    config.validate()?;
    Ok(config)
}

/// Generate a default TOML configuration template.
#[must_use]
pub fn generate_default_config() -> String {
    format!(
        r#"# Wallet Reader Configuration

# JSON-RPC endpoint of the wallet. Leave unset to run without a wallet.
# Values support environment variable references: "$VAR" or "${{VAR}}"
# rpc_url = "$WALLET_RPC_URL"

# Public chain metadata directory, fetched once per run.
chains_url = "{DEFAULT_CHAINS_URL}"

# Block used for balance reads: latest, earliest, pending, safe, finalized or a number.
block_tag = "latest"

# Seconds between account checks in `watch`.
poll_interval_secs = 4

# Log filter used when RUST_LOG is not set.
log_level = "info"
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_template_parses_to_defaults() {
        let parsed: Config = toml::from_str(&generate_default_config()).expect("template");
        assert_eq!(parsed, Config::default());
    }

    #[test]
    fn empty_file_uses_defaults() {
        let parsed: Config = toml::from_str("").expect("empty");
        assert_eq!(parsed.rpc_url, None);
        assert_eq!(parsed.block_tag, BlockTag::Latest);
        assert_eq!(parsed.poll_interval(), Duration::from_secs(4));
        assert_eq!(
            parsed.chains_url().expect("url").as_str(),
            DEFAULT_CHAINS_URL
        );
    }

    #[test]
    fn full_file() {
        let parsed: Config = toml::from_str(
            r#"
            rpc_url = "http://127.0.0.1:8545"
            chains_url = "http://127.0.0.1:9000/chains.json"
            block_tag = "0x10"
            poll_interval_secs = 1
            log_level = "debug"
            "#,
        )
        .expect("config");

        assert_eq!(
            parsed.rpc_url().expect("url").map(String::from),
            Some("http://127.0.0.1:8545/".to_owned())
        );
        assert_eq!(parsed.block_tag, BlockTag::Number(16));
        assert_eq!(parsed.log_level, "debug");
    }

    #[test]
    fn zero_poll_interval_is_rejected() {
        let parsed: Config = toml::from_str("poll_interval_secs = 0").expect("parses");
        assert!(matches!(parsed.validate(), Err(Error::Config(_))));
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn load_config_validates() {
        let path = std::env::temp_dir().join(format!(
            "wallet-reader-zero-poll-{}.toml",
            std::process::id()
        ));
        std::fs::write(&path, "poll_interval_secs = 0\n").expect("write");
        let result = load_config(&path);
        std::fs::remove_file(&path).ok();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(toml::from_str::<Config>("rpc = \"http://x\"").is_err());
    }

    #[test]
    fn literal_values_pass_through() {
        assert_eq!(resolve_env("http://localhost").expect("literal"), "http://localhost");
        assert_eq!(resolve_env("$").expect("literal"), "$");
        assert_eq!(resolve_env("$not a var").expect("literal"), "$not a var");
    }

    #[test]
    fn env_references_resolve() {
        // PATH is set in every test environment.
        let path = std::env::var("PATH").expect("PATH");
        assert_eq!(resolve_env("$PATH").expect("resolved"), path);
        assert_eq!(resolve_env("${PATH}").expect("resolved"), path);
    }

    #[test]
    fn missing_env_reference_is_config_error() {
        let error = resolve_env("${WALLET_READER_SURELY_UNSET_VAR}").expect_err("missing");
        assert!(matches!(error, Error::Config(_)));
    }
}
