//! CLI definitions and command implementations for the wallet reader.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};

use wallet_reader::chains::{ChainDirectory, HttpChainSource};
use wallet_reader::config::{Config, load_config};
use wallet_reader::error::Error;
use wallet_reader::gateway::Gateway;
use wallet_reader::provider::{HttpProvider, Provider};
use wallet_reader::wallet::Wallet;

pub mod chains;
pub mod connect;
pub mod init;
pub mod status;
pub mod watch;

/// Wallet Reader: address, balance and active chain of a connected wallet.
#[derive(Debug, Parser)]
#[command(name = "wallet-reader")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Options shared by every command.
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every command.
#[derive(Debug, Args)]
pub struct GlobalArgs {
    /// Path to the TOML configuration file. Defaults apply when omitted.
    #[arg(short, long, global = true, env = "WALLET_READER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Wallet JSON-RPC endpoint, overriding `rpc_url` from the config file.
    #[arg(long, global = true, env = "WALLET_READER_RPC_URL")]
    pub rpc_url: Option<String>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Generate a default TOML configuration file.
    Init {
        /// Output path for the configuration file.
        #[arg(short, long, default_value = "wallet-reader.toml")]
        output: PathBuf,

        /// Overwrite the file if it already exists.
        #[arg(long, default_value_t = false)]
        force: bool,
    },

    /// Show wallet state, address, balance and chain.
    Status,

    /// Ask the wallet for account access.
    Connect,

    /// List the chain directory, or show one chain.
    Chains {
        /// Only show the chain with this id (decimal or 0x-hex).
        #[arg(long, value_parser = parse_chain_id_arg)]
        id: Option<u64>,
    },

    /// Print account changes until interrupted.
    Watch,
}

fn parse_chain_id_arg(raw: &str) -> Result<u64, String> {
    wallet_reader::wallet::parse_chain_id(&serde_json::Value::String(raw.to_owned()))
        .map_err(|e| e.to_string())
}

impl GlobalArgs {
    /// Loads the config file (if any) and applies command-line overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be loaded.
    pub fn load(&self) -> Result<Config, Error> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => Config::default(),
        };
        if let Some(rpc_url) = &self.rpc_url {
            config.rpc_url = Some(rpc_url.clone());
        }
        Ok(config)
    }
}

/// Wallet accessors and chain directory built from configuration.
#[derive(Debug)]
pub struct Session {
    /// Resolved configuration.
    pub config: Config,
    /// Wallet accessors; disconnected when no `rpc_url` is configured.
    pub wallet: Wallet,
    /// Chain directory, empty until first use.
    pub chains: ChainDirectory,
}

impl Session {
    /// Wires provider, gateway and directory together.
    ///
    /// # Errors
    ///
    /// Returns an error if a URL is invalid or an HTTP client cannot be built.
    pub fn open(config: Config) -> Result<Self, Error> {
        let provider = match config.rpc_url()? {
            Some(url) => {
                tracing::debug!(host = url.host_str().unwrap_or_default(), "using HTTP provider");
                let provider = HttpProvider::new(url)
                    .map_err(|e| Error::config_with("failed to create provider", e))?
                    .with_poll_interval(config.poll_interval());
                Some(Arc::new(provider) as Arc<dyn Provider>)
            }
            None => {
                tracing::debug!("no rpc_url configured, running without a wallet");
                None
            }
        };
        let wallet = Wallet::new(Gateway::from_option(provider));
        let chains = ChainDirectory::new(Arc::new(HttpChainSource::new(config.chains_url()?)?));
        Ok(Self {
            config,
            wallet,
            chains,
        })
    }
}
