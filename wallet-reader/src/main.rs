//! Wallet Reader CLI
//!
//! Shows the address, balance and active chain of a wallet reachable over
//! JSON-RPC.
//!
//! ```sh
//! wallet-reader init                 # Generate default wallet-reader.toml
//! wallet-reader --rpc-url http://127.0.0.1:8545 status
//! wallet-reader chains --id 0x89
//! ```

mod cmd;
mod signal;
mod telemetry;

use clap::Parser;
use cmd::{Cli, Commands, Session};
use dotenvy::dotenv;
use telemetry::Telemetry;
use wallet_reader::error::Error;

#[tokio::main]
#[allow(clippy::print_stderr)]
async fn main() {
    // Load .env variables
    dotenv().ok();
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Error> {
    if let Commands::Init { output, force } = &cli.command {
        return cmd::init::run(output, *force);
    }

    let config = cli.global.load()?;
    let _telemetry = Telemetry::new()
        .with_name(env!("CARGO_PKG_NAME"))
        .with_version(env!("CARGO_PKG_VERSION"))
        .with_log_level(config.log_level.clone())
        .register();

    let session = Session::open(config)?;
    match cli.command {
        Commands::Init { .. } => Ok(()),
        Commands::Status => cmd::status::run(&session).await,
        Commands::Connect => cmd::connect::run(&session.wallet).await,
        Commands::Chains { id } => cmd::chains::run(&session.chains, id).await,
        Commands::Watch => cmd::watch::run(&session).await,
    }
}
