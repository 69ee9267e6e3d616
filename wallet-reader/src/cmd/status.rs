//! `wallet-reader status`: wallet state, address, balance and chain.

use wallet_reader::error::Error;
use wallet_reader::state::{AccountSummary, WalletState};
use wallet_reader::units::format_amount;

use super::Session;

/// Execute the `status` command.
///
/// # Errors
///
/// Returns provider failures from the balance or chain id reads.
#[allow(clippy::print_stdout)]
pub async fn run(session: &Session) -> Result<(), Error> {
    match WalletState::resolve(&session.wallet).await {
        WalletState::NotInstalled => {
            println!("Wallet: not installed");
            println!("Set rpc_url in the config file or pass --rpc-url.");
        }
        WalletState::NotAuthenticated => {
            println!("Wallet: detected, not authenticated");
            println!("Run `wallet-reader connect` to request account access.");
        }
        WalletState::Connected { accounts } => {
            println!("Wallet: connected ({} account(s))", accounts.len());
            let summary =
                AccountSummary::load(&session.wallet, &session.chains, session.config.block_tag)
                    .await?;
            match summary {
                Some(summary) => print_summary(&summary),
                None => println!("Accounts changed while reading, run again."),
            }
        }
    }
    Ok(())
}

#[allow(clippy::print_stdout)]
fn print_summary(summary: &AccountSummary) {
    let symbol = summary.symbol().unwrap_or("?");
    println!("Address: {}", summary.address);
    println!(
        "Balance: {} {symbol} ({})",
        summary.display_balance(),
        format_amount(summary.balance, summary.decimals())
    );
    match &summary.chain {
        Some(chain) => println!("Chain:   {} ({})", chain.name, chain.chain_id),
        None => println!("Chain:   unknown"),
    }
}
