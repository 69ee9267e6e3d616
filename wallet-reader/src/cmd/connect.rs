//! `wallet-reader connect`: ask the wallet for account access.

use wallet_reader::error::Error;
use wallet_reader::wallet::{Authentication, Wallet};

/// Execute the `connect` command.
///
/// A refusal is reported, not treated as a failure.
///
/// # Errors
///
/// Never fails; the `Result` keeps the command signatures uniform.
#[allow(clippy::print_stdout, clippy::unnecessary_wraps)]
pub async fn run(wallet: &Wallet) -> Result<(), Error> {
    match wallet.request_accounts().await {
        Authentication::Granted(accounts) => {
            println!("Access granted to {} account(s):", accounts.len());
            for account in accounts {
                println!("  {account}");
            }
        }
        Authentication::Denied(reason) if reason.is_user_rejection() => {
            println!("Access request rejected by the user.");
        }
        Authentication::Denied(reason) => println!("Access request failed: {reason}"),
        Authentication::Unavailable => println!("No wallet configured."),
    }
    Ok(())
}
