//! `wallet-reader watch`: print account changes until interrupted.

use wallet_reader::error::Error;
use wallet_reader::state::{AccountUpdate, WalletState, watch_accounts};
use wallet_reader::units::to_display;

use super::Session;
use crate::signal::SigDown;

/// Execute the `watch` command.
///
/// # Errors
///
/// Returns an error if signal handlers cannot be registered.
#[allow(clippy::print_stdout)]
pub async fn run(session: &Session) -> Result<(), Error> {
    if !session.wallet.gateway().is_available() {
        println!("No wallet configured, nothing to watch.");
        return Ok(());
    }

    let sig_down =
        SigDown::try_new().map_err(|e| Error::config_with("failed to register signals", e))?;

    let initial = WalletState::resolve(&session.wallet).await;
    println!("{}", describe_state(&initial));

    // Balances print in the chain's units when it is known at start.
    let decimals = match session.chains.current_chain(&session.wallet).await {
        Ok(chain) => chain.map(|c| c.decimals()),
        Err(error) => {
            tracing::warn!(%error, "current chain unknown");
            None
        }
    }
    .unwrap_or(wallet_reader::units::DEFAULT_DECIMALS);

    let shutdown = sig_down.cancellation_token();
    let subscription = watch_accounts(
        &session.wallet,
        session.config.block_tag,
        move |update: AccountUpdate| {
            if shutdown.is_cancelled() {
                return;
            }
            let balance = update.balance.map_or_else(
                || "unavailable".to_owned(),
                |b| to_display(b, decimals).to_string(),
            );
            match update.state {
                WalletState::Connected { .. } => {
                    println!("{} balance: {balance}", describe_state(&update.state));
                }
                state => println!("{}", describe_state(&state)),
            }
        },
    );

    tracing::info!("watching account changes, Ctrl+C to stop");
    sig_down.recv().await;
    subscription.unsubscribe().await;
    Ok(())
}

fn describe_state(state: &WalletState) -> String {
    match state {
        WalletState::NotInstalled => "not installed".to_owned(),
        WalletState::NotAuthenticated => "not authenticated".to_owned(),
        WalletState::Connected { accounts } => accounts
            .first()
            .map_or_else(|| "connected".to_owned(), |a| format!("connected as {a}")),
    }
}
