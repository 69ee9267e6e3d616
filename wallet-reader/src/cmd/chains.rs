//! `wallet-reader chains`: list the chain directory or show one chain.

use wallet_reader::chains::{ChainDirectory, ChainRecord};
use wallet_reader::error::Error;

/// Execute the `chains` command.
///
/// # Errors
///
/// Returns [`Error::DirectoryUnavailable`] if the directory cannot be fetched.
#[allow(clippy::print_stdout)]
pub async fn run(chains: &ChainDirectory, id: Option<u64>) -> Result<(), Error> {
    match id {
        Some(id) => match chains.chain_by_id(id).await? {
            Some(chain) => print_detail(chain),
            None => println!("Chain {id} not found"),
        },
        None => {
            for chain in chains.list_chains().await? {
                println!("{:>12}  {:<8} {}", chain.chain_id, chain.symbol(), chain.name);
            }
        }
    }
    Ok(())
}

#[allow(clippy::print_stdout)]
fn print_detail(chain: &ChainRecord) {
    println!("Name:     {}", chain.name);
    println!("Chain id: {}", chain.chain_id);
    if let Some(short_name) = &chain.short_name {
        println!("Short:    {short_name}");
    }
    println!(
        "Currency: {} ({}, {} decimals)",
        chain.native_currency.name,
        chain.symbol(),
        chain.decimals()
    );
    for rpc in &chain.rpc {
        println!("RPC:      {rpc}");
    }
    for explorer in &chain.explorers {
        println!("Explorer: {} {}", explorer.name, explorer.url);
    }
}
