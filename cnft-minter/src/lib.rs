pub mod actions;
pub mod cli;
pub mod config;
pub mod constants;
pub mod das;
pub mod errors;
pub mod in_flight;
pub mod keypair;
pub mod leaf;
pub mod mint_counter;
pub mod notification;
pub mod rpc;
pub mod telemetry;
pub mod wallet;
pub mod wallet_limit;

pub use actions::{CollectionHandle, MintPhase, MintRecord, MintedLeaf, Minter, TreeHandle};
pub use config::MinterConfig;
pub use errors::{MintError, MinterError};
pub use notification::{Notification, NotificationSink, Notifier, Severity, TracingSink};

use std::str::FromStr;

use solana_sdk::pubkey::Pubkey;
use tracing::info;

use crate::{
    cli::Commands,
    errors::ConfigError,
    rpc::RpcConnection,
    wallet::KeypairWallet,
};

/// Runs one CLI command against an initialized minter.
pub async fn run_command<R: RpcConnection>(
    minter: &Minter<R>,
    command: &Commands,
) -> Result<(), MinterError> {
    info!("Running {}", command.name());
    match command {
        Commands::CreateTree(_) => {
            let handle = minter.create_tree().await?;
            println!("MINTER_MERKLE_TREE={}", handle.merkle_tree);
            println!("tree config: {}", handle.tree_config);
            println!("signature: {}", handle.signature);
        }
        Commands::CreateCollection(_) => {
            let handle = minter.create_collection().await?;
            println!("MINTER_COLLECTION_MINT={}", handle.mint);
            println!("signature: {}", handle.signature);
        }
        Commands::MintToCollection(_) => {
            let minted = minter.mint_to_collection().await?;
            println!("asset id: {}", minted.asset_id);
            println!("signature: {}", minted.signature);
        }
        Commands::Mint(args) => {
            let wallet = match &args.wallet {
                Some(path) => KeypairWallet::from_file(path)?,
                None => KeypairWallet::disconnected(),
            };
            let minted = minter.mint_with_payment(&wallet).await?;
            if let Some(record) = minter.last_minted() {
                println!("name: {}", record.name);
                println!("image: {}", record.image_url);
            }
            println!("asset id: {}", minted.asset_id);
            println!("signature: {}", minted.signature);
        }
        Commands::Status(args) => {
            println!(
                "total minted: {} / {}",
                minter.total_minted(),
                minter.config().max_supply
            );
            if let Some(owner) = &args.owner {
                let owner = Pubkey::from_str(owner).map_err(|e| ConfigError::InvalidPubkey {
                    field: "owner",
                    error: e.to_string(),
                })?;
                let owned = minter.count_wallet_mints(&owner).await?;
                println!("minted by {}: {}", owner, owned);
            }
        }
    }
    Ok(())
}
