use solana_sdk::pubkey::Pubkey;
use tracing::debug;

use crate::{
    constants::DAS_PAGE_LIMIT,
    das::{Asset, AssetSorting},
    errors::MintError,
    rpc::{RpcConnection, RpcError},
};

/// Enforces the per-wallet mint cap by counting the compressed assets a
/// wallet already holds from this tree and collection.
#[derive(Debug, Clone)]
pub struct WalletLimitChecker {
    tree: Pubkey,
    collection: Pubkey,
    per_wallet_limit: u64,
}

impl WalletLimitChecker {
    pub fn new(tree: Pubkey, collection: Pubkey, per_wallet_limit: u64) -> Self {
        Self {
            tree,
            collection,
            per_wallet_limit,
        }
    }

    pub fn per_wallet_limit(&self) -> u64 {
        self.per_wallet_limit
    }

    pub fn qualifies(&self, asset: &Asset) -> bool {
        asset.is_compressed_in(&self.tree) && asset.is_grouped_under(&self.collection)
    }

    pub async fn count_wallet_mints<R: RpcConnection>(
        &self,
        rpc: &R,
        owner: &Pubkey,
    ) -> Result<u64, RpcError> {
        let mut page = 1;
        let mut count = 0u64;
        loop {
            let list = rpc
                .get_assets_by_owner(
                    owner,
                    Some(AssetSorting::newest_first()),
                    page,
                    DAS_PAGE_LIMIT,
                )
                .await?;
            let fetched = list.items.len();
            count += list.items.iter().filter(|a| self.qualifies(a)).count() as u64;
            if fetched < DAS_PAGE_LIMIT as usize {
                break;
            }
            page += 1;
        }
        debug!("Wallet {} holds {} qualifying assets", owner, count);
        Ok(count)
    }

    /// Fails with `WalletLimitReached` once `owner` holds the cap or more.
    pub async fn check<R: RpcConnection>(&self, rpc: &R, owner: &Pubkey) -> Result<u64, MintError> {
        let owned = self.count_wallet_mints(rpc, owner).await?;
        if owned >= self.per_wallet_limit {
            return Err(MintError::WalletLimitReached {
                limit: self.per_wallet_limit,
                owned,
            });
        }
        Ok(owned)
    }
}
