use std::sync::{
    atomic::{AtomicU64, Ordering},
    RwLock,
};

use solana_sdk::pubkey::Pubkey;
use tracing::{debug, error};

use crate::rpc::{MerkleTreeExt, MerkleTreeExtError, RpcConnection, RpcError};

/// Tracks how many leaves the collection tree holds. The value shown is
/// always the last successful read of the tree's sequence number.
#[derive(Debug)]
pub struct MintCounter {
    tree: RwLock<Option<Pubkey>>,
    total: AtomicU64,
}

impl MintCounter {
    pub fn new(tree: Option<Pubkey>) -> Self {
        Self {
            tree: RwLock::new(tree),
            total: AtomicU64::new(0),
        }
    }

    pub fn tree(&self) -> Option<Pubkey> {
        match self.tree.read() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    pub fn total_minted(&self) -> u64 {
        self.total.load(Ordering::Acquire)
    }

    /// Reads the tree's sequence number. The cached total is only updated
    /// when the read succeeds.
    pub async fn read_total_minted<R: RpcConnection>(
        &self,
        rpc: &R,
    ) -> Result<u64, MerkleTreeExtError> {
        let Some(tree) = self.tree() else {
            return Err(MerkleTreeExtError::Rpc(RpcError::CustomError(
                "no Merkle tree configured".to_string(),
            )));
        };
        let account = rpc.get_concurrent_merkle_tree(tree).await?;
        self.total.store(account.sequence_number, Ordering::Release);
        debug!("Tree {} sequence number {}", tree, account.sequence_number);
        Ok(account.sequence_number)
    }

    /// Re-reads the tree account for display. Failures are logged and the
    /// previous value is kept.
    pub async fn refresh_total_minted<R: RpcConnection>(&self, rpc: &R) -> u64 {
        let Some(tree) = self.tree() else {
            debug!("No Merkle tree configured, skipping total minted refresh");
            return self.total_minted();
        };
        match self.read_total_minted(rpc).await {
            Ok(total) => total,
            Err(e) => {
                error!("Failed to fetch total minted from tree {}: {}", tree, e);
                self.total_minted()
            }
        }
    }

    /// Points the counter at another tree and refreshes it.
    pub async fn set_tree<R: RpcConnection>(&self, rpc: &R, tree: Pubkey) -> u64 {
        {
            let mut guard = match self.tree.write() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            *guard = Some(tree);
        }
        self.refresh_total_minted(rpc).await
    }
}
