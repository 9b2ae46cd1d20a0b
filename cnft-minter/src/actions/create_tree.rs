use mpl_bubblegum::instructions::CreateTreeConfigBuilder;
use solana_sdk::{
    instruction::Instruction,
    pubkey::Pubkey,
    signature::{Keypair, Signer},
    system_instruction, system_program,
};
use tracing::info;

use super::{find_tree_config, Minter, TreeHandle};
use crate::{
    constants::{
        SPL_ACCOUNT_COMPRESSION_ID, SPL_NOOP_ID, TREE_CANOPY_DEPTH, TREE_MAX_BUFFER_SIZE,
        TREE_MAX_DEPTH,
    },
    errors::MintError,
    notification::Notification,
    rpc::{merkle_tree::merkle_tree_account_size, RpcConnection},
};

/// Allocates the tree account and initializes its Bubblegum config with
/// `creator` as the private tree's authority.
pub fn create_tree_instructions(
    payer: &Pubkey,
    creator: &Pubkey,
    merkle_tree: &Pubkey,
    lamports: u64,
) -> Vec<Instruction> {
    let space = merkle_tree_account_size(TREE_MAX_DEPTH, TREE_MAX_BUFFER_SIZE, TREE_CANOPY_DEPTH);
    let allocate = system_instruction::create_account(
        payer,
        merkle_tree,
        lamports,
        space as u64,
        &SPL_ACCOUNT_COMPRESSION_ID,
    );
    let create_config = CreateTreeConfigBuilder::new()
        .tree_config(find_tree_config(merkle_tree))
        .merkle_tree(*merkle_tree)
        .payer(*payer)
        .tree_creator(*creator)
        .log_wrapper(SPL_NOOP_ID)
        .compression_program(SPL_ACCOUNT_COMPRESSION_ID)
        .system_program(system_program::ID)
        .max_depth(TREE_MAX_DEPTH)
        .max_buffer_size(TREE_MAX_BUFFER_SIZE)
        .public(false)
        .instruction();
    vec![allocate, create_config]
}

impl<R: RpcConnection> Minter<R> {
    pub async fn create_tree(&self) -> Result<TreeHandle, MintError> {
        let result = self.send_create_tree().await;
        match &result {
            Ok(handle) => {
                info!(
                    "Created Merkle tree {} (config {}, creator {}) in {}",
                    handle.merkle_tree, handle.tree_config, handle.tree_creator, handle.signature
                );
                self.notifier.notify(
                    Notification::success("Merkle tree created!")
                        .with_txid(handle.signature.to_string()),
                );
            }
            Err(e) => self.notifier.report_mint_error(e),
        }
        result
    }

    async fn send_create_tree(&self) -> Result<TreeHandle, MintError> {
        let rpc = self.rpc();
        let identity = rpc.identity().pubkey();
        let tree = Keypair::new();

        let space =
            merkle_tree_account_size(TREE_MAX_DEPTH, TREE_MAX_BUFFER_SIZE, TREE_CANOPY_DEPTH);
        let lamports = rpc.get_minimum_balance_for_rent_exemption(space).await?;
        let instructions = create_tree_instructions(&identity, &identity, &tree.pubkey(), lamports);

        let signature = rpc
            .create_and_send_transaction(&instructions, &[&tree], rpc.commitment())
            .await?;

        Ok(TreeHandle {
            tree_creator: identity,
            merkle_tree: tree.pubkey(),
            tree_config: find_tree_config(&tree.pubkey()),
            signature,
        })
    }
}
