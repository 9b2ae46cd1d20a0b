use mpl_token_metadata::{
    accounts::{MasterEdition, Metadata},
    instructions::{CreateV1Builder, MintV1Builder},
    types::{CollectionDetails, PrintSupply, TokenStandard},
};
use solana_sdk::{
    instruction::Instruction,
    pubkey::Pubkey,
    signature::{Keypair, Signer},
    system_program, sysvar,
};
use tracing::info;

use super::{CollectionHandle, Minter};
use crate::{
    constants::ASSOCIATED_TOKEN_PROGRAM_ID, errors::MintError, notification::Notification,
    rpc::RpcConnection,
};

pub fn find_associated_token_address(owner: &Pubkey, mint: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(
        &[owner.as_ref(), spl_token::ID.as_ref(), mint.as_ref()],
        &ASSOCIATED_TOKEN_PROGRAM_ID,
    )
    .0
}

/// Creates a sized collection NFT at `mint` and mints its single token to
/// `authority`.
pub fn create_collection_instructions(
    authority: &Pubkey,
    mint: &Pubkey,
    name: &str,
    uri: &str,
) -> Vec<Instruction> {
    let metadata = Metadata::find_pda(mint).0;
    let master_edition = MasterEdition::find_pda(mint).0;
    let token = find_associated_token_address(authority, mint);

    let create = CreateV1Builder::new()
        .metadata(metadata)
        .master_edition(Some(master_edition))
        .mint(*mint, true)
        .authority(*authority)
        .payer(*authority)
        .update_authority(*authority, true)
        .system_program(system_program::ID)
        .sysvar_instructions(sysvar::instructions::ID)
        .spl_token_program(Some(spl_token::ID))
        .name(name.to_string())
        .uri(uri.to_string())
        .seller_fee_basis_points(0)
        .token_standard(TokenStandard::NonFungible)
        .collection_details(CollectionDetails::V1 { size: 0 })
        .print_supply(PrintSupply::Zero)
        .instruction();

    let mint_one = MintV1Builder::new()
        .token(token)
        .token_owner(Some(*authority))
        .metadata(metadata)
        .master_edition(Some(master_edition))
        .mint(*mint)
        .authority(*authority)
        .payer(*authority)
        .system_program(system_program::ID)
        .sysvar_instructions(sysvar::instructions::ID)
        .spl_token_program(spl_token::ID)
        .spl_ata_program(ASSOCIATED_TOKEN_PROGRAM_ID)
        .amount(1)
        .instruction();

    vec![create, mint_one]
}

impl<R: RpcConnection> Minter<R> {
    /// Creates a new collection NFT. Each call makes a fresh collection.
    pub async fn create_collection(&self) -> Result<CollectionHandle, MintError> {
        let result = self.send_create_collection().await;
        match &result {
            Ok(handle) => {
                info!(
                    "Created collection {} (metadata {}, edition {}) in {}",
                    handle.mint, handle.metadata, handle.master_edition, handle.signature
                );
                self.notifier.notify(
                    Notification::success("Collection created!")
                        .with_txid(handle.signature.to_string()),
                );
            }
            Err(e) => self.notifier.report_mint_error(e),
        }
        result
    }

    async fn send_create_collection(&self) -> Result<CollectionHandle, MintError> {
        let rpc = self.rpc();
        let identity = rpc.identity().pubkey();
        let mint = Keypair::new();

        let instructions = create_collection_instructions(
            &identity,
            &mint.pubkey(),
            &self.config.collection_name,
            &self.config.collection_uri,
        );
        let signature = rpc
            .create_and_send_transaction(&instructions, &[&mint], rpc.commitment())
            .await?;

        Ok(CollectionHandle {
            mint: mint.pubkey(),
            metadata: Metadata::find_pda(&mint.pubkey()).0,
            master_edition: MasterEdition::find_pda(&mint.pubkey()).0,
            signature,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::TOKEN_METADATA_PROGRAM_ID;

    #[test]
    fn test_collection_instructions_target_token_metadata() {
        let authority = Pubkey::new_unique();
        let mint = Pubkey::new_unique();
        let instructions =
            create_collection_instructions(&authority, &mint, "PUFF DOG Collection", "uri");

        assert_eq!(instructions.len(), 2);
        for ix in &instructions {
            assert_eq!(ix.program_id, TOKEN_METADATA_PROGRAM_ID);
        }
        let mint_meta = instructions[0]
            .accounts
            .iter()
            .find(|meta| meta.pubkey == mint)
            .unwrap();
        assert!(mint_meta.is_signer);
        assert!(instructions[1]
            .accounts
            .iter()
            .any(|meta| meta.pubkey == find_associated_token_address(&authority, &mint)));
    }
}
