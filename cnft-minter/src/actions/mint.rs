use mpl_bubblegum::{
    instructions::MintToCollectionV1Builder,
    types::{Collection, Creator, MetadataArgs, TokenProgramVersion, TokenStandard},
};
use mpl_token_metadata::accounts::{MasterEdition, Metadata};
use solana_sdk::{
    commitment_config::CommitmentConfig,
    compute_budget::ComputeBudgetInstruction,
    instruction::Instruction,
    message::Message,
    pubkey::Pubkey,
    signature::{Signature, Signer},
    system_instruction, system_program,
    transaction::Transaction,
};
use tracing::{info, warn};

use super::{find_tree_config, MintPhase, MintRecord, MintedLeaf, Minter};
use crate::{
    constants::{
        BUBBLEGUM_PROGRAM_ID, COLLECTION_CPI_SEED, MINT_COMPUTE_UNIT_LIMIT,
        PAYMENT_COMPUTE_UNIT_PRICE, PUBLIC_MINT_SELLER_FEE_BASIS_POINTS,
        SPL_ACCOUNT_COMPRESSION_ID, SPL_NOOP_ID, TOKEN_METADATA_PROGRAM_ID,
    },
    errors::{ConfigError, MintError},
    leaf::{find_leaf_asset_id, parse_leaf_from_mint_to_collection},
    notification::Notification,
    rpc::RpcConnection,
    wallet::WalletAdapter,
};

/// Per-item metadata of a compressed NFT.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintItem {
    pub name: String,
    pub uri: String,
    pub seller_fee_basis_points: u16,
    pub collection_verified: bool,
}

fn find_bubblegum_signer() -> Pubkey {
    Pubkey::find_program_address(&[COLLECTION_CPI_SEED], &BUBBLEGUM_PROGRAM_ID).0
}

/// `mint_to_collection_v1` with `authority` as tree creator, collection
/// authority and sole verified creator.
pub fn mint_to_collection_instruction(
    authority: &Pubkey,
    leaf_owner: &Pubkey,
    merkle_tree: &Pubkey,
    collection_mint: &Pubkey,
    item: &MintItem,
) -> Instruction {
    let metadata = MetadataArgs {
        name: item.name.clone(),
        symbol: String::new(),
        uri: item.uri.clone(),
        seller_fee_basis_points: item.seller_fee_basis_points,
        primary_sale_happened: false,
        is_mutable: true,
        edition_nonce: None,
        token_standard: Some(TokenStandard::NonFungible),
        collection: Some(Collection {
            verified: item.collection_verified,
            key: *collection_mint,
        }),
        uses: None,
        token_program_version: TokenProgramVersion::Original,
        creators: vec![Creator {
            address: *authority,
            verified: true,
            share: 100,
        }],
    };

    MintToCollectionV1Builder::new()
        .tree_config(find_tree_config(merkle_tree))
        .leaf_owner(*leaf_owner)
        .leaf_delegate(*leaf_owner)
        .merkle_tree(*merkle_tree)
        .payer(*authority)
        .tree_creator_or_delegate(*authority)
        .collection_authority(*authority)
        .collection_authority_record_pda(None)
        .collection_mint(*collection_mint)
        .collection_metadata(Metadata::find_pda(collection_mint).0)
        .collection_edition(MasterEdition::find_pda(collection_mint).0)
        .bubblegum_signer(find_bubblegum_signer())
        .log_wrapper(SPL_NOOP_ID)
        .compression_program(SPL_ACCOUNT_COMPRESSION_ID)
        .token_metadata_program(TOKEN_METADATA_PROGRAM_ID)
        .system_program(system_program::ID)
        .metadata(metadata)
        .instruction()
}

/// Priority fee plus the SOL transfer paying for one mint.
pub fn payment_instructions(payer: &Pubkey, recipient: &Pubkey, lamports: u64) -> Vec<Instruction> {
    vec![
        ComputeBudgetInstruction::set_compute_unit_price(PAYMENT_COMPUTE_UNIT_PRICE),
        system_instruction::transfer(payer, recipient, lamports),
    ]
}

impl<R: RpcConnection> Minter<R> {
    /// Mints one compressed NFT to the operator, using the collection's own
    /// name and URI.
    pub async fn mint_to_collection(&self) -> Result<MintedLeaf, MintError> {
        let result = self.admin_mint().await;
        if let Err(e) = &result {
            self.notifier.report_mint_error(e);
        }
        result
    }

    async fn admin_mint(&self) -> Result<MintedLeaf, MintError> {
        let rpc = self.rpc();
        let identity = rpc.identity().pubkey();
        let _permit = self.in_flight.try_acquire(identity)?;
        let tree = self.tree()?;
        let collection = self.config.require_collection()?;

        let item = MintItem {
            name: self.config.collection_name.clone(),
            uri: self.config.collection_uri.clone(),
            seller_fee_basis_points: 0,
            collection_verified: true,
        };
        let signature = self
            .send_mint_transaction(rpc.as_ref(), &identity, &tree, &collection, &item)
            .await?;
        rpc.confirm_transaction(&signature, CommitmentConfig::finalized())
            .await?;
        let minted = self
            .parse_minted_leaf(rpc.as_ref(), &signature, &tree)
            .await?;

        info!(
            "Minted asset {} (nonce {}) in {}",
            minted.asset_id,
            minted.leaf.nonce(),
            signature
        );
        self.notifier
            .notify(Notification::success("Mint successful!").with_txid(signature.to_string()));

        match rpc.get_asset(&minted.asset_id).await {
            Ok(asset) => info!("Indexed asset {}: {:?}", minted.asset_id, asset),
            Err(e) => warn!("Failed to fetch asset {}: {}", minted.asset_id, e),
        }
        self.counter.refresh_total_minted(rpc.as_ref()).await;
        Ok(minted)
    }

    /// Charges `wallet` the mint price and mints one compressed NFT to it.
    ///
    /// Validation failures stop before any transaction is built. If the
    /// payment confirms but the mint does not, the error is
    /// `MintAfterPayment` and nothing is refunded.
    pub async fn mint_with_payment<W: WalletAdapter>(
        &self,
        wallet: &W,
    ) -> Result<MintedLeaf, MintError> {
        self.set_last_minted(None);
        self.notifier.notify(Notification::info("Minting in progress..."));

        let result = self.public_mint(wallet).await;
        match &result {
            Ok(_) => self.set_phase(MintPhase::Done),
            Err(e) => {
                self.set_phase(MintPhase::Aborted);
                self.notifier.report_mint_error(e);
            }
        }
        result
    }

    async fn public_mint<W: WalletAdapter>(&self, wallet: &W) -> Result<MintedLeaf, MintError> {
        self.set_phase(MintPhase::ValidatingLimits);
        let owner = match wallet.public_key() {
            Some(owner) if wallet.can_sign() => owner,
            _ => return Err(MintError::WalletNotConnected),
        };
        let _permit = self.in_flight.try_acquire(owner)?;

        let rpc = self.rpc();
        let tree = self.tree()?;
        let collection = self.config.require_collection()?;
        let admin_wallet = self.config.admin_wallet.ok_or(ConfigError::MissingField {
            field: "admin_wallet",
        })?;
        let price = self.config.price_lamports.ok_or(ConfigError::MissingField {
            field: "per_nft_price",
        })?;

        let total_minted = self.counter.read_total_minted(rpc.as_ref()).await?;
        if total_minted >= self.config.max_supply {
            return Err(MintError::SoldOut {
                total_minted,
                max_supply: self.config.max_supply,
            });
        }
        self.wallet_limit_checker()?
            .check(rpc.as_ref(), &owner)
            .await?;

        self.set_phase(MintPhase::PayingSol);
        let blockhash = rpc.get_latest_blockhash().await?;
        let message = Message::new(
            &payment_instructions(&owner, &admin_wallet, price),
            Some(&owner),
        );
        let mut payment_tx = Transaction::new_unsigned(message);
        payment_tx.message.recent_blockhash = blockhash;

        self.notifier.notify(Notification::info("Processing payment..."));
        let payment = wallet.send_transaction(payment_tx, rpc.as_ref()).await?;
        info!("Payment of {} lamports from {} sent: {}", price, owner, payment);

        self.set_phase(MintPhase::WaitingPaymentConfirm);
        rpc.confirm_transaction(&payment, CommitmentConfig::confirmed())
            .await?;

        self.mint_after_payment(rpc.as_ref(), &owner, &tree, &collection, total_minted)
            .await
            .map_err(|source| MintError::MintAfterPayment {
                payment,
                source: Box::new(source),
            })
    }

    async fn mint_after_payment(
        &self,
        rpc: &R,
        owner: &Pubkey,
        tree: &Pubkey,
        collection: &Pubkey,
        number: u64,
    ) -> Result<MintedLeaf, MintError> {
        self.set_phase(MintPhase::SubmittingMint);
        self.notifier.notify(Notification::info("Minting NFT..."));

        let name = self.config.item_name(number);
        let item = MintItem {
            name: name.clone(),
            uri: self.config.item_metadata_uri(number),
            seller_fee_basis_points: PUBLIC_MINT_SELLER_FEE_BASIS_POINTS,
            collection_verified: false,
        };
        let signature = self
            .send_mint_transaction(rpc, owner, tree, collection, &item)
            .await?;

        self.set_phase(MintPhase::WaitingMintFinalized);
        rpc.confirm_transaction(&signature, CommitmentConfig::finalized())
            .await?;

        self.set_phase(MintPhase::ParsingResult);
        let minted = self.parse_minted_leaf(rpc, &signature, tree).await?;
        self.set_last_minted(Some(MintRecord {
            asset_id: minted.asset_id,
            name: name.clone(),
            image_url: self.config.item_image_uri(number),
        }));
        info!(
            "Minted {} as asset {} to {} in {}",
            name, minted.asset_id, owner, signature
        );

        self.counter.refresh_total_minted(rpc).await;
        self.notifier.notify(
            Notification::success(format!("Minted {}!", name)).with_txid(signature.to_string()),
        );
        Ok(minted)
    }

    /// Signs with the operator and submits without waiting.
    async fn send_mint_transaction(
        &self,
        rpc: &R,
        leaf_owner: &Pubkey,
        tree: &Pubkey,
        collection: &Pubkey,
        item: &MintItem,
    ) -> Result<Signature, MintError> {
        let identity = rpc.identity();
        let instructions = [
            ComputeBudgetInstruction::set_compute_unit_limit(MINT_COMPUTE_UNIT_LIMIT),
            mint_to_collection_instruction(
                &identity.pubkey(),
                leaf_owner,
                tree,
                collection,
                item,
            ),
        ];
        let blockhash = rpc.get_latest_blockhash().await?;
        let transaction = Transaction::new_signed_with_payer(
            &instructions,
            Some(&identity.pubkey()),
            &[identity],
            blockhash,
        );
        Ok(rpc.send_transaction(&transaction).await?)
    }

    async fn parse_minted_leaf(
        &self,
        rpc: &R,
        signature: &Signature,
        tree: &Pubkey,
    ) -> Result<MintedLeaf, MintError> {
        let inner = rpc
            .get_inner_instructions(signature, CommitmentConfig::finalized())
            .await?;
        let leaf = parse_leaf_from_mint_to_collection(&inner)?;
        let asset_id = find_leaf_asset_id(tree, leaf.nonce());
        Ok(MintedLeaf {
            signature: *signature,
            leaf,
            asset_id,
        })
    }
}
