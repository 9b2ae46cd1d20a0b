use std::{fmt::Debug, sync::Arc, time::Duration};

use async_trait::async_trait;
use solana_sdk::{
    account::Account,
    commitment_config::CommitmentConfig,
    hash::Hash,
    instruction::Instruction,
    pubkey::Pubkey,
    signature::{Keypair, Signature, Signer},
    transaction::Transaction,
};

use crate::{
    das::{Asset, AssetList, AssetSorting},
    rpc::errors::RpcError,
};

#[derive(Clone)]
pub struct RpcConnectionConfig {
    pub url: String,
    pub commitment_config: Option<CommitmentConfig>,
    pub identity: Arc<Keypair>,
    pub confirm_timeout: Duration,
}

impl Debug for RpcConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcConnectionConfig")
            .field("url", &self.url)
            .field("commitment_config", &self.commitment_config)
            .field("identity", &self.identity.pubkey())
            .field("confirm_timeout", &self.confirm_timeout)
            .finish()
    }
}

impl RpcConnectionConfig {
    pub fn new(url: String, identity: Arc<Keypair>) -> Self {
        Self {
            url,
            commitment_config: None,
            identity,
            confirm_timeout: Duration::from_secs(60),
        }
    }

    pub fn with_url(&self, url: String) -> Self {
        Self {
            url,
            ..self.clone()
        }
    }
}

/// Inner instructions the runtime recorded for one top-level instruction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InnerInstructionSet {
    pub index: u8,
    pub instructions: Vec<InnerInstruction>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InnerInstruction {
    pub program_id: Pubkey,
    pub data: Vec<u8>,
}

/// Network capability shared by every action. Nothing else in the crate
/// performs network I/O.
#[async_trait]
pub trait RpcConnection: Send + Sync + Debug + 'static {
    fn new(config: RpcConnectionConfig) -> Self
    where
        Self: Sized;

    fn get_url(&self) -> String;

    /// Operator signer bound to this connection. Pays fees for every
    /// operator transaction.
    fn identity(&self) -> &Keypair;

    fn commitment(&self) -> CommitmentConfig;

    async fn health(&self) -> Result<(), RpcError>;
    async fn get_latest_blockhash(&self) -> Result<Hash, RpcError>;
    async fn get_account(&self, address: Pubkey) -> Result<Option<Account>, RpcError>;
    async fn get_minimum_balance_for_rent_exemption(
        &self,
        data_len: usize,
    ) -> Result<u64, RpcError>;

    /// Submits without waiting for any commitment.
    async fn send_transaction(&self, transaction: &Transaction) -> Result<Signature, RpcError>;

    /// Waits until `signature` reaches `commitment`, or fails if the
    /// transaction errored or the confirmation window elapsed.
    async fn confirm_transaction(
        &self,
        signature: &Signature,
        commitment: CommitmentConfig,
    ) -> Result<(), RpcError>;

    async fn send_and_confirm_transaction(
        &self,
        transaction: &Transaction,
        commitment: CommitmentConfig,
    ) -> Result<Signature, RpcError> {
        let signature = self.send_transaction(transaction).await?;
        self.confirm_transaction(&signature, commitment).await?;
        Ok(signature)
    }

    /// Signs `instructions` with the identity as fee payer plus
    /// `extra_signers`, then sends and confirms at `commitment`.
    async fn create_and_send_transaction(
        &self,
        instructions: &[Instruction],
        extra_signers: &[&Keypair],
        commitment: CommitmentConfig,
    ) -> Result<Signature, RpcError> {
        let blockhash = self.get_latest_blockhash().await?;
        let identity = self.identity();
        let mut signers: Vec<&Keypair> = Vec::with_capacity(extra_signers.len() + 1);
        signers.push(identity);
        signers.extend_from_slice(extra_signers);
        let transaction = Transaction::new_signed_with_payer(
            instructions,
            Some(&identity.pubkey()),
            &signers,
            blockhash,
        );
        self.send_and_confirm_transaction(&transaction, commitment)
            .await
    }

    async fn get_inner_instructions(
        &self,
        signature: &Signature,
        commitment: CommitmentConfig,
    ) -> Result<Vec<InnerInstructionSet>, RpcError>;

    async fn get_assets_by_owner(
        &self,
        owner: &Pubkey,
        sort_by: Option<AssetSorting>,
        page: u32,
        limit: u32,
    ) -> Result<AssetList, RpcError>;

    async fn get_asset(&self, id: &Pubkey) -> Result<Asset, RpcError>;
}
