use std::{fmt, path::Path};

use async_trait::async_trait;
use solana_sdk::{
    pubkey::Pubkey,
    signature::{read_keypair_file, Keypair, Signature, Signer},
    transaction::Transaction,
};
use thiserror::Error;

use crate::rpc::{RpcConnection, RpcError};

#[derive(Error, Debug)]
pub enum WalletError {
    #[error("Wallet not connected")]
    NotConnected,

    #[error("User rejected the request: {0}")]
    UserRejected(String),

    #[error("Failed to sign transaction: {0}")]
    Signing(String),

    #[error("Failed to send transaction: {0}")]
    SendTransaction(#[from] RpcError),

    #[error("Failed to load wallet: {0}")]
    Load(String),
}

impl WalletError {
    pub fn is_send_transaction_error(&self) -> bool {
        matches!(self, WalletError::SendTransaction(_))
    }
}

/// End-user wallet that pays for public mints.
#[async_trait]
pub trait WalletAdapter: Send + Sync {
    fn public_key(&self) -> Option<Pubkey>;

    fn can_sign(&self) -> bool;

    fn is_connected(&self) -> bool {
        self.public_key().is_some() && self.can_sign()
    }

    /// Signs `transaction` over its recent blockhash and submits it through
    /// `rpc`. Does not wait for confirmation.
    async fn send_transaction<R: RpcConnection>(
        &self,
        transaction: Transaction,
        rpc: &R,
    ) -> Result<Signature, WalletError>;
}

/// Wallet backed by a local keypair, e.g. a `solana-keygen` JSON file.
#[derive(Default)]
pub struct KeypairWallet {
    keypair: Option<Keypair>,
}

impl fmt::Debug for KeypairWallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeypairWallet")
            .field("pubkey", &self.public_key())
            .finish()
    }
}

impl KeypairWallet {
    pub fn connected(keypair: Keypair) -> Self {
        Self {
            keypair: Some(keypair),
        }
    }

    pub fn disconnected() -> Self {
        Self { keypair: None }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, WalletError> {
        let keypair = read_keypair_file(path.as_ref()).map_err(|e| {
            WalletError::Load(format!("{}: {}", path.as_ref().display(), e))
        })?;
        Ok(Self::connected(keypair))
    }
}

#[async_trait]
impl WalletAdapter for KeypairWallet {
    fn public_key(&self) -> Option<Pubkey> {
        self.keypair.as_ref().map(|k| k.pubkey())
    }

    fn can_sign(&self) -> bool {
        self.keypair.is_some()
    }

    async fn send_transaction<R: RpcConnection>(
        &self,
        mut transaction: Transaction,
        rpc: &R,
    ) -> Result<Signature, WalletError> {
        let keypair = self.keypair.as_ref().ok_or(WalletError::NotConnected)?;
        let blockhash = transaction.message.recent_blockhash;
        transaction
            .try_sign(&[keypair], blockhash)
            .map_err(|e| WalletError::Signing(e.to_string()))?;
        Ok(rpc.send_transaction(&transaction).await?)
    }
}
