use solana_sdk::{pubkey::Pubkey, signature::Signature};
use thiserror::Error;

use crate::{
    keypair::KeypairError,
    leaf::LeafParseError,
    rpc::{MerkleTreeExtError, RpcError},
    wallet::WalletError,
};

#[derive(Error, Debug)]
pub enum MinterError {
    #[error("Initialization error: {0}")]
    Init(#[from] InitError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Mint(#[from] MintError),

    #[error("RPC error: {0}")]
    Rpc(#[from] RpcError),

    #[error(transparent)]
    Wallet(#[from] WalletError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("Invalid pubkey: {field} - {error}")]
    InvalidPubkey { field: &'static str, error: String },

    #[error("Invalid price: {0}")]
    InvalidPrice(String),

    #[error("Invalid value for {field}: {error}")]
    InvalidValue { field: &'static str, error: String },
}

/// Startup failures, split so callers can tell bad key material from an
/// unreachable endpoint.
#[derive(Error, Debug)]
pub enum InitError {
    #[error("Operator key material is invalid: {0}")]
    KeyMaterial(#[from] KeypairError),

    #[error("Network unreachable at {url}: {source}")]
    NetworkUnreachable {
        url: String,
        #[source]
        source: RpcError,
    },
}

#[derive(Error, Debug)]
pub enum MintError {
    #[error("Wallet not connected!")]
    WalletNotConnected,

    #[error("All NFTs minted!")]
    SoldOut { total_minted: u64, max_supply: u64 },

    #[error("Max {limit} NFTs per wallet")]
    WalletLimitReached { limit: u64, owned: u64 },

    #[error("A mint for wallet {0} is already in progress")]
    MintInProgress(Pubkey),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Wallet(#[from] WalletError),

    #[error("{0}")]
    Rpc(#[from] RpcError),

    #[error("{0}")]
    MerkleTree(#[from] MerkleTreeExtError),

    #[error("{0}")]
    LeafParse(#[from] LeafParseError),

    /// The payment landed but the mint did not. Nothing is refunded.
    #[error("Mint failed after payment {payment} was confirmed: {source}")]
    MintAfterPayment {
        payment: Signature,
        #[source]
        source: Box<MintError>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The user dismissed a signing prompt. Logged, never shown.
    UserCancelled,
    /// A precondition failed before any transaction was built.
    Validation,
    /// RPC, indexer or transaction failure.
    Network,
    /// Payment confirmed, mint failed.
    PartialCompletion,
}

fn message_is_rejection(message: &str) -> bool {
    // Covers "User rejected the request" and wallet-specific variants.
    message.to_lowercase().contains("rejected")
}

impl MintError {
    pub fn wallet_error(&self) -> Option<&WalletError> {
        match self {
            MintError::Wallet(e) => Some(e),
            _ => None,
        }
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            MintError::WalletNotConnected
            | MintError::SoldOut { .. }
            | MintError::WalletLimitReached { .. }
            | MintError::MintInProgress(_)
            | MintError::Config(_) => ErrorClass::Validation,
            MintError::Wallet(WalletError::UserRejected(_)) => ErrorClass::UserCancelled,
            MintError::Wallet(WalletError::NotConnected) => ErrorClass::Validation,
            MintError::MintAfterPayment { .. } => ErrorClass::PartialCompletion,
            other if message_is_rejection(&other.to_string()) => ErrorClass::UserCancelled,
            _ => ErrorClass::Network,
        }
    }
}

impl MinterError {
    pub fn class(&self) -> ErrorClass {
        match self {
            MinterError::Mint(e) => e.class(),
            MinterError::Wallet(WalletError::UserRejected(_)) => ErrorClass::UserCancelled,
            MinterError::Config(_) => ErrorClass::Validation,
            other if message_is_rejection(&other.to_string()) => ErrorClass::UserCancelled,
            _ => ErrorClass::Network,
        }
    }

    pub fn is_user_rejection(&self) -> bool {
        self.class() == ErrorClass::UserCancelled
    }

    /// Errors raised by the end-user wallet rather than by the operator
    /// signer or the network.
    pub fn wallet_error(&self) -> Option<&WalletError> {
        match self {
            MinterError::Wallet(e) => Some(e),
            MinterError::Mint(e) => e.wallet_error(),
            _ => None,
        }
    }
}
