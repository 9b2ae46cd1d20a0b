use std::fmt;

use solana_sdk::{
    pubkey::Pubkey,
    signature::{keypair_from_seed, Keypair, Signer},
};
use thiserror::Error;

pub const KEYPAIR_LENGTH: usize = 64;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum KeypairError {
    #[error("Secret key is not valid base58: {0}")]
    InvalidBase58(String),

    #[error("Secret key must be {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("Secret key bytes do not form a keypair: {0}")]
    Malformed(String),

    #[error("Public key half does not match the secret key")]
    PublicKeyMismatch,
}

/// Operator signing key decoded from configuration.
pub struct OperatorKey {
    keypair: Keypair,
}

impl fmt::Debug for OperatorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperatorKey")
            .field("pubkey", &self.keypair.pubkey())
            .finish_non_exhaustive()
    }
}

impl OperatorKey {
    /// Decodes a base58 `secret || public` key as exported by Phantom or
    /// `solana-keygen`.
    pub fn from_base58(encoded: &str) -> Result<Self, KeypairError> {
        let bytes = bs58::decode(encoded.trim())
            .into_vec()
            .map_err(|e| KeypairError::InvalidBase58(e.to_string()))?;
        Self::from_bytes(&bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeypairError> {
        if bytes.len() != KEYPAIR_LENGTH {
            return Err(KeypairError::InvalidLength {
                expected: KEYPAIR_LENGTH,
                actual: bytes.len(),
            });
        }
        let keypair =
            Keypair::from_bytes(bytes).map_err(|e| KeypairError::Malformed(e.to_string()))?;
        let derived = keypair_from_seed(&bytes[..32])
            .map_err(|e| KeypairError::Malformed(e.to_string()))?;
        if derived.pubkey() != keypair.pubkey() {
            return Err(KeypairError::PublicKeyMismatch);
        }
        Ok(Self { keypair })
    }

    pub fn pubkey(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    /// Full keypair buffer, secret half first.
    pub fn to_bytes(&self) -> [u8; KEYPAIR_LENGTH] {
        self.keypair.to_bytes()
    }

    pub fn into_keypair(self) -> Keypair {
        self.keypair
    }
}
