use async_trait::async_trait;
use solana_sdk::pubkey::Pubkey;
use thiserror::Error;

use super::{RpcConnection, RpcError};

/// Discriminator SPL Account Compression writes into the first byte of a
/// concurrent Merkle tree account.
pub const CONCURRENT_MERKLE_TREE_ACCOUNT_TYPE: u8 = 1;
pub const HEADER_VERSION_V1: u8 = 0;
/// `account_type` + `ConcurrentMerkleTreeHeaderData::V1`.
pub const CONCURRENT_MERKLE_TREE_HEADER_SIZE_V1: usize = 56;
/// `sequence_number`, `active_index` and `buffer_size`, all `u64`.
const TREE_PREFIX_SIZE: usize = 24;
const NODE_SIZE: usize = 32;

#[derive(Error, Debug)]
pub enum MerkleTreeExtError {
    #[error(transparent)]
    Rpc(#[from] RpcError),

    #[error("Merkle tree account {0} not found")]
    AccountNotFound(Pubkey),

    #[error("Merkle tree account is {actual} bytes, expected at least {expected}")]
    AccountTooSmall { expected: usize, actual: usize },

    #[error("Account is not a concurrent Merkle tree (account type {0})")]
    InvalidAccountType(u8),

    #[error("Unsupported Merkle tree header version {0}")]
    UnsupportedHeaderVersion(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConcurrentMerkleTreeHeader {
    pub max_buffer_size: u32,
    pub max_depth: u32,
    pub authority: Pubkey,
    pub creation_slot: u64,
}

/// Fixed-size prefix of an SPL concurrent Merkle tree account. The
/// changelog, rightmost proof and canopy that follow are not decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConcurrentMerkleTreeAccount {
    pub header: ConcurrentMerkleTreeHeader,
    /// Number of successful operations on the tree. Every mint appends one
    /// leaf, so this doubles as the mint counter.
    pub sequence_number: u64,
    pub active_index: u64,
    pub buffer_size: u64,
}

fn read_u32(data: &[u8], offset: usize) -> u32 {
    let mut bytes = [0u8; 4];
    bytes.copy_from_slice(&data[offset..offset + 4]);
    u32::from_le_bytes(bytes)
}

fn read_u64(data: &[u8], offset: usize) -> u64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&data[offset..offset + 8]);
    u64::from_le_bytes(bytes)
}

impl ConcurrentMerkleTreeAccount {
    pub fn from_bytes(data: &[u8]) -> Result<Self, MerkleTreeExtError> {
        let expected = CONCURRENT_MERKLE_TREE_HEADER_SIZE_V1 + TREE_PREFIX_SIZE;
        if data.len() < expected {
            return Err(MerkleTreeExtError::AccountTooSmall {
                expected,
                actual: data.len(),
            });
        }
        if data[0] != CONCURRENT_MERKLE_TREE_ACCOUNT_TYPE {
            return Err(MerkleTreeExtError::InvalidAccountType(data[0]));
        }
        if data[1] != HEADER_VERSION_V1 {
            return Err(MerkleTreeExtError::UnsupportedHeaderVersion(data[1]));
        }

        let mut authority = [0u8; 32];
        authority.copy_from_slice(&data[10..42]);
        let header = ConcurrentMerkleTreeHeader {
            max_buffer_size: read_u32(data, 2),
            max_depth: read_u32(data, 6),
            authority: Pubkey::new_from_array(authority),
            creation_slot: read_u64(data, 42),
        };

        let offset = CONCURRENT_MERKLE_TREE_HEADER_SIZE_V1;
        Ok(Self {
            header,
            sequence_number: read_u64(data, offset),
            active_index: read_u64(data, offset + 8),
            buffer_size: read_u64(data, offset + 16),
        })
    }
}

/// Bytes to allocate for a tree account of the given shape.
pub fn merkle_tree_account_size(max_depth: u32, max_buffer_size: u32, canopy_depth: u32) -> usize {
    let depth = max_depth as usize;
    // root + path + index (u32) + padding (u32)
    let changelog_entry = NODE_SIZE + NODE_SIZE * depth + 8;
    // proof + leaf + index (u32) + padding (u32)
    let rightmost_path = NODE_SIZE * depth + NODE_SIZE + 8;
    let canopy_nodes = (1usize << (canopy_depth + 1)).saturating_sub(2);

    CONCURRENT_MERKLE_TREE_HEADER_SIZE_V1
        + TREE_PREFIX_SIZE
        + changelog_entry * max_buffer_size as usize
        + rightmost_path
        + canopy_nodes * NODE_SIZE
}

/// Extension to the RPC connection for reading compressed NFT trees.
#[async_trait]
pub trait MerkleTreeExt: RpcConnection {
    async fn get_concurrent_merkle_tree(
        &self,
        pubkey: Pubkey,
    ) -> Result<ConcurrentMerkleTreeAccount, MerkleTreeExtError> {
        let account = self
            .get_account(pubkey)
            .await?
            .ok_or(MerkleTreeExtError::AccountNotFound(pubkey))?;
        ConcurrentMerkleTreeAccount::from_bytes(&account.data)
    }
}

impl<T: RpcConnection> MerkleTreeExt for T {}

#[cfg(test)]
pub(crate) fn tree_account_bytes(sequence_number: u64, authority: &Pubkey) -> Vec<u8> {
    let mut data = vec![0u8; merkle_tree_account_size(14, 64, 0)];
    data[0] = CONCURRENT_MERKLE_TREE_ACCOUNT_TYPE;
    data[1] = HEADER_VERSION_V1;
    data[2..6].copy_from_slice(&64u32.to_le_bytes());
    data[6..10].copy_from_slice(&14u32.to_le_bytes());
    data[10..42].copy_from_slice(authority.as_ref());
    data[42..50].copy_from_slice(&1234u64.to_le_bytes());
    data[56..64].copy_from_slice(&sequence_number.to_le_bytes());
    data[64..72].copy_from_slice(&(sequence_number % 64).to_le_bytes());
    data[72..80].copy_from_slice(&64u64.to_le_bytes());
    data
}
