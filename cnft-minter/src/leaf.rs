use borsh::{BorshDeserialize, BorshSerialize};
use solana_sdk::pubkey::Pubkey;
use thiserror::Error;

use crate::{
    constants::{ASSET_SEED, BUBBLEGUM_PROGRAM_ID},
    rpc::InnerInstructionSet,
};

/// Bytes preceding the leaf schema in the noop instruction Bubblegum emits:
/// `AccountCompressionEvent` tag, `ApplicationDataEvent` tag, the `u32`
/// vector length, then the Bubblegum event type and version.
pub const LEAF_EVENT_PREFIX_LEN: usize = 8;

/// Position of the leaf event among the inner instructions of
/// `mint_to_collection_v1`. The collection verification CPI precedes it.
pub const MINT_TO_COLLECTION_LEAF_EVENT_INDEX: usize = 1;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum LeafParseError {
    #[error("Transaction has no inner instructions")]
    NoInnerInstructions,

    #[error("Inner instruction {0} not found")]
    MissingInstruction(usize),

    #[error("Leaf event data is {0} bytes, too short to hold a leaf")]
    DataTooShort(usize),

    #[error("Failed to deserialize leaf schema: {0}")]
    Deserialize(String),
}

#[derive(BorshSerialize, BorshDeserialize, PartialEq, Eq, Debug, Clone)]
pub enum LeafSchema {
    V1 {
        id: Pubkey,
        owner: Pubkey,
        delegate: Pubkey,
        nonce: u64,
        data_hash: [u8; 32],
        creator_hash: [u8; 32],
    },
}

impl LeafSchema {
    pub fn id(&self) -> Pubkey {
        match self {
            LeafSchema::V1 { id, .. } => *id,
        }
    }

    pub fn owner(&self) -> Pubkey {
        match self {
            LeafSchema::V1 { owner, .. } => *owner,
        }
    }

    pub fn nonce(&self) -> u64 {
        match self {
            LeafSchema::V1 { nonce, .. } => *nonce,
        }
    }
}

/// Decodes the leaf emitted by a `mint_to_collection_v1` transaction.
pub fn parse_leaf_from_mint_to_collection(
    inner_instructions: &[InnerInstructionSet],
) -> Result<LeafSchema, LeafParseError> {
    let set = inner_instructions
        .first()
        .ok_or(LeafParseError::NoInnerInstructions)?;
    let instruction = set
        .instructions
        .get(MINT_TO_COLLECTION_LEAF_EVENT_INDEX)
        .ok_or(LeafParseError::MissingInstruction(
            MINT_TO_COLLECTION_LEAF_EVENT_INDEX,
        ))?;
    parse_leaf_event(&instruction.data)
}

pub fn parse_leaf_event(data: &[u8]) -> Result<LeafSchema, LeafParseError> {
    if data.len() <= LEAF_EVENT_PREFIX_LEN {
        return Err(LeafParseError::DataTooShort(data.len()));
    }
    // The leaf hash trails the schema, so the slice is not fully consumed.
    LeafSchema::deserialize(&mut &data[LEAF_EVENT_PREFIX_LEN..])
        .map_err(|e| LeafParseError::Deserialize(e.to_string()))
}

/// Asset id of the leaf at `nonce` in `merkle_tree`.
pub fn find_leaf_asset_id(merkle_tree: &Pubkey, nonce: u64) -> Pubkey {
    Pubkey::find_program_address(
        &[ASSET_SEED, merkle_tree.as_ref(), &nonce.to_le_bytes()],
        &BUBBLEGUM_PROGRAM_ID,
    )
    .0
}

#[cfg(test)]
pub(crate) fn leaf_event_bytes(leaf: &LeafSchema) -> Vec<u8> {
    let schema = leaf.try_to_vec().unwrap();
    let mut data = vec![1u8, 0u8];
    data.extend_from_slice(&((schema.len() + 2 + 32) as u32).to_le_bytes());
    // event type LeafSchemaEvent, version V1
    data.extend_from_slice(&[1u8, 0u8]);
    data.extend_from_slice(&schema);
    data.extend_from_slice(&[9u8; 32]);
    data
}
