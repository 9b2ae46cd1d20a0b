pub mod context;
pub mod errors;
pub mod merkle_tree;
mod rpc_connection;
pub mod solana_rpc;

pub use context::ChainContext;
pub use errors::RpcError;
pub use merkle_tree::{ConcurrentMerkleTreeAccount, MerkleTreeExt, MerkleTreeExtError};
pub use rpc_connection::{
    InnerInstruction, InnerInstructionSet, RpcConnection, RpcConnectionConfig,
};
pub use solana_rpc::SolanaRpcConnection;
