use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::constants::{
    DEFAULT_COLLECTION_NAME, DEFAULT_COLLECTION_URI, DEFAULT_IMAGE_BASE_URI,
    DEFAULT_METADATA_BASE_URI, DEFAULT_NAME_PREFIX, MAX_SUPPLY,
};

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Create a new compressed NFT Merkle tree owned by the operator.
    CreateTree(MinterArgs),
    /// Create the collection NFT the compressed NFTs are grouped under.
    CreateCollection(MinterArgs),
    /// Mint one compressed NFT to the operator.
    MintToCollection(MinterArgs),
    /// Pay the mint price from a wallet and mint one compressed NFT to it.
    Mint(MintArgs),
    /// Print the total minted and, optionally, one owner's mint count.
    Status(StatusArgs),
}

impl Commands {
    pub fn args(&self) -> &MinterArgs {
        match self {
            Commands::CreateTree(args)
            | Commands::CreateCollection(args)
            | Commands::MintToCollection(args) => args,
            Commands::Mint(args) => &args.minter,
            Commands::Status(args) => &args.minter,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Commands::CreateTree(_) => "create-tree",
            Commands::CreateCollection(_) => "create-collection",
            Commands::MintToCollection(_) => "mint-to-collection",
            Commands::Mint(_) => "mint",
            Commands::Status(_) => "status",
        }
    }
}

#[derive(Args, Clone, Debug)]
pub struct MinterArgs {
    #[arg(long, env = "MINTER_RPC_URL")]
    pub rpc_url: String,

    #[arg(long, env = "MINTER_MERKLE_TREE")]
    pub merkle_tree: Option<String>,

    #[arg(long, env = "MINTER_COLLECTION_MINT")]
    pub collection_mint: Option<String>,

    #[arg(long, env = "MINTER_OPERATOR_KEY", hide_env_values = true)]
    pub operator_key: String,

    #[arg(long, env = "MINTER_PER_WALLET_LIMIT")]
    pub per_wallet_limit: Option<u64>,

    #[arg(long, env = "MINTER_PER_NFT_PRICE")]
    pub per_nft_price: Option<String>,

    #[arg(long, env = "MINTER_ADMIN_WALLET")]
    pub admin_wallet: Option<String>,

    #[arg(long, env = "MINTER_MAX_SUPPLY", default_value_t = MAX_SUPPLY)]
    pub max_supply: u64,

    #[arg(long, env = "MINTER_NAME_PREFIX", default_value = DEFAULT_NAME_PREFIX)]
    pub name_prefix: String,

    #[arg(long, env = "MINTER_COLLECTION_NAME", default_value = DEFAULT_COLLECTION_NAME)]
    pub collection_name: String,

    #[arg(long, env = "MINTER_COLLECTION_URI", default_value = DEFAULT_COLLECTION_URI)]
    pub collection_uri: String,

    #[arg(
        long,
        env = "MINTER_METADATA_BASE_URI",
        default_value = DEFAULT_METADATA_BASE_URI
    )]
    pub metadata_base_uri: String,

    #[arg(long, env = "MINTER_IMAGE_BASE_URI", default_value = DEFAULT_IMAGE_BASE_URI)]
    pub image_base_uri: String,

    #[arg(long, env = "MINTER_CONFIRM_TIMEOUT_SECONDS", default_value = "60")]
    pub confirm_timeout_seconds: u64,
}

#[derive(Args, Clone, Debug)]
pub struct MintArgs {
    #[command(flatten)]
    pub minter: MinterArgs,

    /// Keypair file of the paying wallet. Without it the wallet counts as
    /// not connected.
    #[arg(long)]
    pub wallet: Option<PathBuf>,
}

#[derive(Args, Clone, Debug)]
pub struct StatusArgs {
    #[command(flatten)]
    pub minter: MinterArgs,

    #[arg(long)]
    pub owner: Option<String>,
}
