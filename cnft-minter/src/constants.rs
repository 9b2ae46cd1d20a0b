use solana_sdk::{pubkey, pubkey::Pubkey};

pub const BUBBLEGUM_PROGRAM_ID: Pubkey = pubkey!("BGUMAp9Gq7iTEuizy4pqaxsTyUCBK68MDfK752saRPUY");
pub const SPL_ACCOUNT_COMPRESSION_ID: Pubkey =
    pubkey!("cmtDvXumGCrqC1Age74AVPhSRVXJMd8PJS91L8KbNCK");
pub const SPL_NOOP_ID: Pubkey = pubkey!("noopb9bwsA5Q8LuoHjQHVe4GSTh3LyeNS4nn7tnWRJj");
pub const TOKEN_METADATA_PROGRAM_ID: Pubkey =
    pubkey!("metaqbxxUerdq28cj1RbAWkYQm3ybzjb6a8bt518x1s");
pub const ASSOCIATED_TOKEN_PROGRAM_ID: Pubkey =
    pubkey!("ATokenGPvbdGVxr1b2hvZbsiqW5xWH25efTNsLJA8knL");

/// Seed of the PDA Bubblegum signs collection CPIs with.
pub const COLLECTION_CPI_SEED: &[u8] = b"collection_cpi";
pub const ASSET_SEED: &[u8] = b"asset";

pub const TREE_MAX_DEPTH: u32 = 14;
pub const TREE_MAX_BUFFER_SIZE: u32 = 64;
pub const TREE_CANOPY_DEPTH: u32 = 0;

pub const MAX_SUPPLY: u64 = 10_000;
pub const MINT_COMPUTE_UNIT_LIMIT: u32 = 800_000;
pub const PAYMENT_COMPUTE_UNIT_PRICE: u64 = 100_000;
pub const PUBLIC_MINT_SELLER_FEE_BASIS_POINTS: u16 = 500;

pub const NOTIFICATION_DEBOUNCE_MS: u64 = 300;
pub const WALLET_ERROR_CLEAR_MS: u64 = 3_000;

pub const DAS_PAGE_LIMIT: u32 = 1_000;

pub const DEFAULT_NAME_PREFIX: &str = "PUFF DOG";
pub const DEFAULT_COLLECTION_NAME: &str = "PUFF DOG Collection";
pub const DEFAULT_COLLECTION_URI: &str = "https://bafybeigwam4swgron7hgoxx5myrivi6yswadj6fktgdfnsxcz3icv5wlou.ipfs.w3s.link/PuffDogNFTCollection.json";
pub const DEFAULT_METADATA_BASE_URI: &str = "https://peach-binding-gamefowl-763.mypinata.cloud/ipfs/bafybeiby6jda3blcbvpizf6hxk5wjzmfsx5x3z6xiqz7sfim3i2ciayjoy";
pub const DEFAULT_IMAGE_BASE_URI: &str = "https://peach-binding-gamefowl-763.mypinata.cloud/ipfs/QmY2PNF1rB6k4inLZMUqrt17cH9wpzXqgZ1fFv64SqYcxG";
