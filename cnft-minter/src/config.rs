use std::{fmt, str::FromStr, time::Duration};

use solana_sdk::{commitment_config::CommitmentConfig, native_token::sol_to_lamports, pubkey::Pubkey};

use crate::{
    cli::{Commands, MinterArgs},
    errors::ConfigError,
};

#[derive(Clone)]
pub struct MinterConfig {
    pub rpc_url: String,
    /// Base58 `secret || public` key. Decoded by `Minter::init`.
    pub operator_key: String,
    pub merkle_tree: Option<Pubkey>,
    pub collection_mint: Option<Pubkey>,
    pub per_wallet_limit: Option<u64>,
    pub price_lamports: Option<u64>,
    pub admin_wallet: Option<Pubkey>,
    pub max_supply: u64,
    pub name_prefix: String,
    pub collection_name: String,
    pub collection_uri: String,
    pub metadata_base_uri: String,
    pub image_base_uri: String,
    pub confirm_timeout: Duration,
    pub commitment: CommitmentConfig,
}

impl fmt::Debug for MinterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MinterConfig")
            .field("rpc_url", &self.rpc_url)
            .field("merkle_tree", &self.merkle_tree)
            .field("collection_mint", &self.collection_mint)
            .field("per_wallet_limit", &self.per_wallet_limit)
            .field("price_lamports", &self.price_lamports)
            .field("admin_wallet", &self.admin_wallet)
            .field("max_supply", &self.max_supply)
            .field("name_prefix", &self.name_prefix)
            .field("confirm_timeout", &self.confirm_timeout)
            .finish_non_exhaustive()
    }
}

impl MinterConfig {
    /// Builds the configuration and checks that every value `command`
    /// needs is present and well formed.
    pub fn new_for_command(command: &Commands) -> Result<Self, ConfigError> {
        let config = Self::from_args(command.args())?;
        match command {
            Commands::CreateTree(_) | Commands::CreateCollection(_) => {}
            Commands::MintToCollection(_) => {
                config.require_tree()?;
                config.require_collection()?;
            }
            Commands::Mint(_) => {
                config.require_tree()?;
                config.require_collection()?;
                config.require_sale()?;
            }
            Commands::Status(args) => {
                config.require_tree()?;
                if args.owner.is_some() {
                    config.require_collection()?;
                }
            }
        }
        Ok(config)
    }

    pub fn from_args(args: &MinterArgs) -> Result<Self, ConfigError> {
        if args.rpc_url.trim().is_empty() {
            return Err(ConfigError::MissingField { field: "rpc_url" });
        }
        if args.operator_key.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "operator_key",
            });
        }
        if args.max_supply == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_supply",
                error: "must be greater than zero".to_string(),
            });
        }

        Ok(Self {
            rpc_url: args.rpc_url.trim().to_string(),
            operator_key: args.operator_key.clone(),
            merkle_tree: parse_optional_pubkey("merkle_tree", args.merkle_tree.as_deref())?,
            collection_mint: parse_optional_pubkey(
                "collection_mint",
                args.collection_mint.as_deref(),
            )?,
            per_wallet_limit: args.per_wallet_limit,
            price_lamports: args
                .per_nft_price
                .as_deref()
                .map(parse_price_lamports)
                .transpose()?,
            admin_wallet: parse_optional_pubkey("admin_wallet", args.admin_wallet.as_deref())?,
            max_supply: args.max_supply,
            name_prefix: args.name_prefix.clone(),
            collection_name: args.collection_name.clone(),
            collection_uri: args.collection_uri.clone(),
            metadata_base_uri: args.metadata_base_uri.trim_end_matches('/').to_string(),
            image_base_uri: args.image_base_uri.trim_end_matches('/').to_string(),
            confirm_timeout: Duration::from_secs(args.confirm_timeout_seconds),
            commitment: CommitmentConfig::confirmed(),
        })
    }

    pub fn require_tree(&self) -> Result<Pubkey, ConfigError> {
        self.merkle_tree.ok_or(ConfigError::MissingField {
            field: "merkle_tree",
        })
    }

    pub fn require_collection(&self) -> Result<Pubkey, ConfigError> {
        self.collection_mint.ok_or(ConfigError::MissingField {
            field: "collection_mint",
        })
    }

    fn require_sale(&self) -> Result<(), ConfigError> {
        self.per_wallet_limit.ok_or(ConfigError::MissingField {
            field: "per_wallet_limit",
        })?;
        self.price_lamports.ok_or(ConfigError::MissingField {
            field: "per_nft_price",
        })?;
        self.admin_wallet.ok_or(ConfigError::MissingField {
            field: "admin_wallet",
        })?;
        Ok(())
    }

    pub fn item_name(&self, number: u64) -> String {
        format!("{} #{:04}", self.name_prefix, number)
    }

    pub fn item_metadata_uri(&self, number: u64) -> String {
        format!("{}/{}.json", self.metadata_base_uri, number)
    }

    pub fn item_image_uri(&self, number: u64) -> String {
        format!("{}/{}.png", self.image_base_uri, number)
    }
}

fn parse_optional_pubkey(
    field: &'static str,
    value: Option<&str>,
) -> Result<Option<Pubkey>, ConfigError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => Pubkey::from_str(v)
            .map(Some)
            .map_err(|e| ConfigError::InvalidPubkey {
                field,
                error: e.to_string(),
            }),
        None => Ok(None),
    }
}

/// Converts a decimal SOL amount to lamports.
pub fn parse_price_lamports(price: &str) -> Result<u64, ConfigError> {
    let sol = f64::from_str(price.trim())
        .map_err(|e| ConfigError::InvalidPrice(format!("{}: {}", price, e)))?;
    if !sol.is_finite() || sol < 0.0 {
        return Err(ConfigError::InvalidPrice(format!(
            "{}: must be a finite, non-negative amount",
            price
        )));
    }
    Ok(sol_to_lamports(sol))
}
