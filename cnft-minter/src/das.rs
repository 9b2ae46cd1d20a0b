//! Request and response shapes of the Digital Asset Standard (DAS) JSON-RPC
//! API served by Helius, Triton and other indexers.

use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct RpcRequest<T> {
    pub jsonrpc: String,
    pub id: String,
    pub method: String,
    #[serde(rename = "params")]
    pub parameters: T,
}

impl<T> RpcRequest<T> {
    pub fn new(method: String, parameters: T) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id: "1".to_string(),
            method,
            parameters,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RpcResponse<T> {
    pub jsonrpc: String,
    pub id: String,
    pub result: Option<T>,
    pub error: Option<JsonRpcError>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AssetSortBy {
    Created,
    Updated,
    RecentAction,
    None,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AssetSorting {
    pub sort_by: AssetSortBy,
    pub sort_direction: SortDirection,
}

impl AssetSorting {
    pub fn newest_first() -> Self {
        Self {
            sort_by: AssetSortBy::Created,
            sort_direction: SortDirection::Desc,
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GetAssetsByOwnerParams {
    pub owner_address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<AssetSorting>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}

impl GetAssetsByOwnerParams {
    pub fn new(owner: &Pubkey, sort_by: Option<AssetSorting>, page: u32, limit: u32) -> Self {
        Self {
            owner_address: owner.to_string(),
            sort_by,
            limit: Some(limit),
            page: Some(page),
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct GetAssetParams {
    pub id: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct AssetList {
    #[serde(default)]
    pub total: u32,
    #[serde(default)]
    pub limit: u32,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub items: Vec<Asset>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Asset {
    pub id: String,
    #[serde(default)]
    pub compression: Option<AssetCompression>,
    #[serde(default)]
    pub grouping: Vec<AssetGrouping>,
    #[serde(default)]
    pub ownership: Option<AssetOwnership>,
    #[serde(default)]
    pub content: Option<serde_json::Value>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct AssetCompression {
    #[serde(default)]
    pub compressed: bool,
    #[serde(default)]
    pub tree: String,
    #[serde(default)]
    pub leaf_id: u64,
    #[serde(default)]
    pub seq: u64,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct AssetGrouping {
    pub group_key: String,
    #[serde(default)]
    pub group_value: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct AssetOwnership {
    pub owner: String,
    #[serde(default)]
    pub delegate: Option<String>,
}

impl Asset {
    /// True when the asset is a compressed leaf of `tree`.
    pub fn is_compressed_in(&self, tree: &Pubkey) -> bool {
        let tree = tree.to_string();
        self.compression
            .as_ref()
            .is_some_and(|c| c.compressed && c.tree == tree)
    }

    pub fn is_grouped_under(&self, collection: &Pubkey) -> bool {
        let collection = collection.to_string();
        self.grouping
            .iter()
            .any(|g| g.group_value.as_deref() == Some(collection.as_str()))
    }
}
