use std::{
    fmt::{Debug, Formatter},
    sync::Arc,
    time::Duration,
};

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use solana_client::{nonblocking::rpc_client::RpcClient, rpc_config::RpcTransactionConfig};
use solana_sdk::{
    account::Account,
    commitment_config::CommitmentConfig,
    hash::Hash,
    pubkey::Pubkey,
    signature::{Keypair, Signature},
    transaction::Transaction,
};
use solana_transaction_status::{
    option_serializer::OptionSerializer, UiInstruction, UiTransactionEncoding,
};
use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

use super::rpc_connection::{
    InnerInstruction, InnerInstructionSet, RpcConnection, RpcConnectionConfig,
};
use crate::{
    das::{
        Asset, AssetList, AssetSorting, GetAssetParams, GetAssetsByOwnerParams, RpcRequest,
        RpcResponse,
    },
    rpc::errors::RpcError,
};

const SIGNATURE_POLL_INTERVAL: Duration = Duration::from_millis(500);

pub struct SolanaRpcConnection {
    pub client: RpcClient,
    pub http: reqwest::Client,
    identity: Arc<Keypair>,
    confirm_timeout: Duration,
}

impl Debug for SolanaRpcConnection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "SolanaRpcConnection {{ client: {:?} }}", self.client.url())
    }
}

impl SolanaRpcConnection {
    async fn das_request<P, T>(&self, method: &str, params: P) -> Result<T, RpcError>
    where
        P: Serialize + Send,
        T: DeserializeOwned,
    {
        let request = RpcRequest::new(method.to_string(), params);
        let response = self
            .http
            .post(self.client.url())
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;
        let response_text = response.text().await?;
        let response: RpcResponse<T> = serde_json::from_str(&response_text)?;

        if let Some(error) = response.error {
            return Err(RpcError::DasError {
                method: method.to_string(),
                code: error.code,
                message: error.message,
            });
        }
        response.result.ok_or_else(|| {
            RpcError::CustomError(format!("DAS request `{}` returned no result", method))
        })
    }

    async fn wait_for_signature(
        &self,
        signature: &Signature,
        commitment: CommitmentConfig,
    ) -> Result<(), RpcError> {
        loop {
            match self
                .client
                .get_signature_status_with_commitment(signature, commitment)
                .await?
            {
                Some(Ok(())) => return Ok(()),
                Some(Err(e)) => return Err(RpcError::from(e)),
                None => {
                    debug!(
                        "Signature {} not yet at {:?}",
                        signature, commitment.commitment
                    );
                    sleep(SIGNATURE_POLL_INTERVAL).await;
                }
            }
        }
    }
}

#[async_trait]
impl RpcConnection for SolanaRpcConnection {
    fn new(config: RpcConnectionConfig) -> Self
    where
        Self: Sized,
    {
        let commitment_config = config
            .commitment_config
            .unwrap_or(CommitmentConfig::confirmed());
        let client = RpcClient::new_with_commitment(config.url, commitment_config);
        Self {
            client,
            http: reqwest::Client::new(),
            identity: config.identity,
            confirm_timeout: config.confirm_timeout,
        }
    }

    fn get_url(&self) -> String {
        self.client.url()
    }

    fn identity(&self) -> &Keypair {
        &self.identity
    }

    fn commitment(&self) -> CommitmentConfig {
        self.client.commitment()
    }

    async fn health(&self) -> Result<(), RpcError> {
        self.client.get_health().await.map_err(RpcError::from)
    }

    async fn get_latest_blockhash(&self) -> Result<Hash, RpcError> {
        self.client
            .get_latest_blockhash()
            .await
            .map_err(RpcError::from)
    }

    async fn get_account(&self, address: Pubkey) -> Result<Option<Account>, RpcError> {
        self.client
            .get_account_with_commitment(&address, self.client.commitment())
            .await
            .map(|response| response.value)
            .map_err(RpcError::from)
    }

    async fn get_minimum_balance_for_rent_exemption(
        &self,
        data_len: usize,
    ) -> Result<u64, RpcError> {
        self.client
            .get_minimum_balance_for_rent_exemption(data_len)
            .await
            .map_err(RpcError::from)
    }

    async fn send_transaction(&self, transaction: &Transaction) -> Result<Signature, RpcError> {
        self.client
            .send_transaction(transaction)
            .await
            .map_err(RpcError::from)
    }

    async fn confirm_transaction(
        &self,
        signature: &Signature,
        commitment: CommitmentConfig,
    ) -> Result<(), RpcError> {
        let wait = self.wait_for_signature(signature, commitment);
        match timeout(self.confirm_timeout, wait).await {
            Ok(result) => result,
            Err(_) => Err(RpcError::ConfirmationTimeout {
                signature: *signature,
                timeout_secs: self.confirm_timeout.as_secs(),
            }),
        }
    }

    async fn get_inner_instructions(
        &self,
        signature: &Signature,
        commitment: CommitmentConfig,
    ) -> Result<Vec<InnerInstructionSet>, RpcError> {
        let rpc_transaction_config = RpcTransactionConfig {
            encoding: Some(UiTransactionEncoding::Base64),
            commitment: Some(commitment),
            max_supported_transaction_version: Some(0),
        };
        let transaction = self
            .client
            .get_transaction_with_config(signature, rpc_transaction_config)
            .await?;
        let account_keys = transaction
            .transaction
            .transaction
            .decode()
            .map(|tx| tx.message.static_account_keys().to_vec())
            .ok_or_else(|| RpcError::CustomError("Failed to decode transaction".to_string()))?;
        let meta = transaction.transaction.meta.as_ref().ok_or_else(|| {
            RpcError::CustomError("Transaction missing metadata information".to_string())
        })?;
        if meta.status.is_err() {
            return Err(RpcError::CustomError(
                "Transaction status indicates an error".to_string(),
            ));
        }

        let inner_instructions = match &meta.inner_instructions {
            OptionSerializer::Some(i) => i,
            OptionSerializer::None | OptionSerializer::Skip => {
                return Err(RpcError::CustomError(
                    "No inner instructions found".to_string(),
                ));
            }
        };

        let mut sets = Vec::with_capacity(inner_instructions.len());
        for ix in inner_instructions.iter() {
            let mut instructions = Vec::with_capacity(ix.instructions.len());
            for ui_instruction in ix.instructions.iter() {
                match ui_instruction {
                    UiInstruction::Compiled(compiled) => {
                        let data = bs58::decode(&compiled.data).into_vec().map_err(|_| {
                            RpcError::CustomError("Failed to decode instruction data".to_string())
                        })?;
                        let program_id = account_keys
                            .get(compiled.program_id_index as usize)
                            .copied()
                            .unwrap_or_default();
                        instructions.push(InnerInstruction { program_id, data });
                    }
                    UiInstruction::Parsed(_) => {
                        warn!("Skipping parsed inner instruction in {}", signature);
                    }
                }
            }
            sets.push(InnerInstructionSet {
                index: ix.index,
                instructions,
            });
        }
        Ok(sets)
    }

    async fn get_assets_by_owner(
        &self,
        owner: &Pubkey,
        sort_by: Option<AssetSorting>,
        page: u32,
        limit: u32,
    ) -> Result<AssetList, RpcError> {
        self.das_request(
            "getAssetsByOwner",
            GetAssetsByOwnerParams::new(owner, sort_by, page, limit),
        )
        .await
    }

    async fn get_asset(&self, id: &Pubkey) -> Result<Asset, RpcError> {
        self.das_request("getAsset", GetAssetParams { id: id.to_string() })
            .await
    }
}
