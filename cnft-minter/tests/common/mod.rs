use std::{
    collections::HashMap,
    fmt,
    sync::{Arc, Mutex, MutexGuard, OnceLock},
    time::Duration,
};

use async_trait::async_trait;
use borsh::BorshSerialize;
use cnft_minter::{
    constants::{BUBBLEGUM_PROGRAM_ID, SPL_ACCOUNT_COMPRESSION_ID, SPL_NOOP_ID},
    das::{Asset, AssetCompression, AssetGrouping, AssetList, AssetSorting},
    leaf::{find_leaf_asset_id, LeafSchema},
    rpc::{
        merkle_tree::merkle_tree_account_size, InnerInstruction, InnerInstructionSet,
        RpcConnection, RpcConnectionConfig, RpcError,
    },
    wallet::{WalletAdapter, WalletError},
    Minter, MinterConfig, Notification, NotificationSink, Notifier,
};
use solana_sdk::{
    account::Account,
    commitment_config::{CommitmentConfig, CommitmentLevel},
    hash::Hash,
    pubkey::Pubkey,
    signature::{Keypair, Signature, Signer},
    transaction::Transaction,
};

pub const PRICE_LAMPORTS: u64 = 100_000_000;

#[allow(dead_code)]
#[derive(Debug)]
pub struct MockState {
    pub healthy: bool,
    pub tree: Pubkey,
    pub tree_sequence: u64,
    pub tree_account_valid: bool,
    /// Sequence number the tree reports once a mint lands. Defaults to
    /// the current one plus one.
    pub sequence_after_mint: Option<u64>,
    pub assets: Vec<Asset>,
    pub asset_pages_requested: Vec<u32>,
    pub sent: Vec<Transaction>,
    pub mint_signatures: Vec<Signature>,
    pub confirmations: Vec<(Signature, CommitmentLevel)>,
    pub inner_instructions: HashMap<Signature, Vec<InnerInstructionSet>>,
    pub tree_reads: usize,
    pub tree_reads_since_mint: usize,
    pub get_asset_calls: usize,
    pub fail_send: bool,
    pub fail_mint_confirm: bool,
    pub confirm_delay: Option<Duration>,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            healthy: true,
            tree: Pubkey::new_unique(),
            tree_sequence: 0,
            tree_account_valid: true,
            sequence_after_mint: None,
            assets: Vec::new(),
            asset_pages_requested: Vec::new(),
            sent: Vec::new(),
            mint_signatures: Vec::new(),
            confirmations: Vec::new(),
            inner_instructions: HashMap::new(),
            tree_reads: 0,
            tree_reads_since_mint: 0,
            get_asset_calls: 0,
            fail_send: false,
            fail_mint_confirm: false,
            confirm_delay: None,
        }
    }
}

pub type SharedState = Arc<Mutex<MockState>>;

pub fn lock(state: &SharedState) -> MutexGuard<'_, MockState> {
    state.lock().unwrap()
}

fn endpoints() -> &'static Mutex<HashMap<String, SharedState>> {
    static ENDPOINTS: OnceLock<Mutex<HashMap<String, SharedState>>> = OnceLock::new();
    ENDPOINTS.get_or_init(Default::default)
}

/// Makes connections built for `url` share `state`.
#[allow(dead_code)]
pub fn register_endpoint(url: &str, state: SharedState) {
    endpoints().lock().unwrap().insert(url.to_string(), state);
}

/// In-memory chain that records every submission.
pub struct MockRpc {
    config: RpcConnectionConfig,
    pub state: SharedState,
}

impl fmt::Debug for MockRpc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MockRpc {{ url: {} }}", self.config.url)
    }
}

impl MockRpc {
    pub fn with_state(config: RpcConnectionConfig, state: SharedState) -> Self {
        Self { config, state }
    }
}

fn is_mint(transaction: &Transaction) -> bool {
    let keys = &transaction.message.account_keys;
    transaction
        .message
        .instructions
        .iter()
        .any(|ix| keys[ix.program_id_index as usize] == BUBBLEGUM_PROGRAM_ID)
}

fn mint_leaf_owner(transaction: &Transaction) -> Pubkey {
    let keys = &transaction.message.account_keys;
    transaction
        .message
        .instructions
        .iter()
        .find(|ix| keys[ix.program_id_index as usize] == BUBBLEGUM_PROGRAM_ID)
        .map(|ix| keys[ix.accounts[1] as usize])
        .unwrap_or_default()
}

#[allow(dead_code)]
pub fn leaf_event_bytes(leaf: &LeafSchema) -> Vec<u8> {
    let schema = leaf.try_to_vec().unwrap();
    let mut data = vec![1u8, 0u8];
    data.extend_from_slice(&((schema.len() + 2 + 32) as u32).to_le_bytes());
    data.extend_from_slice(&[1u8, 0u8]);
    data.extend_from_slice(&schema);
    data.extend_from_slice(&[0u8; 32]);
    data
}

pub fn tree_account_bytes(sequence_number: u64) -> Vec<u8> {
    let mut data = vec![0u8; merkle_tree_account_size(14, 64, 0)];
    data[0] = 1;
    data[1] = 0;
    data[2..6].copy_from_slice(&64u32.to_le_bytes());
    data[6..10].copy_from_slice(&14u32.to_le_bytes());
    data[56..64].copy_from_slice(&sequence_number.to_le_bytes());
    data
}

#[async_trait]
impl RpcConnection for MockRpc {
    fn new(config: RpcConnectionConfig) -> Self {
        let state = endpoints()
            .lock()
            .unwrap()
            .get(&config.url)
            .cloned()
            .unwrap_or_default();
        Self::with_state(config, state)
    }

    fn get_url(&self) -> String {
        self.config.url.clone()
    }

    fn identity(&self) -> &Keypair {
        &self.config.identity
    }

    fn commitment(&self) -> CommitmentConfig {
        self.config
            .commitment_config
            .unwrap_or(CommitmentConfig::confirmed())
    }

    async fn health(&self) -> Result<(), RpcError> {
        if lock(&self.state).healthy {
            Ok(())
        } else {
            Err(RpcError::CustomError("node is behind".to_string()))
        }
    }

    async fn get_latest_blockhash(&self) -> Result<Hash, RpcError> {
        Ok(Hash::new_unique())
    }

    async fn get_account(&self, address: Pubkey) -> Result<Option<Account>, RpcError> {
        let mut state = lock(&self.state);
        if address != state.tree {
            return Ok(None);
        }
        state.tree_reads += 1;
        state.tree_reads_since_mint += 1;
        let mut data = tree_account_bytes(state.tree_sequence);
        if !state.tree_account_valid {
            data[0] = 0;
        }
        Ok(Some(Account {
            lamports: 1,
            data,
            owner: SPL_ACCOUNT_COMPRESSION_ID,
            executable: false,
            rent_epoch: 0,
        }))
    }

    async fn get_minimum_balance_for_rent_exemption(
        &self,
        data_len: usize,
    ) -> Result<u64, RpcError> {
        Ok(data_len as u64 * 10)
    }

    async fn send_transaction(&self, transaction: &Transaction) -> Result<Signature, RpcError> {
        let mut state = lock(&self.state);
        if state.fail_send {
            return Err(RpcError::CustomError("send failed".to_string()));
        }
        let signature = transaction.signatures[0];
        if is_mint(transaction) {
            let nonce = state.tree_sequence;
            let tree = state.tree;
            let leaf = LeafSchema::V1 {
                id: find_leaf_asset_id(&tree, nonce),
                owner: mint_leaf_owner(transaction),
                delegate: mint_leaf_owner(transaction),
                nonce,
                data_hash: [1u8; 32],
                creator_hash: [2u8; 32],
            };
            state.inner_instructions.insert(
                signature,
                vec![InnerInstructionSet {
                    index: 1,
                    instructions: vec![
                        InnerInstruction {
                            program_id: cnft_minter::constants::TOKEN_METADATA_PROGRAM_ID,
                            data: vec![0u8; 16],
                        },
                        InnerInstruction {
                            program_id: SPL_NOOP_ID,
                            data: leaf_event_bytes(&leaf),
                        },
                    ],
                }],
            );
            state.tree_sequence = state.sequence_after_mint.unwrap_or(nonce + 1);
            state.tree_reads_since_mint = 0;
            state.mint_signatures.push(signature);
        }
        state.sent.push(transaction.clone());
        Ok(signature)
    }

    async fn confirm_transaction(
        &self,
        signature: &Signature,
        commitment: CommitmentConfig,
    ) -> Result<(), RpcError> {
        let delay = lock(&self.state).confirm_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let mut state = lock(&self.state);
        state.confirmations.push((*signature, commitment.commitment));
        if state.fail_mint_confirm && state.mint_signatures.contains(signature) {
            return Err(RpcError::ConfirmationTimeout {
                signature: *signature,
                timeout_secs: 60,
            });
        }
        Ok(())
    }

    async fn get_inner_instructions(
        &self,
        signature: &Signature,
        _commitment: CommitmentConfig,
    ) -> Result<Vec<InnerInstructionSet>, RpcError> {
        Ok(lock(&self.state)
            .inner_instructions
            .get(signature)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_assets_by_owner(
        &self,
        _owner: &Pubkey,
        _sort_by: Option<AssetSorting>,
        page: u32,
        limit: u32,
    ) -> Result<AssetList, RpcError> {
        let mut state = lock(&self.state);
        state.asset_pages_requested.push(page);
        let items: Vec<Asset> = state
            .assets
            .iter()
            .skip((page.saturating_sub(1) * limit) as usize)
            .take(limit as usize)
            .cloned()
            .collect();
        Ok(AssetList {
            total: items.len() as u32,
            limit,
            page: Some(page),
            items,
        })
    }

    async fn get_asset(&self, id: &Pubkey) -> Result<Asset, RpcError> {
        lock(&self.state).get_asset_calls += 1;
        Ok(Asset {
            id: id.to_string(),
            ..Default::default()
        })
    }
}

/// End-user wallet that records what it is asked to send.
#[derive(Default)]
pub struct MockWallet {
    pub keypair: Option<Keypair>,
    pub reject: bool,
    pub sends: Mutex<Vec<Transaction>>,
}

#[allow(dead_code)]
impl MockWallet {
    pub fn connected() -> Self {
        Self {
            keypair: Some(Keypair::new()),
            ..Default::default()
        }
    }

    pub fn rejecting() -> Self {
        Self {
            reject: true,
            ..Self::connected()
        }
    }

    pub fn send_count(&self) -> usize {
        self.sends.lock().unwrap().len()
    }
}

#[async_trait]
impl WalletAdapter for MockWallet {
    fn public_key(&self) -> Option<Pubkey> {
        self.keypair.as_ref().map(|k| k.pubkey())
    }

    fn can_sign(&self) -> bool {
        self.keypair.is_some()
    }

    async fn send_transaction<R: RpcConnection>(
        &self,
        mut transaction: Transaction,
        rpc: &R,
    ) -> Result<Signature, WalletError> {
        let keypair = self.keypair.as_ref().ok_or(WalletError::NotConnected)?;
        self.sends.lock().unwrap().push(transaction.clone());
        if self.reject {
            return Err(WalletError::UserRejected(
                "User rejected the request.".to_string(),
            ));
        }
        let blockhash = transaction.message.recent_blockhash;
        transaction.sign(&[keypair], blockhash);
        Ok(rpc.send_transaction(&transaction).await?)
    }
}

#[derive(Default)]
pub struct RecordingSink {
    pub rendered: Mutex<Vec<Option<Notification>>>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn rendered(&self) -> Vec<Option<Notification>> {
        self.rendered.lock().unwrap().clone()
    }

    pub fn last(&self) -> Option<Notification> {
        self.rendered().into_iter().flatten().last()
    }
}

impl NotificationSink for RecordingSink {
    fn render(&self, notification: Option<&Notification>) {
        self.rendered.lock().unwrap().push(notification.cloned());
    }
}

#[allow(dead_code)]
pub fn qualifying_asset(tree: &Pubkey, collection: &Pubkey) -> Asset {
    Asset {
        id: Pubkey::new_unique().to_string(),
        compression: Some(AssetCompression {
            compressed: true,
            tree: tree.to_string(),
            ..Default::default()
        }),
        grouping: vec![AssetGrouping {
            group_key: "collection".to_string(),
            group_value: Some(collection.to_string()),
        }],
        ..Default::default()
    }
}

pub struct Harness {
    pub minter: Minter<MockRpc>,
    pub state: SharedState,
    pub sink: Arc<RecordingSink>,
    pub notifier: Arc<Notifier>,
    pub operator: Pubkey,
    pub tree: Pubkey,
    pub collection: Pubkey,
    pub admin_wallet: Pubkey,
}

#[allow(dead_code)]
impl Harness {
    pub fn state(&self) -> MutexGuard<'_, MockState> {
        lock(&self.state)
    }

    /// Renders whatever is still inside the debounce window.
    pub fn flushed_notification(&self) -> Option<Notification> {
        self.notifier.flush();
        self.notifier.current()
    }
}

#[allow(dead_code)]
pub fn minter_config(
    operator: &Keypair,
    tree: Pubkey,
    collection: Pubkey,
    admin: Pubkey,
) -> MinterConfig {
    MinterConfig {
        rpc_url: "http://mock.local:8899".to_string(),
        operator_key: bs58::encode(operator.to_bytes()).into_string(),
        merkle_tree: Some(tree),
        collection_mint: Some(collection),
        per_wallet_limit: Some(2),
        price_lamports: Some(PRICE_LAMPORTS),
        admin_wallet: Some(admin),
        max_supply: 10_000,
        name_prefix: "PUFF DOG".to_string(),
        collection_name: "PUFF DOG Collection".to_string(),
        collection_uri: "https://example.com/collection.json".to_string(),
        metadata_base_uri: "https://example.com/meta".to_string(),
        image_base_uri: "https://example.com/img".to_string(),
        confirm_timeout: Duration::from_secs(60),
        commitment: CommitmentConfig::confirmed(),
    }
}

/// Builds a minter over a fresh mock chain after letting `configure`
/// shape the chain state.
#[allow(dead_code)]
pub async fn harness(configure: impl FnOnce(&mut MockState)) -> Harness {
    let operator = Keypair::new();
    let collection = Pubkey::new_unique();
    let admin_wallet = Pubkey::new_unique();

    let state = SharedState::default();
    configure(&mut lock(&state));
    let tree = lock(&state).tree;

    let config = minter_config(&operator, tree, collection, admin_wallet);
    let operator_pubkey = operator.pubkey();
    let rpc = MockRpc::with_state(
        RpcConnectionConfig::new(config.rpc_url.clone(), Arc::new(operator)),
        state.clone(),
    );

    let sink = Arc::new(RecordingSink::default());
    let notifier = Arc::new(Notifier::new(sink.clone()));
    let minter = Minter::with_connection(config, rpc, notifier.clone())
        .await
        .unwrap();

    Harness {
        minter,
        state,
        sink,
        notifier,
        operator: operator_pubkey,
        tree,
        collection,
        admin_wallet,
    }
}
