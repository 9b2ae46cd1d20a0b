//! Operator and end-user actions. Each one is a straight line of chain
//! calls with no retries, returning a typed handle on success.

mod create_collection;
mod create_tree;
mod mint;

use std::sync::{Arc, Mutex};

use solana_sdk::{pubkey::Pubkey, signature::Signature, signer::Signer};
use tokio::sync::watch;
use tracing::{debug, info};

pub use create_collection::create_collection_instructions;
pub use create_tree::create_tree_instructions;
pub use mint::{mint_to_collection_instruction, payment_instructions, MintItem};

use crate::{
    config::MinterConfig,
    constants::BUBBLEGUM_PROGRAM_ID,
    errors::{ConfigError, InitError, MintError},
    in_flight::InFlightGuard,
    keypair::OperatorKey,
    leaf::LeafSchema,
    mint_counter::MintCounter,
    notification::Notifier,
    rpc::{ChainContext, RpcConnection, RpcConnectionConfig},
    wallet_limit::WalletLimitChecker,
};

/// Accounts produced by `create_tree`. Feed `merkle_tree` to later mints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeHandle {
    pub tree_creator: Pubkey,
    pub merkle_tree: Pubkey,
    pub tree_config: Pubkey,
    pub signature: Signature,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionHandle {
    pub mint: Pubkey,
    pub metadata: Pubkey,
    pub master_edition: Pubkey,
    pub signature: Signature,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintedLeaf {
    pub signature: Signature,
    pub leaf: LeafSchema,
    pub asset_id: Pubkey,
}

/// Display record of the most recent public mint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintRecord {
    pub asset_id: Pubkey,
    pub name: String,
    pub image_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MintPhase {
    Idle,
    ValidatingLimits,
    PayingSol,
    WaitingPaymentConfirm,
    SubmittingMint,
    WaitingMintFinalized,
    ParsingResult,
    Done,
    Aborted,
}

/// Minting service. Owns the shared chain client and every piece of
/// state the actions read or update.
#[derive(Debug)]
pub struct Minter<R: RpcConnection> {
    config: MinterConfig,
    context: ChainContext<R>,
    counter: MintCounter,
    in_flight: InFlightGuard,
    notifier: Arc<Notifier>,
    last_minted: Mutex<Option<MintRecord>>,
    phase: watch::Sender<MintPhase>,
}

impl<R: RpcConnection> Minter<R> {
    /// Decodes the operator key, connects to the configured endpoint and
    /// reads the initial total.
    pub async fn init(config: MinterConfig, notifier: Arc<Notifier>) -> Result<Self, InitError> {
        let rpc_config = Self::rpc_config(&config)?;
        let context = ChainContext::new(rpc_config);
        Self::start(config, context, notifier).await
    }

    /// Like `init`, with an already constructed connection.
    pub async fn with_connection(
        config: MinterConfig,
        rpc: R,
        notifier: Arc<Notifier>,
    ) -> Result<Self, InitError> {
        let rpc_config = Self::rpc_config(&config)?;
        let context = ChainContext::from_connection(rpc_config, rpc);
        Self::start(config, context, notifier).await
    }

    fn rpc_config(config: &MinterConfig) -> Result<RpcConnectionConfig, InitError> {
        let key = OperatorKey::from_base58(&config.operator_key)?;
        let mut rpc_config =
            RpcConnectionConfig::new(config.rpc_url.clone(), Arc::new(key.into_keypair()));
        rpc_config.commitment_config = Some(config.commitment);
        rpc_config.confirm_timeout = config.confirm_timeout;
        Ok(rpc_config)
    }

    async fn start(
        config: MinterConfig,
        context: ChainContext<R>,
        notifier: Arc<Notifier>,
    ) -> Result<Self, InitError> {
        let rpc = context.rpc();
        rpc.health()
            .await
            .map_err(|source| InitError::NetworkUnreachable {
                url: rpc.get_url(),
                source,
            })?;
        info!(
            "Connected to {} as operator {}",
            rpc.get_url(),
            rpc.identity().pubkey()
        );

        let (phase, _) = watch::channel(MintPhase::Idle);
        let minter = Self {
            counter: MintCounter::new(config.merkle_tree),
            config,
            context,
            in_flight: InFlightGuard::new(),
            notifier,
            last_minted: Mutex::new(None),
            phase,
        };
        minter.counter.refresh_total_minted(rpc.as_ref()).await;
        Ok(minter)
    }

    pub fn config(&self) -> &MinterConfig {
        &self.config
    }

    pub fn rpc(&self) -> Arc<R> {
        self.context.rpc()
    }

    pub fn context(&self) -> &ChainContext<R> {
        &self.context
    }

    /// Rebuilds the chain client when `url` differs from the current one
    /// and re-reads the total through it.
    pub async fn set_endpoint(&self, url: &str) -> bool {
        if !self.context.set_endpoint(url) {
            return false;
        }
        self.refresh_total_minted().await;
        true
    }

    pub fn identity(&self) -> Pubkey {
        self.rpc().identity().pubkey()
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub fn total_minted(&self) -> u64 {
        self.counter.total_minted()
    }

    pub async fn refresh_total_minted(&self) -> u64 {
        self.counter.refresh_total_minted(self.rpc().as_ref()).await
    }

    pub async fn set_tree(&self, tree: Pubkey) -> u64 {
        self.counter.set_tree(self.rpc().as_ref(), tree).await
    }

    pub fn last_minted(&self) -> Option<MintRecord> {
        self.lock_last_minted().clone()
    }

    pub fn subscribe_phase(&self) -> watch::Receiver<MintPhase> {
        self.phase.subscribe()
    }

    pub fn phase(&self) -> MintPhase {
        *self.phase.borrow()
    }

    /// Counts the qualifying assets `owner` holds from the configured tree
    /// and collection.
    pub async fn count_wallet_mints(&self, owner: &Pubkey) -> Result<u64, MintError> {
        let checker = self.wallet_limit_checker()?;
        Ok(checker
            .count_wallet_mints(self.rpc().as_ref(), owner)
            .await?)
    }

    /// Tree the counter tracks. Starts as the configured tree and follows
    /// `set_tree`.
    fn tree(&self) -> Result<Pubkey, MintError> {
        Ok(self
            .counter
            .tree()
            .ok_or(ConfigError::MissingField {
                field: "merkle_tree",
            })?)
    }

    fn wallet_limit_checker(&self) -> Result<WalletLimitChecker, MintError> {
        Ok(WalletLimitChecker::new(
            self.tree()?,
            self.config.require_collection()?,
            self.config.per_wallet_limit.unwrap_or(u64::MAX),
        ))
    }

    fn set_phase(&self, phase: MintPhase) {
        debug!("Mint phase: {:?}", phase);
        self.phase.send_replace(phase);
    }

    fn lock_last_minted(&self) -> std::sync::MutexGuard<'_, Option<MintRecord>> {
        match self.last_minted.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn set_last_minted(&self, record: Option<MintRecord>) {
        *self.lock_last_minted() = record;
    }
}

/// PDA Bubblegum keeps the tree authority and mint counts in.
pub fn find_tree_config(merkle_tree: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(&[merkle_tree.as_ref()], &BUBBLEGUM_PROGRAM_ID).0
}
