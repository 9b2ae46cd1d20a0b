use std::sync::Arc;

use dashmap::{mapref::entry::Entry, DashMap};
use solana_sdk::pubkey::Pubkey;

use crate::errors::MintError;

/// One mint at a time per wallet. Holding the permit makes the limit check
/// and the mint that follows it atomic within this process.
#[derive(Debug, Clone, Default)]
pub struct InFlightGuard {
    slots: Arc<DashMap<Pubkey, ()>>,
}

#[must_use = "the slot is released as soon as the permit is dropped"]
#[derive(Debug)]
pub struct InFlightPermit {
    slots: Arc<DashMap<Pubkey, ()>>,
    wallet: Pubkey,
}

impl InFlightPermit {
    pub fn wallet(&self) -> Pubkey {
        self.wallet
    }
}

impl Drop for InFlightPermit {
    fn drop(&mut self) {
        self.slots.remove(&self.wallet);
    }
}

impl InFlightGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_acquire(&self, wallet: Pubkey) -> Result<InFlightPermit, MintError> {
        match self.slots.entry(wallet) {
            Entry::Occupied(_) => Err(MintError::MintInProgress(wallet)),
            Entry::Vacant(slot) => {
                slot.insert(());
                Ok(InFlightPermit {
                    slots: self.slots.clone(),
                    wallet,
                })
            }
        }
    }

    pub fn is_busy(&self, wallet: &Pubkey) -> bool {
        self.slots.contains_key(wallet)
    }
}
