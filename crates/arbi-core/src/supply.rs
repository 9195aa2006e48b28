//! Issued-token ledger with an incrementally maintained holder index.
//!
//! Token ids are assigned sequentially from zero. Alongside the id → owner
//! table the ledger keeps a holder → ids index, so ownership counts are an
//! O(1) lookup rather than a scan of every issued token.

use std::collections::HashMap;

use crate::error::SupplyError;
use crate::traits::OwnershipView;
use crate::types::{HolderId, TokenId};

#[derive(Clone, Debug)]
pub struct SupplyLedger {
    max_supply: u64,
    /// Owner of each issued token, indexed by id.
    owners: Vec<HolderId>,
    /// Holder → ids held, in issuance order.
    holdings: HashMap<HolderId, Vec<TokenId>>,
}

impl SupplyLedger {
    pub fn new(max_supply: u64) -> Self {
        Self {
            max_supply,
            owners: Vec::new(),
            holdings: HashMap::new(),
        }
    }

    pub fn max_supply(&self) -> u64 {
        self.max_supply
    }

    pub fn total_issued(&self) -> u64 {
        self.owners.len() as u64
    }

    pub fn remaining(&self) -> u64 {
        self.max_supply - self.total_issued()
    }

    pub fn is_exhausted(&self) -> bool {
        self.total_issued() >= self.max_supply
    }

    /// Issue the next sequential token to `holder`.
    ///
    /// # Errors
    ///
    /// [`SupplyError::SupplyExhausted`] once `max_supply` tokens exist; the
    /// ledger is left untouched.
    pub fn issue(&mut self, holder: HolderId) -> Result<TokenId, SupplyError> {
        if self.is_exhausted() {
            return Err(SupplyError::SupplyExhausted {
                max_supply: self.max_supply,
            });
        }
        let id = TokenId(self.total_issued());
        self.owners.push(holder);
        self.holdings.entry(holder).or_default().push(id);
        Ok(id)
    }

    /// Owner of an issued token.
    ///
    /// # Errors
    ///
    /// [`SupplyError::UnknownToken`] if `id` has not been issued.
    pub fn require_owner(&self, id: TokenId) -> Result<HolderId, SupplyError> {
        self.owner_of(id).ok_or(SupplyError::UnknownToken(id))
    }

    /// Number of distinct holders.
    pub fn holder_count(&self) -> usize {
        self.holdings.len()
    }

    /// Every holder with at least one token, in no particular order.
    pub fn holders(&self) -> impl Iterator<Item = &HolderId> {
        self.holdings.keys()
    }
}

impl OwnershipView for SupplyLedger {
    fn owner_of(&self, id: TokenId) -> Option<HolderId> {
        usize::try_from(id.0)
            .ok()
            .and_then(|idx| self.owners.get(idx))
            .copied()
    }

    fn ownership_count(&self, holder: &HolderId) -> u64 {
        self.holdings.get(holder).map_or(0, |ids| ids.len() as u64)
    }

    fn tokens_of(&self, holder: &HolderId) -> Vec<TokenId> {
        self.holdings.get(holder).cloned().unwrap_or_default()
    }

    fn total_issued(&self) -> u64 {
        SupplyLedger::total_issued(self)
    }
}
