//! In-memory [`PayoutSink`] that credits balances per holder.
//!
//! Suitable for the CLI simulator and tests; a deployment would implement
//! [`PayoutSink`] over its actual value-transfer mechanism.

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::error::TransferError;
use crate::traits::PayoutSink;
use crate::types::{Amount, HolderId};

#[derive(Debug, Default)]
pub struct MemoryPayouts {
    balances: Mutex<HashMap<HolderId, Amount>>,
}

impl MemoryPayouts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total credited to `holder` so far.
    pub fn balance_of(&self, holder: &HolderId) -> Amount {
        self.balances.lock().get(holder).copied().unwrap_or(0)
    }

    /// Sum of all credited payouts.
    pub fn total_paid(&self) -> Amount {
        self.balances.lock().values().sum()
    }

    /// Snapshot of every credited balance.
    pub fn balances(&self) -> HashMap<HolderId, Amount> {
        self.balances.lock().clone()
    }
}

impl PayoutSink for MemoryPayouts {
    fn transfer(&self, to: &HolderId, amount: Amount) -> Result<(), TransferError> {
        let mut balances = self.balances.lock();
        let entry = balances.entry(*to).or_insert(0);
        *entry = entry
            .checked_add(amount)
            .ok_or_else(|| TransferError(format!("balance overflow for {to}")))?;
        Ok(())
    }
}
