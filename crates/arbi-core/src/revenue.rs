//! Revenue pool and claim ledger.
//!
//! Every accepted purchase credits its full payment to `total_collected`.
//! A holder's entitlement is their share of the supply times the fraction of
//! pools that have sold out, applied to everything collected so far:
//!
//! ```text
//! unlocked    = min(pool_count, total_issued / tokens_per_pool)
//! entitlement = owned * unlocked * total_collected / (max_supply * pool_count)
//! ```
//!
//! computed as a single floored integer division so no rounding error
//! accumulates across partial claims. A redeem pays
//! `entitlement - claimed[holder]`, further capped by the undistributed
//! balance, and records the claim before any value leaves the pool.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::error::RevenueError;
use crate::traits::PayoutSink;
use crate::types::{Amount, CollectionParams, HolderId};

/// A claim that has been written to the ledger but whose transfer has not
/// necessarily happened yet. Hand it back to
/// [`RevenuePool::rollback_claim`] if the transfer fails.
#[must_use = "a committed claim must be transferred or rolled back"]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Claim {
    pub holder: HolderId,
    pub amount: Amount,
}

#[derive(Clone, Debug)]
pub struct RevenuePool {
    max_supply: u64,
    pool_count: u64,
    tokens_per_pool: u64,
    total_collected: Amount,
    total_claimed: Amount,
    claimed: HashMap<HolderId, Amount>,
}

impl RevenuePool {
    /// Build from validated parameters.
    pub fn new(params: &CollectionParams) -> Self {
        Self {
            max_supply: params.max_supply,
            pool_count: params.pool_count,
            tokens_per_pool: params.tokens_per_pool(),
            total_collected: 0,
            total_claimed: 0,
            claimed: HashMap::new(),
        }
    }

    pub fn total_collected(&self) -> Amount {
        self.total_collected
    }

    pub fn total_claimed(&self) -> Amount {
        self.total_claimed
    }

    /// Collected value not yet paid out.
    pub fn balance(&self) -> Amount {
        self.total_collected - self.total_claimed
    }

    /// Amount already paid to `holder`.
    pub fn claimed(&self, holder: &HolderId) -> Amount {
        self.claimed.get(holder).copied().unwrap_or(0)
    }

    /// Iterate over every holder that has claimed something.
    pub fn claims(&self) -> impl Iterator<Item = (&HolderId, &Amount)> {
        self.claimed.iter()
    }

    /// Would crediting `amount` overflow the collected total?
    pub fn can_credit(&self, amount: Amount) -> bool {
        self.total_collected.checked_add(amount).is_some()
    }

    /// Add an accepted payment to the collected total.
    pub fn credit(&mut self, amount: Amount) -> Result<(), RevenueError> {
        self.total_collected = self
            .total_collected
            .checked_add(amount)
            .ok_or(RevenueError::ArithmeticOverflow)?;
        Ok(())
    }

    /// Number of completed pools whose share of revenue is claimable.
    pub fn unlocked_pools(&self, total_issued: u64) -> u64 {
        if self.tokens_per_pool == 0 {
            return 0;
        }
        (total_issued / self.tokens_per_pool).min(self.pool_count)
    }

    /// Total accrued share of a holder owning `owned` tokens, paid or not.
    pub fn entitlement(&self, owned: u64, total_issued: u64) -> Result<Amount, RevenueError> {
        let denominator = self.max_supply as u128 * self.pool_count as u128;
        if denominator == 0 || owned == 0 {
            return Ok(0);
        }
        let numerator = owned.min(self.max_supply) as u128 * self.unlocked_pools(total_issued) as u128;
        // total * num / den == q * num + r * num / den, with num <= den.
        let q = self.total_collected / denominator;
        let r = self.total_collected % denominator;
        let tail = r
            .checked_mul(numerator)
            .ok_or(RevenueError::ArithmeticOverflow)?
            / denominator;
        q.checked_mul(numerator)
            .and_then(|head| head.checked_add(tail))
            .ok_or(RevenueError::ArithmeticOverflow)
    }

    /// What a redeem by `holder` would pay right now.
    ///
    /// Zero when nothing is owed; never more than the undistributed balance.
    pub fn pending(
        &self,
        holder: &HolderId,
        owned: u64,
        total_issued: u64,
    ) -> Result<Amount, RevenueError> {
        let entitlement = self.entitlement(owned, total_issued)?;
        let owed = entitlement.saturating_sub(self.claimed(holder));
        Ok(owed.min(self.balance()))
    }

    /// Record the pending payout for `holder` in the claim ledger.
    ///
    /// Returns `None`, with no state change, when nothing is owed.
    pub fn commit_claim(
        &mut self,
        holder: HolderId,
        owned: u64,
        total_issued: u64,
    ) -> Result<Option<Claim>, RevenueError> {
        let amount = self.pending(&holder, owned, total_issued)?;
        if amount == 0 {
            debug!(%holder, "nothing to claim");
            return Ok(None);
        }
        *self.claimed.entry(holder).or_insert(0) += amount;
        self.total_claimed += amount;
        Ok(Some(Claim { holder, amount }))
    }

    /// Reverse a claim produced by [`commit_claim`](Self::commit_claim).
    pub fn rollback_claim(&mut self, claim: &Claim) {
        if let Some(paid) = self.claimed.get_mut(&claim.holder) {
            *paid = paid.saturating_sub(claim.amount);
            if *paid == 0 {
                self.claimed.remove(&claim.holder);
            }
        }
        self.total_claimed = self.total_claimed.saturating_sub(claim.amount);
    }

    /// Commit the holder's pending payout, then transfer it through `sink`.
    ///
    /// Returns the amount paid, zero when nothing is owed. A failed transfer
    /// rolls the claim back and leaves the ledger as it was.
    pub fn redeem<S: PayoutSink + ?Sized>(
        &mut self,
        holder: HolderId,
        owned: u64,
        total_issued: u64,
        sink: &S,
    ) -> Result<Amount, RevenueError> {
        let Some(claim) = self.commit_claim(holder, owned, total_issued)? else {
            return Ok(0);
        };
        if let Err(err) = sink.transfer(&claim.holder, claim.amount) {
            warn!(%holder, amount = claim.amount, %err, "payout transfer failed, rolling back claim");
            self.rollback_claim(&claim);
            return Err(RevenueError::TransferFailed(err));
        }
        info!(%holder, amount = claim.amount, "redeemed");
        Ok(claim.amount)
    }
}
