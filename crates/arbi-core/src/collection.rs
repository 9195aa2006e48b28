//! The collection: one explicit state object owning every ledger.
//!
//! [`Collection`] composes the [`IssuanceController`], [`SupplyLedger`] and
//! [`RevenuePool`] and is the only place their mutations are sequenced. It
//! holds no locks itself; callers that share it wrap it in a single mutex
//! (see the node's applier), which serializes every mutating operation.
//!
//! Redemption is split into [`commit_redeem`](Collection::commit_redeem) and
//! [`rollback_redeem`](Collection::rollback_redeem) so the transfer can run
//! after the claim is recorded and outside any lock;
//! [`redeem`](Collection::redeem) does all three steps inline.

use tracing::warn;

use crate::error::{IssuanceError, InvariantViolation, ParamsError, RevenueError};
use crate::event::Event;
use crate::issuance::{AuctionState, IssuanceController, Phase};
use crate::revenue::{Claim, RevenuePool};
use crate::supply::SupplyLedger;
use crate::traits::{OwnershipView, PayoutSink};
use crate::types::{Amount, CollectionParams, HolderId, Timestamp, TokenId};

#[derive(Clone, Debug)]
pub struct Collection {
    params: CollectionParams,
    issuance: IssuanceController,
    supply: SupplyLedger,
    revenue: RevenuePool,
    events: Vec<Event>,
}

impl Collection {
    /// Open a collection whose first pool's auction starts at `opened_at`.
    ///
    /// # Errors
    ///
    /// Any [`ParamsError`] from [`CollectionParams::validate`].
    pub fn new(params: CollectionParams, opened_at: Timestamp) -> Result<Self, ParamsError> {
        params.validate()?;
        Ok(Self {
            issuance: IssuanceController::new(&params, opened_at),
            supply: SupplyLedger::new(params.max_supply),
            revenue: RevenuePool::new(&params),
            events: Vec::new(),
            params,
        })
    }

    pub fn params(&self) -> &CollectionParams {
        &self.params
    }

    pub fn phase(&self) -> Phase {
        self.issuance.phase()
    }

    pub fn auction_state(&self) -> AuctionState {
        self.issuance.state()
    }

    pub fn supply(&self) -> &SupplyLedger {
        &self.supply
    }

    pub fn revenue(&self) -> &RevenuePool {
        &self.revenue
    }

    /// Unit price at `now` in the current pool.
    pub fn current_price(&self, now: Timestamp) -> Amount {
        self.issuance.current_price(now)
    }

    /// Buy one token for `holder`. See [`IssuanceController::purchase`].
    pub fn purchase(
        &mut self,
        holder: HolderId,
        paid: Amount,
        now: Timestamp,
    ) -> Result<TokenId, IssuanceError> {
        self.issuance.purchase(
            &mut self.supply,
            &mut self.revenue,
            &mut self.events,
            holder,
            paid,
            now,
        )
    }

    pub fn total_collected(&self) -> Amount {
        self.revenue.total_collected()
    }

    pub fn total_claimed(&self) -> Amount {
        self.revenue.total_claimed()
    }

    /// Collected value not yet paid out.
    pub fn balance(&self) -> Amount {
        self.revenue.balance()
    }

    pub fn unlocked_pools(&self) -> u64 {
        self.revenue.unlocked_pools(self.supply.total_issued())
    }

    /// Accrued share of revenue for `holder`'s current holdings, paid or not.
    pub fn entitlement(&self, holder: &HolderId) -> Result<Amount, RevenueError> {
        self.revenue
            .entitlement(self.supply.ownership_count(holder), self.supply.total_issued())
    }

    /// What a redeem by `holder` would pay right now.
    pub fn pending_payout(&self, holder: &HolderId) -> Result<Amount, RevenueError> {
        self.revenue.pending(
            holder,
            self.supply.ownership_count(holder),
            self.supply.total_issued(),
        )
    }

    /// Record `holder`'s pending payout in the claim ledger. The caller must
    /// transfer the returned claim, then hand it to
    /// [`confirm_redeem`](Self::confirm_redeem) on success or
    /// [`rollback_redeem`](Self::rollback_redeem) on failure.
    ///
    /// Returns `None` with no state change when nothing is owed.
    pub fn commit_redeem(&mut self, holder: HolderId) -> Result<Option<Claim>, RevenueError> {
        self.revenue.commit_claim(
            holder,
            self.supply.ownership_count(&holder),
            self.supply.total_issued(),
        )
    }

    /// Emit [`Event::Redeemed`] for a claim whose transfer went through.
    pub fn confirm_redeem(&mut self, claim: &Claim) {
        self.events.push(Event::Redeemed {
            holder: claim.holder,
            payout: claim.amount,
        });
    }

    /// Undo a committed claim whose transfer failed.
    pub fn rollback_redeem(&mut self, claim: &Claim, reason: &str) {
        warn!(holder = %claim.holder, amount = claim.amount, reason, "rolling back redeem");
        self.revenue.rollback_claim(claim);
        self.events.push(Event::RedeemRolledBack {
            holder: claim.holder,
            payout: claim.amount,
            reason: reason.to_string(),
        });
    }

    /// Pay `holder` everything currently owed through `sink`.
    ///
    /// The claim is committed before the transfer. Zero is a valid result
    /// when nothing is owed.
    ///
    /// # Errors
    ///
    /// [`RevenueError::TransferFailed`] if the sink refuses; the claim is
    /// rolled back first, so the holder can redeem again later.
    pub fn redeem<S: PayoutSink + ?Sized>(
        &mut self,
        holder: HolderId,
        sink: &S,
    ) -> Result<Amount, RevenueError> {
        let Some(claim) = self.commit_redeem(holder)? else {
            return Ok(0);
        };
        if let Err(err) = sink.transfer(&claim.holder, claim.amount) {
            self.rollback_redeem(&claim, &err.0);
            return Err(RevenueError::TransferFailed(err));
        }
        self.confirm_redeem(&claim);
        Ok(claim.amount)
    }

    /// Hand out buffered events in emission order.
    pub fn drain_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    /// Verify the numeric invariants that must hold after every operation.
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        let state = self.issuance.state();
        if state.current_pool_index >= self.params.pool_count {
            return Err(InvariantViolation::PoolIndexOutOfRange {
                index: state.current_pool_index,
                pool_count: self.params.pool_count,
            });
        }
        let issued = self.supply.total_issued();
        if issued > self.params.max_supply {
            return Err(InvariantViolation::SupplyExceeded {
                issued,
                max_supply: self.params.max_supply,
            });
        }
        if state.issued_in_current_pool >= self.params.tokens_per_pool() {
            return Err(InvariantViolation::PoolOverfilled {
                issued: state.issued_in_current_pool,
                tokens_per_pool: self.params.tokens_per_pool(),
            });
        }
        let claimed: Amount = self.revenue.claims().map(|(_, amount)| *amount).sum();
        if claimed > self.revenue.total_collected() {
            return Err(InvariantViolation::Insolvent {
                claimed,
                collected: self.revenue.total_collected(),
            });
        }
        for (holder, paid) in self.revenue.claims() {
            let entitlement = self
                .entitlement(holder)
                .map_err(|_| InvariantViolation::OverClaimed {
                    claimed: *paid,
                    entitlement: 0,
                })?;
            if *paid > entitlement {
                return Err(InvariantViolation::OverClaimed {
                    claimed: *paid,
                    entitlement,
                });
            }
        }
        Ok(())
    }
}

impl OwnershipView for Collection {
    fn owner_of(&self, id: TokenId) -> Option<HolderId> {
        self.supply.owner_of(id)
    }

    fn ownership_count(&self, holder: &HolderId) -> u64 {
        self.supply.ownership_count(holder)
    }

    fn tokens_of(&self, holder: &HolderId) -> Vec<TokenId> {
        self.supply.tokens_of(holder)
    }

    fn total_issued(&self) -> u64 {
        self.supply.total_issued()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{COIN, START_PRICE};
    use crate::error::TransferError;
    use crate::payout::MemoryPayouts;
    use proptest::prelude::*;

    const T0: Timestamp = 1_700_000_000;

    fn holder(seed: u8) -> HolderId {
        HolderId([seed; 20])
    }

    fn default_collection() -> Collection {
        Collection::new(CollectionParams::default(), T0).unwrap()
    }

    struct Refuse;

    impl PayoutSink for Refuse {
        fn transfer(&self, _to: &HolderId, _amount: Amount) -> Result<(), TransferError> {
            Err(TransferError("no".into()))
        }
    }

    #[test]
    fn rejects_invalid_params() {
        let params = CollectionParams {
            pool_count: 0,
            ..CollectionParams::default()
        };
        assert_eq!(Collection::new(params, T0).unwrap_err(), ParamsError::ZeroPools);
    }

    #[test]
    fn first_pool_share_is_forty() {
        let mut c = default_collection();
        let sink = MemoryPayouts::new();
        for _ in 0..200 {
            c.purchase(holder(1), START_PRICE, T0).unwrap();
        }
        assert_eq!(c.total_collected(), 4000 * COIN);
        assert_eq!(c.unlocked_pools(), 1);
        assert_eq!(c.redeem(holder(1), &sink).unwrap(), 40 * COIN);
        assert_eq!(c.redeem(holder(1), &sink).unwrap(), 0);
        c.check_invariants().unwrap();
    }

    #[test]
    fn redeem_before_unlock_pays_nothing() {
        let mut c = default_collection();
        let sink = MemoryPayouts::new();
        for _ in 0..199 {
            c.purchase(holder(1), START_PRICE, T0).unwrap();
        }
        assert_eq!(c.redeem(holder(1), &sink).unwrap(), 0);
        assert!(c
            .drain_events()
            .iter()
            .all(|e| !matches!(e, Event::Redeemed { .. })));
    }

    #[test]
    fn sole_holder_drains_everything() {
        let mut c = default_collection();
        let sink = MemoryPayouts::new();
        let mut now = T0;
        for _ in 0..2000 {
            let price = c.current_price(now);
            c.purchase(holder(2), price, now).unwrap();
            now += 1;
        }
        assert_eq!(c.phase(), Phase::SoldOut);
        let collected = c.total_collected();
        assert_eq!(c.redeem(holder(2), &sink).unwrap(), collected);
        assert_eq!(c.balance(), 0);
        assert_eq!(c.redeem(holder(1), &sink).unwrap(), 0);
        c.check_invariants().unwrap();
    }

    #[test]
    fn failed_redeem_emits_rollback_and_restores() {
        let mut c = default_collection();
        for _ in 0..200 {
            c.purchase(holder(1), START_PRICE, T0).unwrap();
        }
        c.drain_events();
        let err = c.redeem(holder(1), &Refuse).unwrap_err();
        assert!(matches!(err, RevenueError::TransferFailed(_)));
        assert_eq!(c.total_claimed(), 0);
        let events = c.drain_events();
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], Event::RedeemRolledBack { .. }));
        assert_eq!(c.pending_payout(&holder(1)).unwrap(), 40 * COIN);
    }

    #[test]
    fn redeemed_event_waits_for_confirmation() {
        let mut c = default_collection();
        for _ in 0..200 {
            c.purchase(holder(1), START_PRICE, T0).unwrap();
        }
        c.drain_events();
        let claim = c.commit_redeem(holder(1)).unwrap().unwrap();
        assert!(c.drain_events().is_empty());
        c.confirm_redeem(&claim);
        assert_eq!(
            c.drain_events(),
            vec![Event::Redeemed {
                holder: holder(1),
                payout: 40 * COIN
            }]
        );
    }

    #[test]
    fn drain_events_empties_buffer() {
        let mut c = default_collection();
        c.purchase(holder(1), START_PRICE, T0).unwrap();
        assert_eq!(c.drain_events().len(), 1);
        assert!(c.drain_events().is_empty());
    }

    #[test]
    fn ownership_view_delegates() {
        let mut c = default_collection();
        c.purchase(holder(1), START_PRICE, T0).unwrap();
        c.purchase(holder(2), START_PRICE, T0).unwrap();
        assert_eq!(c.owner_of(TokenId(1)), Some(holder(2)));
        assert_eq!(c.ownership_count(&holder(1)), 1);
        assert_eq!(OwnershipView::total_issued(&c), 2);
        assert!(c.owns(&holder(1), TokenId(0)));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn invariants_hold_under_arbitrary_sequences(
            ops in prop::collection::vec((0u8..3, 0u8..3, 0u64..40_000, 0u128..25), 1..400),
        ) {
            let params = CollectionParams { max_supply: 60, pool_count: 6, ..CollectionParams::default() };
            let mut c = Collection::new(params, T0).unwrap();
            let sink = MemoryPayouts::new();
            for (kind, who, dt, coins) in ops {
                let h = holder(who);
                match kind {
                    0 | 1 => {
                        let before = (c.supply().total_issued(), c.total_collected(), c.auction_state());
                        if c.purchase(h, coins * COIN, T0 + dt).is_err() {
                            let after = (c.supply().total_issued(), c.total_collected(), c.auction_state());
                            prop_assert_eq!(before, after);
                        }
                    }
                    _ => {
                        c.redeem(h, &sink).unwrap();
                    }
                }
                prop_assert!(c.check_invariants().is_ok(), "{:?}", c.check_invariants());
            }
            prop_assert_eq!(sink.total_paid(), c.total_claimed());
        }
    }
}
