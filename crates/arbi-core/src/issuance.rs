//! Issuance state machine: one descending auction per pool.
//!
//! ```text
//!   Active(0) ──pool sells out──► Active(1) ──► … ──► Active(n-1) ──► SoldOut
//! ```
//!
//! Each transition resets the auction clock to the instant of the purchase
//! that filled the pool, so the next pool opens at the start price. Filling
//! the final pool moves to the terminal `SoldOut` phase; the pool index never
//! leaves `0..pool_count`.
//!
//! Every precondition is checked before anything is mutated, so a rejected
//! purchase leaves supply, revenue and auction state exactly as they were.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::IssuanceError;
use crate::event::Event;
use crate::pricing::PricingEngine;
use crate::revenue::RevenuePool;
use crate::supply::SupplyLedger;
use crate::types::{Amount, CollectionParams, HolderId, Timestamp, TokenId};

/// Auction clock and fill level of the current pool.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct AuctionState {
    pub current_pool_index: u64,
    pub pool_start_time: Timestamp,
    pub issued_in_current_pool: u64,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Auction running for the given pool.
    Active(u64),
    /// Every token has been issued; terminal.
    SoldOut,
}

#[derive(Clone, Debug)]
pub struct IssuanceController {
    pricing: PricingEngine,
    pool_count: u64,
    tokens_per_pool: u64,
    state: AuctionState,
    sold_out: bool,
}

impl IssuanceController {
    /// Start the first pool's auction at `opened_at`. `params` must be valid.
    pub fn new(params: &CollectionParams, opened_at: Timestamp) -> Self {
        Self {
            pricing: PricingEngine::from_params(params),
            pool_count: params.pool_count,
            tokens_per_pool: params.tokens_per_pool(),
            state: AuctionState {
                current_pool_index: 0,
                pool_start_time: opened_at,
                issued_in_current_pool: 0,
            },
            sold_out: false,
        }
    }

    pub fn pricing(&self) -> &PricingEngine {
        &self.pricing
    }

    pub fn state(&self) -> AuctionState {
        self.state
    }

    pub fn phase(&self) -> Phase {
        if self.sold_out {
            Phase::SoldOut
        } else {
            Phase::Active(self.state.current_pool_index)
        }
    }

    /// Unit price at `now` in the current pool.
    pub fn current_price(&self, now: Timestamp) -> Amount {
        self.pricing.price_at(now, self.state.pool_start_time)
    }

    /// Accept a purchase of one token by `holder`, paying `paid`.
    ///
    /// The full payment is credited to `revenue`; overpayment is not refunded.
    ///
    /// # Errors
    ///
    /// - [`IssuanceError::SupplyExhausted`] once every token is issued (checked first)
    /// - [`IssuanceError::PriceNotMet`] if `paid` is below the current price
    /// - [`IssuanceError::ArithmeticOverflow`] if the collected total would overflow
    pub fn purchase(
        &mut self,
        supply: &mut SupplyLedger,
        revenue: &mut RevenuePool,
        events: &mut Vec<Event>,
        holder: HolderId,
        paid: Amount,
        now: Timestamp,
    ) -> Result<TokenId, IssuanceError> {
        let max_supply = supply.max_supply();
        if self.sold_out || supply.is_exhausted() {
            return Err(IssuanceError::SupplyExhausted { max_supply });
        }

        let price = self.current_price(now);
        if paid < price {
            debug!(%holder, paid, price, "price not met");
            return Err(IssuanceError::PriceNotMet { paid, price });
        }
        if !revenue.can_credit(paid) {
            return Err(IssuanceError::ArithmeticOverflow);
        }

        let token_id = supply
            .issue(holder)
            .map_err(|_| IssuanceError::SupplyExhausted { max_supply })?;
        revenue
            .credit(paid)
            .map_err(|_| IssuanceError::ArithmeticOverflow)?;
        self.state.issued_in_current_pool += 1;

        info!(%holder, %token_id, paid, pool = self.state.current_pool_index, "purchase accepted");
        events.push(Event::PurchaseAccepted {
            holder,
            token_id,
            paid,
        });

        if self.state.issued_in_current_pool == self.tokens_per_pool {
            self.advance_pool(now, events);
        }

        Ok(token_id)
    }

    fn advance_pool(&mut self, now: Timestamp, events: &mut Vec<Event>) {
        let completed_pool = self.state.current_pool_index;
        let next_pool = if completed_pool + 1 < self.pool_count {
            self.state.current_pool_index += 1;
            Some(self.state.current_pool_index)
        } else {
            self.sold_out = true;
            None
        };
        self.state.pool_start_time = now;
        self.state.issued_in_current_pool = 0;

        info!(completed_pool, ?next_pool, at = now, "pool sold out");
        events.push(Event::PoolReset {
            completed_pool,
            next_pool,
            at: now,
        });
    }
}
