//! Linearly descending auction price.
//!
//! Within a pool the unit price falls in a straight line from the start price
//! to the floor price over the auction duration, then stays at the floor:
//!
//! ```text
//! price(e) = start - (start - floor) * min(e, duration) / duration
//! ```
//!
//! The decrement is floored, so the price is rounded up and never dips below
//! the floor. The product is split as `q * e + r * e / duration` (with
//! `start - floor = q * duration + r`) so it cannot overflow `u128` for any
//! inputs.

use crate::types::{Amount, CollectionParams, Timestamp};

/// Pure price function for one pool's auction cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PricingEngine {
    start_price: Amount,
    floor_price: Amount,
    duration_secs: u64,
}

impl PricingEngine {
    /// Build from validated parameters.
    pub fn from_params(params: &CollectionParams) -> Self {
        Self {
            start_price: params.start_price,
            floor_price: params.floor_price,
            duration_secs: params.auction_duration_secs,
        }
    }

    pub fn start_price(&self) -> Amount {
        self.start_price
    }

    pub fn floor_price(&self) -> Amount {
        self.floor_price
    }

    pub fn duration_secs(&self) -> u64 {
        self.duration_secs
    }

    /// Price after `elapsed` seconds in the current pool.
    ///
    /// `0` yields the start price; anything at or beyond the duration yields
    /// exactly the floor price.
    pub fn current_price(&self, elapsed: u64) -> Amount {
        if self.duration_secs == 0 || elapsed >= self.duration_secs {
            return self.floor_price;
        }
        let span = self.start_price.saturating_sub(self.floor_price);
        let duration = self.duration_secs as u128;
        let e = elapsed as u128;
        let drop = (span / duration) * e + (span % duration) * e / duration;
        self.start_price.saturating_sub(drop).max(self.floor_price)
    }

    /// Price at wall-clock `now` for a pool that opened at `pool_start`.
    ///
    /// A `now` earlier than the pool start counts as zero elapsed time.
    pub fn price_at(&self, now: Timestamp, pool_start: Timestamp) -> Amount {
        self.current_price(now.saturating_sub(pool_start))
    }

    /// `(elapsed, price)` samples every `step` seconds, ending with the first
    /// sample at the floor. An empty schedule is returned for `step == 0`.
    pub fn schedule(&self, step: u64) -> Vec<(u64, Amount)> {
        let mut out = Vec::new();
        if step == 0 {
            return out;
        }
        let mut elapsed = 0u64;
        loop {
            let price = self.current_price(elapsed);
            out.push((elapsed, price));
            if price == self.floor_price || elapsed >= self.duration_secs {
                break;
            }
            elapsed = elapsed.saturating_add(step);
        }
        out
    }
}
