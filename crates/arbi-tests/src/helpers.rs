//! Shared test helpers for scenario and adversarial tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use arbi_cases::{Allowlist, CaseIssuer};
use arbi_core::constants::COIN;
use arbi_core::error::TransferError;
use arbi_core::traits::PayoutSink;
use arbi_core::types::{Amount, CollectionParams, HolderId, Timestamp, TokenId};
use arbi_core::{Collection, MemoryPayouts};
use arbi_node_lib::Applier;

/// Holder identity from a seed byte.
pub fn holder(seed: u8) -> HolderId {
    HolderId([seed; 20])
}

/// Twelve tokens in three pools, 10 → 1 coin over 100 seconds.
pub fn small_params() -> CollectionParams {
    CollectionParams {
        max_supply: 12,
        pool_count: 3,
        start_price: 10 * COIN,
        floor_price: COIN,
        auction_duration_secs: 100,
    }
}

/// Payout sink that refuses every transfer while `fail` is set.
#[derive(Default)]
pub struct ToggleSink {
    pub fail: AtomicBool,
    pub inner: MemoryPayouts,
}

impl ToggleSink {
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn total_paid(&self) -> Amount {
        self.inner.total_paid()
    }
}

impl PayoutSink for ToggleSink {
    fn transfer(&self, to: &HolderId, amount: Amount) -> Result<(), TransferError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(TransferError("transfer refused".into()));
        }
        self.inner.transfer(to, amount)
    }
}

/// Applier opened at `opened_at` over `params`.
pub fn applier(
    params: CollectionParams,
    allowlist: Allowlist,
    opened_at: Timestamp,
    sink: Arc<dyn PayoutSink>,
) -> Applier {
    let collection = Collection::new(params, opened_at).expect("valid params");
    Applier::new(collection, CaseIssuer::new(allowlist), sink, 4096)
}

/// Buy `n` tokens for `who`, each paying the current price at `now`.
pub fn buy_n(applier: &Applier, who: HolderId, n: u64, now: Timestamp) -> Vec<TokenId> {
    (0..n)
        .map(|_| {
            let price = applier.current_price(now);
            applier.purchase(who, price, now).expect("purchase at current price")
        })
        .collect()
}
