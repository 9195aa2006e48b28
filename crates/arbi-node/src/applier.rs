//! Single writer over the collection and its companion.
//!
//! All bookkeeping happens under one `parking_lot::Mutex`, so operations are
//! applied one at a time in a total order. Payout transfers are the only step
//! performed outside the lock: the claim is committed first, the lock is
//! released, the sink is called, and a failed transfer re-takes the lock to
//! roll the claim back. A redeem issued from inside the transfer therefore
//! sees the committed claim and is owed nothing.
//!
//! Every event produced by an operation is published on a `tokio` broadcast
//! channel while the lock is still held, so subscribers observe events in
//! application order.

use std::sync::Arc;

use arbi_cases::{Allowlist, CaseIssuer, Redemption};
use arbi_core::error::RevenueError;
use arbi_core::event::Event;
use arbi_core::traits::PayoutSink;
use arbi_core::types::{Amount, CollectionParams, HolderId, Timestamp, TokenId};
use arbi_core::Collection;
use parking_lot::{Mutex, MutexGuard};
use tokio::sync::broadcast;
use tracing::debug;

use crate::command::{Command, Outcome};
use crate::config::NodeConfig;
use crate::error::ApplyError;

/// The mutable state guarded by the applier.
#[derive(Debug)]
pub struct Market {
    pub collection: Collection,
    pub cases: CaseIssuer,
}

impl Market {
    fn drain_events(&mut self) -> Vec<Event> {
        let mut events = self.collection.drain_events();
        events.extend(self.cases.drain_events());
        events
    }
}

pub struct Applier {
    market: Mutex<Market>,
    sink: Arc<dyn PayoutSink>,
    events: broadcast::Sender<Event>,
}

impl Applier {
    pub fn new(
        collection: Collection,
        cases: CaseIssuer,
        sink: Arc<dyn PayoutSink>,
        event_capacity: usize,
    ) -> Self {
        let (events, _) = broadcast::channel(event_capacity.max(1));
        Self {
            market: Mutex::new(Market { collection, cases }),
            sink,
            events,
        }
    }

    /// Open a collection at `opened_at` from configuration. The allowlist is
    /// checked against the configured supply.
    pub fn from_config(
        config: &NodeConfig,
        allowlist: Allowlist,
        opened_at: Timestamp,
        sink: Arc<dyn PayoutSink>,
    ) -> Result<Self, ApplyError> {
        let collection = Collection::new(config.collection.clone(), opened_at)?;
        let allowlist = allowlist.bounded(config.collection.max_supply)?;
        Ok(Self::new(
            collection,
            CaseIssuer::new(allowlist),
            sink,
            config.event_capacity,
        ))
    }

    /// Receive every event published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }

    /// Run `f` against a consistent view of the state.
    pub fn with_market<R>(&self, f: impl FnOnce(&Market) -> R) -> R {
        f(&self.market.lock())
    }

    pub fn params(&self) -> CollectionParams {
        self.market.lock().collection.params().clone()
    }

    pub fn current_price(&self, now: Timestamp) -> Amount {
        self.market.lock().collection.current_price(now)
    }

    pub fn redeemable(&self, id: TokenId) -> bool {
        self.market.lock().cases.redeemable(id)
    }

    pub fn purchase(
        &self,
        holder: HolderId,
        paid: Amount,
        now: Timestamp,
    ) -> Result<TokenId, ApplyError> {
        let mut market = self.market.lock();
        let result = market.collection.purchase(holder, paid, now);
        self.publish(&mut market);
        Ok(result?)
    }

    /// Pay `holder` everything currently owed. Returns the amount paid, zero
    /// when nothing is owed.
    pub fn redeem(&self, holder: HolderId) -> Result<Amount, ApplyError> {
        let claim = self.market.lock().collection.commit_redeem(holder)?;
        let Some(claim) = claim else {
            return Ok(0);
        };

        match self.sink.transfer(&claim.holder, claim.amount) {
            Ok(()) => {
                let mut market = self.market.lock();
                market.collection.confirm_redeem(&claim);
                self.publish(&mut market);
                Ok(claim.amount)
            }
            Err(err) => {
                let mut market = self.market.lock();
                market.collection.rollback_redeem(&claim, &err.0);
                self.publish(&mut market);
                Err(RevenueError::TransferFailed(err).into())
            }
        }
    }

    pub fn redeem_individual(&self, holder: HolderId, id: TokenId) -> Result<TokenId, ApplyError> {
        let mut market = self.market.lock();
        let Market { collection, cases } = &mut *market;
        let result = cases.redeem_individual(&*collection, holder, id);
        self.publish(&mut market);
        Ok(result?)
    }

    /// Issue companions for every eligible id `holder` owns.
    pub fn redeem_cases(&self, holder: HolderId) -> Vec<Redemption> {
        let mut market = self.market.lock();
        let Market { collection, cases } = &mut *market;
        let issued = cases.redeem(&*collection, holder);
        self.publish(&mut market);
        issued
    }

    /// Apply one command. Failures become [`Outcome::Rejected`].
    pub fn apply(&self, command: &Command) -> Outcome {
        let result = match *command {
            Command::Purchase { holder, paid, now } => self
                .purchase(holder, paid, now)
                .map(|token_id| Outcome::Purchased { token_id }),
            Command::Redeem { holder } => self
                .redeem(holder)
                .map(|payout| Outcome::Redeemed { payout }),
            Command::RedeemIndividual { holder, id } => self
                .redeem_individual(holder, id)
                .map(|companion_id| Outcome::CompanionIssued { companion_id }),
            Command::RedeemCases { holder } => Ok(Outcome::CompanionBatch {
                issued: self.redeem_cases(holder),
            }),
        };
        result.unwrap_or_else(|err| {
            debug!(holder = %command.holder(), %err, "command rejected");
            Outcome::Rejected {
                error: err.to_string(),
            }
        })
    }

    /// Apply `commands` in order. A rejected command does not stop the replay.
    pub fn replay(&self, commands: &[Command]) -> Vec<Outcome> {
        commands.iter().map(|cmd| self.apply(cmd)).collect()
    }

    fn publish(&self, market: &mut MutexGuard<'_, Market>) {
        for event in market.drain_events() {
            // No subscribers is not an error.
            let _ = self.events.send(event);
        }
    }
}
