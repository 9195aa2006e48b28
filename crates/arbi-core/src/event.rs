//! Notifications emitted by state-changing operations.

use serde::{Deserialize, Serialize};

use crate::types::{units, Amount, HolderId, Timestamp, TokenId};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    /// A purchase was accepted and `token_id` issued to `holder`.
    PurchaseAccepted {
        holder: HolderId,
        token_id: TokenId,
        #[serde(with = "units")]
        paid: Amount,
    },
    /// Pool `completed_pool` sold out. `next_pool` is `None` when it was the last one.
    PoolReset {
        completed_pool: u64,
        next_pool: Option<u64>,
        at: Timestamp,
    },
    /// `payout` was committed to `holder`'s claim and transferred.
    Redeemed {
        holder: HolderId,
        #[serde(with = "units")]
        payout: Amount,
    },
    /// A committed claim was reversed because the transfer failed. No
    /// `Redeemed` precedes it.
    RedeemRolledBack {
        holder: HolderId,
        #[serde(with = "units")]
        payout: Amount,
        reason: String,
    },
    /// A companion token was issued against `original_id`.
    CompanionIssued {
        holder: HolderId,
        original_id: TokenId,
        companion_id: TokenId,
    },
}

impl Event {
    /// Holder the event concerns, if any.
    pub fn holder(&self) -> Option<&HolderId> {
        match self {
            Self::PurchaseAccepted { holder, .. }
            | Self::Redeemed { holder, .. }
            | Self::RedeemRolledBack { holder, .. }
            | Self::CompanionIssued { holder, .. } => Some(holder),
            Self::PoolReset { .. } => None,
        }
    }
}
