//! Serializable command log.
//!
//! One JSON object per line, tagged by `"op"`:
//!
//! ```text
//! {"op":"purchase","holder":"alice","paid":"20","now":1700000000}
//! {"op":"redeem","holder":"alice"}
//! {"op":"redeem_individual","holder":"alice","id":5}
//! {"op":"redeem_cases","holder":"alice"}
//! ```
//!
//! Applying the same log to the same starting state always yields the same
//! outcomes, since time is carried in the commands rather than read from a clock.

use arbi_cases::Redemption;
use arbi_core::types::{units, Amount, HolderId, Timestamp, TokenId};
use serde::{Deserialize, Serialize};

use crate::error::ApplyError;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Command {
    Purchase {
        holder: HolderId,
        #[serde(with = "units")]
        paid: Amount,
        now: Timestamp,
    },
    Redeem {
        holder: HolderId,
    },
    RedeemIndividual {
        holder: HolderId,
        id: TokenId,
    },
    RedeemCases {
        holder: HolderId,
    },
}

impl Command {
    pub fn holder(&self) -> &HolderId {
        match self {
            Self::Purchase { holder, .. }
            | Self::Redeem { holder }
            | Self::RedeemIndividual { holder, .. }
            | Self::RedeemCases { holder } => holder,
        }
    }
}

/// Result of applying one command.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    Purchased {
        token_id: TokenId,
    },
    /// Zero is a valid payout: nothing was owed.
    Redeemed {
        #[serde(with = "units")]
        payout: Amount,
    },
    CompanionIssued {
        companion_id: TokenId,
    },
    CompanionBatch {
        issued: Vec<Redemption>,
    },
    /// The command failed its preconditions and changed nothing.
    Rejected {
        error: String,
    },
}

impl Outcome {
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }
}

/// Parse a JSON-lines command log. Blank lines and lines starting with `#`
/// are skipped.
///
/// # Errors
///
/// [`ApplyError::InvalidCommand`] with the 1-based line number of the first
/// line that is not a valid command.
pub fn parse_log(text: &str) -> Result<Vec<Command>, ApplyError> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with('#')
        })
        .map(|(idx, line)| {
            serde_json::from_str(line).map_err(|e| ApplyError::InvalidCommand {
                line: idx + 1,
                reason: e.to_string(),
            })
        })
        .collect()
}
