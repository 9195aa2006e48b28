//! Companion issuance errors.

use arbi_core::types::{HolderId, TokenId};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CaseError {
    /// The caller does not own the original token.
    #[error("minter must be owner: {holder} does not own {id}")]
    NotOwner { holder: HolderId, id: TokenId },

    /// A companion has already been issued against this original id.
    #[error("already redeemed: {0}")]
    AlreadyRedeemed(TokenId),

    /// The original id is not on the allowlist.
    #[error("not eligible: {0}")]
    NotEligible(TokenId),

    /// An allowlist record could not be read.
    #[error("invalid allowlist record on line {line}: {reason}")]
    InvalidRecord { line: usize, reason: String },

    /// An allowlisted id lies outside the original collection's id range.
    #[error("allowlisted id {id} outside 0..{max_supply}")]
    IdOutOfRange { id: TokenId, max_supply: u64 },
}
