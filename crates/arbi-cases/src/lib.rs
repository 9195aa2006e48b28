//! # arbi-cases: companion issuance for qualifying Arbibots.
//!
//! Holders of an original token whose id is on a static allowlist may claim
//! one companion token per qualifying id, exactly once. The companion only
//! reads ownership facts through [`arbi_core::traits::OwnershipView`]; it
//! never mutates the collection.

pub mod allowlist;
pub mod error;
pub mod issuer;

pub use allowlist::Allowlist;
pub use error::CaseError;
pub use issuer::{CaseIssuer, Redemption};
