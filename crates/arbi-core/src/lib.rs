//! # arbi-core
//! Pricing, issuance and revenue-sharing engine for the Arbibots collection.
//!
//! All value arithmetic is integer-only with `u128` intermediates:
//! - [`pricing`] maps elapsed pool time to a linearly descending unit price.
//! - [`supply`] assigns sequential token ids and keeps the holder index.
//! - [`revenue`] tracks collected revenue and per-holder claims.
//! - [`issuance`] drives the per-pool auction state machine.
//! - [`collection`] owns all of the above as one explicit state object.

pub mod collection;
pub mod constants;
pub mod error;
pub mod event;
pub mod issuance;
pub mod payout;
pub mod pricing;
pub mod revenue;
pub mod supply;
pub mod traits;
pub mod types;

pub use collection::Collection;
pub use event::Event;
pub use payout::MemoryPayouts;
pub use types::{Amount, CollectionParams, HolderId, Timestamp, TokenId};
