//! Error types for the Arbibots engine.
use thiserror::Error;

use crate::types::{Amount, TokenId};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParamsError {
    #[error("max supply must be positive")] ZeroSupply,
    #[error("pool count must be positive")] ZeroPools,
    #[error("max supply {max_supply} not divisible into {pool_count} pools")] UnevenPools { max_supply: u64, pool_count: u64 },
    #[error("floor price {floor} above start price {start}")] FloorAboveStart { floor: Amount, start: Amount },
    #[error("auction duration must be positive")] ZeroDuration,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SupplyError {
    #[error("no more supply: {max_supply} issued")] SupplyExhausted { max_supply: u64 },
    #[error("unknown token: {0}")] UnknownToken(TokenId),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IssuanceError {
    #[error("price not met: paid {paid}, price {price}")] PriceNotMet { paid: Amount, price: Amount },
    #[error("no more supply: {max_supply} issued")] SupplyExhausted { max_supply: u64 },
    #[error("arithmetic overflow")] ArithmeticOverflow,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RevenueError {
    #[error("payout transfer failed: {0}")] TransferFailed(#[from] TransferError),
    #[error("arithmetic overflow")] ArithmeticOverflow,
}

/// Failure reported by a [`PayoutSink`](crate::traits::PayoutSink).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct TransferError(pub String);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HolderParseError {
    #[error("empty holder id")] Empty,
    #[error("invalid hex in holder id")] InvalidHex,
    #[error("holder id must be 20 bytes, got {0}")] InvalidLength(usize),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AmountParseError {
    #[error("empty amount")] Empty,
    #[error("invalid digits: {0}")] InvalidDigit(String),
    #[error("too many decimal places: {0}")] TooPrecise(usize),
    #[error("amount overflow")] Overflow,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    #[error("pool index {index} outside 0..{pool_count}")] PoolIndexOutOfRange { index: u64, pool_count: u64 },
    #[error("issued {issued} exceeds max supply {max_supply}")] SupplyExceeded { issued: u64, max_supply: u64 },
    #[error("pool holds {issued} of {tokens_per_pool} without resetting")] PoolOverfilled { issued: u64, tokens_per_pool: u64 },
    #[error("claimed {claimed} exceeds collected {collected}")] Insolvent { claimed: Amount, collected: Amount },
    #[error("holder claimed {claimed} above entitlement {entitlement}")] OverClaimed { claimed: Amount, entitlement: Amount },
}

#[derive(Error, Debug)]
pub enum ArbiError {
    #[error(transparent)] Params(#[from] ParamsError),
    #[error(transparent)] Supply(#[from] SupplyError),
    #[error(transparent)] Issuance(#[from] IssuanceError),
    #[error(transparent)] Revenue(#[from] RevenueError),
    #[error(transparent)] Invariant(#[from] InvariantViolation),
}
