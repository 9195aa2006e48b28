//! Collection constants. All monetary values in base units (1 COIN = 10^18 units).

use crate::types::Amount;

pub const COIN: Amount = 1_000_000_000_000_000_000;

/// Number of decimal places in one [`COIN`].
pub const COIN_DECIMALS: u32 = 18;

/// Total number of tokens the collection can ever issue.
pub const MAX_SUPPLY: u64 = 2000;

/// Number of pools the supply is split into. Each pool runs one auction cycle
/// and unlocks one tenth of collected revenue when it sells out.
pub const POOL_COUNT: u64 = 10;

/// Price at the start of every pool's auction.
pub const START_PRICE: Amount = 20 * COIN;

/// Price the auction settles at once the duration has elapsed.
pub const FLOOR_PRICE: Amount = COIN / 100;

/// Length of the descending phase of a pool's auction, in seconds.
///
/// The price drops about 3.9333 per hour and settles at the floor
/// between hour 5 and hour 6.
///
/// ```
/// use arbi_core::constants::AUCTION_DURATION_SECS;
/// assert!(AUCTION_DURATION_SECS > 5 * 3600 && AUCTION_DURATION_SECS < 6 * 3600);
/// ```
pub const AUCTION_DURATION_SECS: u64 = 18_296;

/// Default buffer size of the node's event broadcast channel.
pub const DEFAULT_EVENT_CAPACITY: usize = 1024;
