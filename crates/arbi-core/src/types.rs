//! Core collection types: identities, amounts, collection parameters.
//!
//! All monetary values are in base units (1 COIN = 10^18 units) and use
//! `u128` so that products of supply counts and collected revenue never
//! need floating point.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::constants::{
    AUCTION_DURATION_SECS, FLOOR_PRICE, MAX_SUPPLY, POOL_COUNT, START_PRICE,
};
use crate::error::{HolderParseError, ParamsError};

/// Value in base units.
pub type Amount = u128;

/// Caller-supplied Unix time in seconds.
pub type Timestamp = u64;

/// Identity of an issued token, in `[0, max_supply)`.
#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default,
)]
#[serde(transparent)]
pub struct TokenId(pub u64);

impl TokenId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u64> for TokenId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// A 20-byte holder identity.
///
/// Displays as `0x`-prefixed lowercase hex. Parsing accepts that form, and
/// derives an identity from any other string by hashing it, so that command
/// logs and tests can name holders (`"alice"`) instead of spelling out bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct HolderId(pub [u8; 20]);

impl HolderId {
    /// The all-zero identity.
    pub const ZERO: Self = Self([0u8; 20]);

    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Deterministic identity for a human-readable label: the first 20 bytes
    /// of `BLAKE3(label)`.
    pub fn from_label(label: &str) -> Self {
        let digest = blake3::hash(label.as_bytes());
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&digest.as_bytes()[..20]);
        Self(bytes)
    }
}

impl fmt::Display for HolderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for HolderId {
    type Err = HolderParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(HolderParseError::Empty);
        }
        match s.strip_prefix("0x") {
            Some(body) => {
                let raw = hex::decode(body).map_err(|_| HolderParseError::InvalidHex)?;
                let bytes: [u8; 20] = raw
                    .try_into()
                    .map_err(|raw: Vec<u8>| HolderParseError::InvalidLength(raw.len()))?;
                Ok(Self(bytes))
            }
            None => Ok(Self::from_label(s)),
        }
    }
}

impl Serialize for HolderId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for HolderId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Immutable configuration of a collection.
///
/// # Examples
///
/// ```
/// use arbi_core::CollectionParams;
/// let params = CollectionParams::default();
/// assert_eq!(params.tokens_per_pool(), 200);
/// assert!(params.validate().is_ok());
/// ```
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct CollectionParams {
    pub max_supply: u64,
    pub pool_count: u64,
    #[serde(with = "units")]
    pub start_price: Amount,
    #[serde(with = "units")]
    pub floor_price: Amount,
    pub auction_duration_secs: u64,
}

impl Default for CollectionParams {
    fn default() -> Self {
        Self {
            max_supply: MAX_SUPPLY,
            pool_count: POOL_COUNT,
            start_price: START_PRICE,
            floor_price: FLOOR_PRICE,
            auction_duration_secs: AUCTION_DURATION_SECS,
        }
    }
}

impl CollectionParams {
    /// Size of one pool. Meaningful only after [`validate`](Self::validate).
    pub fn tokens_per_pool(&self) -> u64 {
        if self.pool_count == 0 {
            return 0;
        }
        self.max_supply / self.pool_count
    }

    /// Reject parameter sets the engine cannot run faithfully.
    pub fn validate(&self) -> Result<(), ParamsError> {
        if self.max_supply == 0 {
            return Err(ParamsError::ZeroSupply);
        }
        if self.pool_count == 0 {
            return Err(ParamsError::ZeroPools);
        }
        if self.max_supply % self.pool_count != 0 {
            return Err(ParamsError::UnevenPools {
                max_supply: self.max_supply,
                pool_count: self.pool_count,
            });
        }
        if self.floor_price > self.start_price {
            return Err(ParamsError::FloorAboveStart {
                floor: self.floor_price,
                start: self.start_price,
            });
        }
        if self.auction_duration_secs == 0 {
            return Err(ParamsError::ZeroDuration);
        }
        Ok(())
    }
}

/// Decimal whole-unit representation of [`Amount`]s.
///
/// `"20"` is twenty coins, `"0.01"` one hundredth. Usable as a serde `with`
/// module; deserialization also accepts a bare integer number of coins.
pub mod units {
    use std::fmt;

    use serde::de::{self, Visitor};
    use serde::{Deserializer, Serializer};

    use crate::constants::{COIN, COIN_DECIMALS};
    use crate::error::AmountParseError;
    use crate::types::Amount;

    /// Parse a decimal string in whole coins into base units.
    ///
    /// ```
    /// use arbi_core::constants::COIN;
    /// use arbi_core::types::units;
    /// assert_eq!(units::parse("0.01").unwrap(), COIN / 100);
    /// assert_eq!(units::parse("20").unwrap(), 20 * COIN);
    /// ```
    pub fn parse(s: &str) -> Result<Amount, AmountParseError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(AmountParseError::Empty);
        }
        let (whole, frac) = match s.split_once('.') {
            Some((w, f)) => (w, f),
            None => (s, ""),
        };
        if whole.is_empty() && frac.is_empty() {
            return Err(AmountParseError::Empty);
        }
        if frac.len() > COIN_DECIMALS as usize {
            return Err(AmountParseError::TooPrecise(frac.len()));
        }
        let digits = |part: &str| -> Result<Amount, AmountParseError> {
            if part.is_empty() {
                return Ok(0);
            }
            if !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(AmountParseError::InvalidDigit(part.to_string()));
            }
            part.parse::<Amount>().map_err(|_| AmountParseError::Overflow)
        };
        let whole_units = digits(whole)?
            .checked_mul(COIN)
            .ok_or(AmountParseError::Overflow)?;
        let scale = 10u128.pow(COIN_DECIMALS - frac.len() as u32);
        let frac_units = digits(frac)? * scale;
        whole_units
            .checked_add(frac_units)
            .ok_or(AmountParseError::Overflow)
    }

    /// Render base units as a decimal string in whole coins, without
    /// trailing fractional zeros.
    ///
    /// ```
    /// use arbi_core::constants::COIN;
    /// use arbi_core::types::units;
    /// assert_eq!(units::format(COIN / 100), "0.01");
    /// assert_eq!(units::format(20 * COIN), "20");
    /// ```
    pub fn format(amount: Amount) -> String {
        let whole = amount / COIN;
        let frac = amount % COIN;
        if frac == 0 {
            return whole.to_string();
        }
        let padded = format!("{frac:0width$}", width = COIN_DECIMALS as usize);
        format!("{whole}.{}", padded.trim_end_matches('0'))
    }

    pub fn serialize<S: Serializer>(amount: &Amount, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format(*amount))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Amount, D::Error> {
        deserializer.deserialize_any(AmountVisitor)
    }

    struct AmountVisitor;

    impl<'de> Visitor<'de> for AmountVisitor {
        type Value = Amount;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a decimal amount in whole coins")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Amount, E> {
            parse(v).map_err(E::custom)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Amount, E> {
            (v as Amount)
                .checked_mul(COIN)
                .ok_or_else(|| E::custom(AmountParseError::Overflow))
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Amount, E> {
            let v = u64::try_from(v).map_err(|_| E::custom("amount must not be negative"))?;
            self.visit_u64(v)
        }

        // Floats cannot carry 18 decimals exactly.
        fn visit_f64<E: de::Error>(self, v: f64) -> Result<Amount, E> {
            Err(E::custom(format_args!(
                "amount {v} must be a decimal string such as \"{v}\", not a float"
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::COIN;
    use crate::error::AmountParseError;

    #[test]
    fn default_params_match_original_deployment() {
        let p = CollectionParams::default();
        assert_eq!(p.max_supply, 2000);
        assert_eq!(p.pool_count, 10);
        assert_eq!(p.tokens_per_pool(), 200);
        assert_eq!(p.start_price, 20 * COIN);
        assert_eq!(p.floor_price, COIN / 100);
    }

    #[test]
    fn validate_rejects_zero_supply() {
        let p = CollectionParams {
            max_supply: 0,
            ..CollectionParams::default()
        };
        assert_eq!(p.validate(), Err(ParamsError::ZeroSupply));
    }

    #[test]
    fn validate_rejects_zero_pools() {
        let p = CollectionParams {
            pool_count: 0,
            ..CollectionParams::default()
        };
        assert_eq!(p.validate(), Err(ParamsError::ZeroPools));
        assert_eq!(p.tokens_per_pool(), 0);
    }

    #[test]
    fn validate_rejects_uneven_pools() {
        let p = CollectionParams {
            max_supply: 2001,
            ..CollectionParams::default()
        };
        assert!(matches!(p.validate(), Err(ParamsError::UnevenPools { .. })));
    }

    #[test]
    fn validate_rejects_floor_above_start() {
        let p = CollectionParams {
            floor_price: 30 * COIN,
            ..CollectionParams::default()
        };
        assert!(matches!(
            p.validate(),
            Err(ParamsError::FloorAboveStart { .. })
        ));
    }

    #[test]
    fn validate_rejects_zero_duration() {
        let p = CollectionParams {
            auction_duration_secs: 0,
            ..CollectionParams::default()
        };
        assert_eq!(p.validate(), Err(ParamsError::ZeroDuration));
    }

    #[test]
    fn flat_auction_is_valid() {
        let p = CollectionParams {
            floor_price: 20 * COIN,
            ..CollectionParams::default()
        };
        assert!(p.validate().is_ok());
    }

    #[test]
    fn holder_hex_roundtrip() {
        let h = HolderId([0xAB; 20]);
        let s = h.to_string();
        assert_eq!(s, format!("0x{}", "ab".repeat(20)));
        assert_eq!(s.parse::<HolderId>().unwrap(), h);
    }

    #[test]
    fn holder_label_is_deterministic() {
        assert_eq!(HolderId::from_label("alice"), HolderId::from_label("alice"));
        assert_ne!(HolderId::from_label("alice"), HolderId::from_label("bob"));
        assert_eq!("alice".parse::<HolderId>().unwrap(), HolderId::from_label("alice"));
    }

    #[test]
    fn holder_rejects_bad_hex() {
        assert_eq!("0xzz".parse::<HolderId>(), Err(HolderParseError::InvalidHex));
        assert_eq!(
            "0xabcd".parse::<HolderId>(),
            Err(HolderParseError::InvalidLength(2))
        );
        assert_eq!("  ".parse::<HolderId>(), Err(HolderParseError::Empty));
    }

    #[test]
    fn units_parse_whole_and_fraction() {
        assert_eq!(units::parse("1").unwrap(), COIN);
        assert_eq!(units::parse("1.5").unwrap(), COIN + COIN / 2);
        assert_eq!(units::parse(".5").unwrap(), COIN / 2);
        assert_eq!(units::parse("0.000000000000000001").unwrap(), 1);
    }

    #[test]
    fn units_parse_rejects_garbage() {
        assert_eq!(units::parse(""), Err(AmountParseError::Empty));
        assert_eq!(units::parse("."), Err(AmountParseError::Empty));
        assert!(matches!(units::parse("1e5"), Err(AmountParseError::InvalidDigit(_))));
        assert!(matches!(units::parse("-1"), Err(AmountParseError::InvalidDigit(_))));
        assert_eq!(
            units::parse("0.0000000000000000001"),
            Err(AmountParseError::TooPrecise(19))
        );
        assert_eq!(
            units::parse("999999999999999999999999999999"),
            Err(AmountParseError::Overflow)
        );
    }

    #[test]
    fn units_format_trims_zeros() {
        assert_eq!(units::format(0), "0");
        assert_eq!(units::format(COIN + COIN / 2), "1.5");
        assert_eq!(units::format(1), "0.000000000000000001");
    }

    #[test]
    fn params_json_uses_decimal_amounts() {
        let p = CollectionParams::default();
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["start_price"], "20");
        assert_eq!(json["floor_price"], "0.01");
        let back: CollectionParams = serde_json::from_value(json).unwrap();
        assert_eq!(back, p);
    }

    #[test]
    fn params_accept_integer_prices() {
        let json = r#"{"max_supply":10,"pool_count":2,"start_price":5,"floor_price":"0","auction_duration_secs":60}"#;
        let p: CollectionParams = serde_json::from_str(json).unwrap();
        assert_eq!(p.start_price, 5 * COIN);
        assert_eq!(p.floor_price, 0);
    }

    #[test]
    fn params_reject_float_prices() {
        let json = r#"{"max_supply":10,"pool_count":2,"start_price":2.5,"floor_price":"0","auction_duration_secs":60}"#;
        let err = serde_json::from_str::<CollectionParams>(json).unwrap_err();
        assert!(err.to_string().contains("decimal string"), "{err}");

        let json = r#"{"max_supply":10,"pool_count":2,"start_price":"2.5","floor_price":"0","auction_duration_secs":60}"#;
        let p: CollectionParams = serde_json::from_str(json).unwrap();
        assert_eq!(p.start_price, 2 * COIN + COIN / 2);
    }

    #[test]
    fn token_id_display() {
        assert_eq!(TokenId(17).to_string(), "#17");
    }
}
