// 1.0: all the primitives live here. nothing in the ledger works without these types.
// IDs, amounts, prices, ratios, timestamps. each is a newtype so the compiler catches type mixups.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PositionId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AccountId(pub u64);

// synthetic asset symbol. the empty string is the null identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AssetId(pub String);

impl AssetId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn is_null(&self) -> bool {
        self.0.trim().is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TokenId(pub String);

impl TokenId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn is_null(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// which oracle feed prices an asset (e.g. "sETH/USD")
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OracleRef(pub String);

impl OracleRef {
    pub fn new(feed: impl Into<String>) -> Self {
        Self(feed.into())
    }
}

impl fmt::Display for OracleRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// 1.1: token quantity in the token's smallest unit. never negative.
// every arithmetic op is checked: None means the result left the u128 range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Amount(u128);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    pub const fn new(units: u128) -> Self {
        Self(units)
    }

    pub fn zero() -> Self {
        Self::ZERO
    }

    pub fn value(&self) -> u128 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[must_use]
    pub fn checked_add(self, other: Amount) -> Option<Amount> {
        self.0.checked_add(other.0).map(Amount)
    }

    #[must_use]
    pub fn checked_sub(self, other: Amount) -> Option<Amount> {
        self.0.checked_sub(other.0).map(Amount)
    }

    #[must_use]
    pub fn checked_mul(self, factor: u128) -> Option<Amount> {
        self.0.checked_mul(factor).map(Amount)
    }

    // floor division
    #[must_use]
    pub fn checked_div(self, divisor: u128) -> Option<Amount> {
        self.0.checked_div(divisor).map(Amount)
    }
}

impl From<u128> for Amount {
    fn from(units: u128) -> Self {
        Self(units)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// 1.2: raw oracle price. signed because feeds can report garbage; the ledger
// only ever divides by a strictly positive price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Price(i128);

impl Price {
    pub const fn new(raw: i128) -> Self {
        Self(raw)
    }

    pub fn value(&self) -> i128 {
        self.0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[must_use]
    pub fn positive(&self) -> Option<u128> {
        if self.0 > 0 {
            Some(self.0 as u128)
        } else {
            None
        }
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// 1.3: collateralization ratio as an integer percentage. 150 = 150%.
// MAX is the unbounded ratio of a position with no outstanding debt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CollateralRatio(u128);

impl CollateralRatio {
    pub const MAX: CollateralRatio = CollateralRatio(u128::MAX);

    pub const fn new(percent: u128) -> Self {
        Self(percent)
    }

    pub fn value(&self) -> u128 {
        self.0
    }

    pub fn is_unbounded(&self) -> bool {
        *self == Self::MAX
    }

    pub fn meets(&self, minimum: CollateralRatio) -> bool {
        self.0 >= minimum.0
    }

    // 150 -> 1.5. None when the ratio is unbounded or too large for a Decimal.
    pub fn as_fraction(&self) -> Option<Decimal> {
        if self.is_unbounded() {
            return None;
        }
        let raw = i128::try_from(self.0).ok()?;
        Decimal::try_from_i128_with_scale(raw, 2).ok()
    }
}

impl fmt::Display for CollateralRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unbounded() {
            write!(f, "inf")
        } else {
            write!(f, "{}%", self.0)
        }
    }
}

// 1.4: millisecond timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(pub i64);

impl Timestamp {
    pub fn now() -> Self {
        Self(chrono::Utc::now().timestamp_millis())
    }

    pub fn from_millis(ms: i64) -> Self {
        Self(ms)
    }

    pub fn from_secs(secs: i64) -> Self {
        Self(secs.saturating_mul(1000))
    }

    pub fn as_millis(&self) -> i64 {
        self.0
    }

    // how far `self` lags behind `now`. zero if `self` is in the future.
    pub fn age_at(&self, now: Timestamp) -> i64 {
        now.0.saturating_sub(self.0).max(0)
    }
}
