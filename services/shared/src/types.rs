/// Type-safe wrappers for domain primitives
///
/// These types prevent common money-handling errors by enforcing validation
/// at construction time and providing checked, truncating arithmetic. No
/// balance or payout in the system is ever represented as a float.
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::constants::*;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum AmountError {
    #[error("Amount arithmetic overflow")]
    Overflow,

    #[error("Amount must be positive: {0}")]
    NotPositive(i64),

    #[error("Unsupported currency code: {0}")]
    UnknownCurrency(String),
}

/// Closed set of supported currencies.
///
/// `Inr` is the fiat side of the wallet; `Hc` ("Happy Coin") is the platform
/// token every casino wager is denominated in. The source system passed
/// currencies around as free strings — this enum is validated at every
/// boundary instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Currency {
    #[serde(rename = "INR")]
    Inr,
    #[serde(rename = "HC")]
    Hc,
}

impl Currency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::Inr => "INR",
            Currency::Hc => "HC",
        }
    }

    pub fn parse(s: &str) -> Result<Self, AmountError> {
        match s {
            "INR" => Ok(Currency::Inr),
            "HC" => Ok(Currency::Hc),
            other => Err(AmountError::UnknownCurrency(other.to_string())),
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Fixed-point monetary amount in minor units (2 decimal places).
///
/// Signed: ledger deltas are negative for debits. All multiplication by a
/// payout multiplier truncates toward zero at minor-unit precision, which is
/// the documented rounding rule for every payout and conversion.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct Amount(i64);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    /// Construct from minor units (e.g. paise / HC-cents).
    pub const fn from_minor(minor: i64) -> Self {
        Self(minor)
    }

    /// Construct from whole currency units.
    pub fn from_whole(whole: i64) -> Result<Self, AmountError> {
        whole
            .checked_mul(MINOR_UNITS_PER_WHOLE)
            .map(Self)
            .ok_or(AmountError::Overflow)
    }

    pub const fn minor(&self) -> i64 {
        self.0
    }

    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    pub fn abs(&self) -> Self {
        Self(self.0.abs())
    }

    pub fn checked_add(&self, other: Amount) -> Result<Self, AmountError> {
        self.0
            .checked_add(other.0)
            .map(Self)
            .ok_or(AmountError::Overflow)
    }

    pub fn checked_sub(&self, other: Amount) -> Result<Self, AmountError> {
        self.0
            .checked_sub(other.0)
            .map(Self)
            .ok_or(AmountError::Overflow)
    }

    pub fn checked_neg(&self) -> Result<Self, AmountError> {
        self.0.checked_neg().map(Self).ok_or(AmountError::Overflow)
    }

    /// Multiply by a basis-point multiplier, truncating toward zero at
    /// minor-unit precision.
    pub fn mul_bp(&self, bp: u64) -> Result<Self, AmountError> {
        let product = (self.0 as i128)
            .checked_mul(bp as i128)
            .ok_or(AmountError::Overflow)?;
        let truncated = product / BASIS_POINTS_PER_UNIT as i128;
        i64::try_from(truncated)
            .map(Self)
            .map_err(|_| AmountError::Overflow)
    }

    /// Multiply by an integer conversion rate (HC -> INR direction).
    pub fn mul_rate(&self, rate: i64) -> Result<Self, AmountError> {
        self.0
            .checked_mul(rate)
            .map(Self)
            .ok_or(AmountError::Overflow)
    }

    /// Divide by an integer conversion rate, truncating toward zero
    /// (INR -> HC direction).
    pub fn div_rate(&self, rate: i64) -> Result<Self, AmountError> {
        if rate == 0 {
            return Err(AmountError::Overflow);
        }
        Ok(Self(self.0 / rate))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(
            f,
            "{}{}.{:02}",
            sign,
            abs / MINOR_UNITS_PER_WHOLE as u64,
            abs % MINOR_UNITS_PER_WHOLE as u64
        )
    }
}

/// Payout multiplier in basis points (1.0x == 10_000 bp).
///
/// Integer representation keeps payout math exact: the dice multiplier for
/// target 7 over is 85_500 bp, never 8.549999....
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct Multiplier(u64);

impl Multiplier {
    pub const ZERO: Multiplier = Multiplier(0);
    pub const ONE: Multiplier = Multiplier(BASIS_POINTS_PER_UNIT);

    pub const fn from_bp(bp: u64) -> Self {
        Self(bp)
    }

    /// From a centi-multiplier (2 decimal places), e.g. crash points.
    pub const fn from_centi(centi: u64) -> Self {
        Self(centi * 100)
    }

    pub const fn as_bp(&self) -> u64 {
        self.0
    }

    pub fn as_f64(&self) -> f64 {
        self.0 as f64 / BASIS_POINTS_PER_UNIT as f64
    }

    /// Parse a 2-decimal multiplier supplied by a caller (e.g. a crash
    /// cash-out target of 2.37). Rounds to the nearest centi-unit.
    pub fn from_f64_2dp(value: f64) -> Option<Self> {
        if !value.is_finite() || value < 0.0 || value > 1_000_000.0 {
            return None;
        }
        Some(Self::from_centi((value * 100.0).round() as u64))
    }
}

impl fmt::Display for Multiplier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{:02}x",
            self.0 / BASIS_POINTS_PER_UNIT,
            (self.0 % BASIS_POINTS_PER_UNIT) / 100
        )
    }
}
