//! Core transaction types.
//!
//! The one rule that matters here: **money is never a float**. [`Amount`] is
//! integer minor units (cents) internally and a fixed-point decimal string
//! (`"30.00"`) on the wire. Floating point in the signed payload would mean
//! the canonical bytes depend on formatting quirks, and a formatting quirk
//! that invalidates signatures is not a bug class we want to own.

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

use crate::config::{AMOUNT_DECIMALS, AMOUNT_SCALE, DEFAULT_CURRENCY};

// ---------------------------------------------------------------------------
// Amount
// ---------------------------------------------------------------------------

/// Errors from parsing a decimal amount string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    #[error("amount is not a valid decimal: {0:?}")]
    Malformed(String),
    #[error("amount has more than {AMOUNT_DECIMALS} decimal places: {0:?}")]
    TooPrecise(String),
    #[error("amount is negative: {0:?}")]
    Negative(String),
    #[error("amount overflows the representable range: {0:?}")]
    Overflow(String),
}

/// A non-negative monetary amount in minor units (cents).
///
/// Arithmetic is checked; wire form is a decimal string with exactly two
/// fractional digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(u64);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    /// Constructs an amount from integer minor units (cents).
    pub const fn from_minor_units(minor: u64) -> Self {
        Amount(minor)
    }

    /// Returns the amount in minor units.
    pub const fn minor_units(&self) -> u64 {
        self.0
    }

    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checked addition; `None` on overflow.
    pub fn checked_add(&self, other: Amount) -> Option<Amount> {
        self.0.checked_add(other.0).map(Amount)
    }

    /// Checked subtraction; `None` if the result would go negative.
    pub fn checked_sub(&self, other: Amount) -> Option<Amount> {
        self.0.checked_sub(other.0).map(Amount)
    }

    /// Checked multiplication by a unitless count (sale quantity).
    pub fn checked_mul(&self, count: u64) -> Option<Amount> {
        self.0.checked_mul(count).map(Amount)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / AMOUNT_SCALE, self.0 % AMOUNT_SCALE)
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.starts_with('-') {
            return Err(AmountError::Negative(s.to_owned()));
        }
        let (whole, frac) = match s.split_once('.') {
            Some((w, f)) => (w, f),
            None => (s, ""),
        };
        if whole.is_empty() && frac.is_empty() {
            return Err(AmountError::Malformed(s.to_owned()));
        }
        // Digits only. `u64::from_str` quietly accepts a leading '+', and a
        // second '.' must read as malformed, not over-precise.
        if !whole.bytes().all(|b| b.is_ascii_digit()) || !frac.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AmountError::Malformed(s.to_owned()));
        }
        if frac.len() > AMOUNT_DECIMALS as usize {
            return Err(AmountError::TooPrecise(s.to_owned()));
        }
        let whole: u64 = if whole.is_empty() {
            0
        } else {
            // All digits, so the only way this fails is exceeding u64.
            whole
                .parse()
                .map_err(|_| AmountError::Overflow(s.to_owned()))?
        };
        let frac_minor: u64 = if frac.is_empty() {
            0
        } else {
            let parsed: u64 = frac
                .parse()
                .map_err(|_| AmountError::Malformed(s.to_owned()))?;
            // "5" means 50 cents, "05" means 5 cents.
            parsed * 10u64.pow(AMOUNT_DECIMALS - frac.len() as u32)
        };
        whole
            .checked_mul(AMOUNT_SCALE)
            .and_then(|m| m.checked_add(frac_minor))
            .map(Amount)
            .ok_or_else(|| AmountError::Overflow(s.to_owned()))
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct AmountVisitor;

        impl<'de> de::Visitor<'de> for AmountVisitor {
            type Value = Amount;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a decimal amount string or a non-negative number")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Amount, E> {
                v.parse().map_err(de::Error::custom)
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Amount, E> {
                v.checked_mul(AMOUNT_SCALE)
                    .map(Amount)
                    .ok_or_else(|| de::Error::custom(AmountError::Overflow(v.to_string())))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Amount, E> {
                if v < 0 {
                    return Err(de::Error::custom(AmountError::Negative(v.to_string())));
                }
                self.visit_u64(v as u64)
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Amount, E> {
                // Tolerated at the boundary for legacy clients that send JSON
                // numbers; rounded to the nearest cent.
                if !v.is_finite() || v < 0.0 {
                    return Err(de::Error::custom(AmountError::Negative(v.to_string())));
                }
                let minor = (v * AMOUNT_SCALE as f64).round();
                if minor > u64::MAX as f64 {
                    return Err(de::Error::custom(AmountError::Overflow(v.to_string())));
                }
                Ok(Amount(minor as u64))
            }
        }

        deserializer.deserialize_any(AmountVisitor)
    }
}

// ---------------------------------------------------------------------------
// Currency
// ---------------------------------------------------------------------------

/// An ISO-like currency code (`"CAD"`, `"USD"`). Stored uppercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Currency(String);

impl Currency {
    pub fn new(code: impl AsRef<str>) -> Self {
        Currency(code.as_ref().trim().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Currency {
    fn default() -> Self {
        Currency(DEFAULT_CURRENCY.to_owned())
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Status & Payment Type
// ---------------------------------------------------------------------------

/// Lifecycle of a ledger transaction record.
///
/// `Failed` exists in the vocabulary for wire compatibility, but the engine
/// verifies before it persists, so a failed transfer never produces a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Failed,
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionStatus::Pending => f.write_str("pending"),
            TransactionStatus::Completed => f.write_str("completed"),
            TransactionStatus::Failed => f.write_str("failed"),
        }
    }
}

/// How a POS sale was paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaymentType {
    Cash,
    Card,
    Mobile,
    WalletTransfer,
    /// Catch-all for payment methods older clients may still send.
    #[serde(other)]
    Other,
}

impl fmt::Display for PaymentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentType::Cash => f.write_str("cash"),
            PaymentType::Card => f.write_str("card"),
            PaymentType::Mobile => f.write_str("mobile"),
            PaymentType::WalletTransfer => f.write_str("wallet-transfer"),
            PaymentType::Other => f.write_str("other"),
        }
    }
}
