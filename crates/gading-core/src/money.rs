//! # Money Module
//!
//! Provides the `Money` type for handling monetary values exactly.
//!
//! ## Why Decimal Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  Summing payments as f64 and formatting afterwards:                     │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ drift on every aggregation      │
//! │                                                                         │
//! │  OUR SOLUTION: rust_decimal with a fixed scale of 2                     │
//! │    "5000.00" + "5000.00" = "10000.00" exactly                           │
//! │    Only +, - and × whole quantity are ever needed, so no rounding       │
//! │    step exists anywhere in the engine.                                  │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use gading_core::money::Money;
//!
//! let price: Money = "5000".parse().unwrap();
//! assert_eq!(price.to_string(), "5000.00");
//!
//! // More than two decimals is rejected, never rounded
//! assert!("10.005".parse::<Money>().is_err());
//! ```

use rust_decimal::Decimal;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub};
use std::str::FromStr;
use ts_rs::TS;

use crate::error::MoneyError;

/// Number of fractional digits carried by every amount.
pub const SCALE: u32 = 2;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary amount with exactly two decimal places.
///
/// ## Design Decisions
/// - **Decimal, not cents**: prices arrive as decimal text and are stored as
///   `NUMERIC(18,2)`, so the value keeps the same shape end to end
/// - **Scale fixed at 2**: inputs with more precision are rejected
/// - **String on the wire**: serializes as `"10000.00"`, never a JSON float
///
/// ## Where Money is Used
/// ```text
/// ProductPrice.amount ──► TransactionItem.unit_amount ──► line_total
///                                                            │
///                              Σ line_total ──► Transaction.total_amount
///                                                            │
///   Σ posted Payment.amount ──► paid_amount ──► payment_status, balance_due
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, TS)]
#[ts(export)]
pub struct Money(#[ts(type = "string")] Decimal);

impl Money {
    /// Wraps a decimal, rejecting values with more than two decimals.
    ///
    /// ## Example
    /// ```rust
    /// use gading_core::money::Money;
    /// use rust_decimal::Decimal;
    ///
    /// let m = Money::new(Decimal::new(1050, 1)).unwrap(); // 105.0
    /// assert_eq!(m.to_string(), "105.00");
    /// assert!(Money::new(Decimal::new(1, 3)).is_err());  // 0.001
    /// ```
    pub fn new(value: Decimal) -> Result<Self, MoneyError> {
        if value.normalize().scale() > SCALE {
            return Err(MoneyError::TooPrecise(value.to_string()));
        }
        let mut value = value;
        value.rescale(SCALE);
        if value.scale() != SCALE {
            return Err(MoneyError::Parse(value.to_string()));
        }
        if value.is_zero() {
            value.set_sign_positive(true);
        }
        Ok(Money(value))
    }

    /// Creates a value from minor units (hundredths).
    ///
    /// ```rust
    /// use gading_core::money::Money;
    ///
    /// assert_eq!(Money::from_minor(500000).to_string(), "5000.00");
    /// ```
    #[inline]
    pub fn from_minor(minor: i64) -> Self {
        Money(Decimal::new(minor, SCALE))
    }

    /// Creates a value from whole major units.
    #[inline]
    pub fn from_major(major: i64) -> Self {
        Money::from_minor(major.saturating_mul(100))
    }

    /// Largest storable amount, see [`crate::MAX_AMOUNT_MINOR`].
    #[inline]
    pub fn max_amount() -> Self {
        Money::from_minor(crate::MAX_AMOUNT_MINOR)
    }

    /// Returns zero money value.
    #[inline]
    pub fn zero() -> Self {
        Money(Decimal::new(0, SCALE))
    }

    /// The underlying decimal.
    #[inline]
    pub fn amount(&self) -> Decimal {
        self.0
    }

    /// Checks if the value is zero.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// Returns `self` if it is zero or more.
    pub fn non_negative(self) -> Result<Self, MoneyError> {
        if self.is_negative() {
            return Err(MoneyError::Negative(self.to_string()));
        }
        Ok(self)
    }

    /// Multiplies by a whole quantity (line total = unit × qty).
    ///
    /// Returns `None` on overflow.
    ///
    /// ```rust
    /// use gading_core::money::Money;
    ///
    /// let unit = Money::from_minor(500000);
    /// assert_eq!(unit.checked_mul_qty(3).unwrap().to_string(), "15000.00");
    /// ```
    pub fn checked_mul_qty(&self, qty: i64) -> Option<Self> {
        self.0.checked_mul(Decimal::from(qty)).and_then(|d| Money::new(d).ok())
    }

    /// Addition that reports overflow instead of panicking.
    pub fn checked_add(&self, other: Money) -> Option<Self> {
        self.0.checked_add(other.0).map(Money)
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

/// Always two decimals: `"10000.00"`, `"-5.50"`.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl FromStr for Money {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(MoneyError::Parse(s.to_string()));
        }
        let value = Decimal::from_str(trimmed).map_err(|_| MoneyError::Parse(s.to_string()))?;
        Money::new(value)
    }
}

impl TryFrom<Decimal> for Money {
    type Error = MoneyError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Money::new(value)
    }
}

// =============================================================================
// Arithmetic Operations
// =============================================================================

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

// =============================================================================
// Serde (string encoded)
// =============================================================================

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct MoneyVisitor;

        impl<'de> Visitor<'de> for MoneyVisitor {
            type Value = Money;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a decimal string with at most 2 decimal places")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Money, E> {
                v.parse().map_err(E::custom)
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Money, E> {
                Money::new(Decimal::from(v)).map_err(E::custom)
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Money, E> {
                Money::new(Decimal::from(v)).map_err(E::custom)
            }
        }

        deserializer.deserialize_any(MoneyVisitor)
    }
}

// =============================================================================
// sqlx (NUMERIC)
// =============================================================================

#[cfg(feature = "sqlx")]
mod sql {
    use super::Money;
    use rust_decimal::Decimal;
    use sqlx::encode::IsNull;
    use sqlx::error::BoxDynError;
    use sqlx::postgres::{PgArgumentBuffer, PgTypeInfo, PgValueRef, Postgres};

    impl sqlx::Type<Postgres> for Money {
        fn type_info() -> PgTypeInfo {
            <Decimal as sqlx::Type<Postgres>>::type_info()
        }

        fn compatible(ty: &PgTypeInfo) -> bool {
            <Decimal as sqlx::Type<Postgres>>::compatible(ty)
        }
    }

    impl sqlx::Encode<'_, Postgres> for Money {
        fn encode_by_ref(&self, buf: &mut PgArgumentBuffer) -> Result<IsNull, BoxDynError> {
            <Decimal as sqlx::Encode<'_, Postgres>>::encode_by_ref(&self.0, buf)
        }
    }

    impl<'r> sqlx::Decode<'r, Postgres> for Money {
        fn decode(value: PgValueRef<'r>) -> Result<Self, BoxDynError> {
            let raw = <Decimal as sqlx::Decode<'r, Postgres>>::decode(value)?;
            Ok(Money::new(raw)?)
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn m(s: &str) -> Money {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_and_display() {
        assert_eq!(m("5000").to_string(), "5000.00");
        assert_eq!(m("5000.5").to_string(), "5000.50");
        assert_eq!(m(" 12.34 ").to_string(), "12.34");
        assert_eq!(m("-5.5").to_string(), "-5.50");
        assert_eq!(m("-0").to_string(), "0.00");
    }

    #[test]
    fn test_parse_rejects_garbage_and_precision() {
        assert!(matches!("".parse::<Money>(), Err(MoneyError::Parse(_))));
        assert!(matches!("abc".parse::<Money>(), Err(MoneyError::Parse(_))));
        assert!(matches!("1.005".parse::<Money>(), Err(MoneyError::TooPrecise(_))));
        // trailing zeros beyond the scale are harmless
        assert_eq!(m("1.500").to_string(), "1.50");
    }

    #[test]
    fn test_arithmetic_is_exact() {
        let total: Money = ["0.10", "0.20", "0.30"].iter().map(|s| m(s)).sum();
        assert_eq!(total, m("0.60"));
        assert_eq!(m("10000.00") - m("12500.00"), m("-2500.00"));
        assert_eq!(m("5000.00").checked_mul_qty(2), Some(m("10000.00")));
    }

    #[test]
    fn test_sign_checks() {
        assert!(Money::zero().is_zero());
        assert!(m("0.01").is_positive());
        assert!(m("-0.01").is_negative());
        assert!(m("-1").non_negative().is_err());
        assert!(m("0").non_negative().is_ok());
    }

    #[test]
    fn test_checked_mul_overflow() {
        let huge = Money::from_minor(i64::MAX);
        assert_eq!(huge.checked_mul_qty(i64::MAX), None);
    }

    #[test]
    fn test_serde_as_string() {
        let json = serde_json::to_string(&m("10000")).unwrap();
        assert_eq!(json, "\"10000.00\"");

        let back: Money = serde_json::from_str("\"5000.00\"").unwrap();
        assert_eq!(back, m("5000"));

        let from_int: Money = serde_json::from_str("42").unwrap();
        assert_eq!(from_int.to_string(), "42.00");

        assert!(serde_json::from_str::<Money>("\"1.234\"").is_err());
    }
}
