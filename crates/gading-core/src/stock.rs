//! # Stock Math
//!
//! Converts line items into base-unit requirements and applies
//! reserve / commit / release to one stock-tracked product.
//!
//! ## From line items to locked rows
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  items                         StockPlan (BTreeMap, ascending id)       │
//! │  ───────────────────────       ──────────────────────────────────       │
//! │  TEH-1   qty 3 ─┐                                                       │
//! │                 ├─► base TEH  3×1 + 2×12 = 27                           │
//! │  TEH-12  qty 2 ─┘    (pack 12)                                          │
//! │  KOPI    qty 1 ───► base KOPI 1                                         │
//! │                                                                         │
//! │  Rows are locked in plan order, so two transactions touching the same  │
//! │  products always acquire their locks in the same sequence.             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every [`StockLevel`] satisfies `0 <= reserved <= on_hand`. The
//! operations return a new level or an error and never produce a level
//! outside that range.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::StockError;

// =============================================================================
// Stock Rule
// =============================================================================

/// Where a sellable product's stock lives and how many base units one unit
/// consumes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockRule {
    pub product_id: String,
    /// The product itself, or its base product.
    pub stock_product_id: String,
    /// Stored as a decimal; only positive whole numbers are usable.
    pub pack_size: Decimal,
}

impl StockRule {
    /// The pack size as a whole number of base units.
    pub fn whole_pack_size(&self) -> Result<i64, StockError> {
        whole_pack_size(&self.product_id, self.pack_size)
    }

    /// Base units consumed by `qty` sellable units.
    pub fn base_units(&self, qty: i64) -> Result<i64, StockError> {
        let pack = self.whole_pack_size()?;
        qty.checked_mul(pack).ok_or_else(|| StockError::Overflow {
            product_id: self.product_id.clone(),
        })
    }
}

fn whole_pack_size(product_id: &str, pack_size: Decimal) -> Result<i64, StockError> {
    let invalid = || StockError::InvalidPackSize {
        product_id: product_id.to_string(),
        pack_size: pack_size.normalize().to_string(),
    };
    if pack_size <= Decimal::ZERO || !pack_size.fract().is_zero() {
        return Err(invalid());
    }
    pack_size.to_i64().ok_or_else(invalid)
}

// =============================================================================
// Stock Line / Plan
// =============================================================================

/// One line item joined with its stock rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLine {
    pub product_id: String,
    pub stock_product_id: String,
    pub qty: i64,
    pub pack_size: Decimal,
}

impl StockLine {
    pub fn new(rule: &StockRule, qty: i64) -> Self {
        StockLine {
            product_id: rule.product_id.clone(),
            stock_product_id: rule.stock_product_id.clone(),
            qty,
            pack_size: rule.pack_size,
        }
    }
}

/// Base units required per stock-tracked product, in lock order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StockPlan {
    requirements: BTreeMap<String, i64>,
}

impl StockPlan {
    /// Aggregates lines by stock-tracked product.
    ///
    /// Fails with `InvalidPackSize` before any quantity math when a line's
    /// pack size is not a positive whole number, and with
    /// `EmptyTransaction` when there are no lines.
    pub fn from_lines(lines: &[StockLine]) -> Result<Self, StockError> {
        if lines.is_empty() {
            return Err(StockError::EmptyTransaction);
        }

        let mut requirements: BTreeMap<String, i64> = BTreeMap::new();
        for line in lines {
            let pack = whole_pack_size(&line.product_id, line.pack_size)?;
            let overflow = || StockError::Overflow {
                product_id: line.stock_product_id.clone(),
            };
            let units = line.qty.checked_mul(pack).ok_or_else(overflow)?;
            let entry = requirements.entry(line.stock_product_id.clone()).or_insert(0);
            *entry = entry.checked_add(units).ok_or_else(overflow)?;
        }

        Ok(StockPlan { requirements })
    }

    /// `(stock_product_id, required_base_units)` in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> {
        self.requirements.iter().map(|(id, qty)| (id.as_str(), *qty))
    }

    pub fn required(&self, stock_product_id: &str) -> Option<i64> {
        self.requirements.get(stock_product_id).copied()
    }

    pub fn len(&self) -> usize {
        self.requirements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requirements.is_empty()
    }
}

// =============================================================================
// Stock Level
// =============================================================================

/// Counters of one stock-tracked product, read under its row lock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLevel {
    pub product_id: String,
    pub on_hand: i64,
    pub reserved: i64,
}

impl StockLevel {
    /// Rejects counters outside `0 <= reserved <= on_hand`.
    pub fn new(product_id: impl Into<String>, on_hand: i64, reserved: i64) -> Result<Self, StockError> {
        let product_id = product_id.into();
        if on_hand < 0 || reserved < 0 || reserved > on_hand {
            return Err(StockError::InvalidLevel {
                product_id,
                on_hand,
                reserved,
            });
        }
        Ok(StockLevel {
            product_id,
            on_hand,
            reserved,
        })
    }

    /// Unreserved units.
    #[inline]
    pub fn available(&self) -> i64 {
        self.on_hand - self.reserved
    }

    /// Holds `required` more units.
    ///
    /// ```rust
    /// use gading_core::StockLevel;
    ///
    /// let level = StockLevel::new("p", 10, 0).unwrap();
    /// let level = level.reserve(3).unwrap();
    /// assert_eq!((level.on_hand, level.reserved), (10, 3));
    /// assert!(level.reserve(8).is_err());
    /// ```
    pub fn reserve(&self, required: i64) -> Result<Self, StockError> {
        if self.available() < required {
            return Err(StockError::InsufficientStock {
                product_id: self.product_id.clone(),
                available: self.available(),
                required,
            });
        }
        Ok(self.with(self.on_hand, self.reserved + required))
    }

    /// Turns `required` reserved units into a permanent deduction.
    pub fn commit(&self, required: i64) -> Result<Self, StockError> {
        if self.reserved < required {
            return Err(StockError::ReservationShort {
                product_id: self.product_id.clone(),
                reserved: self.reserved,
                required,
            });
        }
        if self.on_hand < required {
            return Err(StockError::OnHandShort {
                product_id: self.product_id.clone(),
                on_hand: self.on_hand,
                required,
            });
        }
        Ok(self.with(self.on_hand - required, self.reserved - required))
    }

    /// Returns `required` reserved units to available stock.
    pub fn release(&self, required: i64) -> Result<Self, StockError> {
        if self.reserved < required {
            return Err(StockError::ReservationShort {
                product_id: self.product_id.clone(),
                reserved: self.reserved,
                required,
            });
        }
        Ok(self.with(self.on_hand, self.reserved - required))
    }

    fn with(&self, on_hand: i64, reserved: i64) -> Self {
        StockLevel {
            product_id: self.product_id.clone(),
            on_hand,
            reserved,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn line(product: &str, stock: &str, qty: i64, pack: i64) -> StockLine {
        StockLine {
            product_id: product.into(),
            stock_product_id: stock.into(),
            qty,
            pack_size: Decimal::from(pack),
        }
    }

    #[test]
    fn test_plan_aggregates_variants_of_same_base() {
        let plan = StockPlan::from_lines(&[
            line("teh-12", "teh", 2, 12),
            line("kopi", "kopi", 1, 1),
            line("teh-1", "teh", 3, 1),
        ])
        .unwrap();

        assert_eq!(plan.len(), 2);
        assert_eq!(plan.required("teh"), Some(27));
        assert_eq!(plan.required("kopi"), Some(1));
        let order: Vec<&str> = plan.iter().map(|(id, _)| id).collect();
        assert_eq!(order, vec!["kopi", "teh"]);
    }

    #[test]
    fn test_plan_rejects_bad_pack_sizes() {
        let mut fractional = line("half", "base", 1, 1);
        fractional.pack_size = Decimal::new(15, 1); // 1.5
        assert!(matches!(
            StockPlan::from_lines(&[fractional]),
            Err(StockError::InvalidPackSize { .. })
        ));
        assert!(matches!(
            StockPlan::from_lines(&[line("zero", "base", 1, 0)]),
            Err(StockError::InvalidPackSize { .. })
        ));
        assert!(matches!(
            StockPlan::from_lines(&[line("neg", "base", 1, -2)]),
            Err(StockError::InvalidPackSize { .. })
        ));
    }

    #[test]
    fn test_whole_decimal_pack_size_is_accepted() {
        let mut l = line("box", "base", 2, 1);
        l.pack_size = Decimal::new(600, 2); // 6.00
        assert_eq!(StockPlan::from_lines(&[l]).unwrap().required("base"), Some(12));
    }

    #[test]
    fn test_plan_requires_lines() {
        assert_eq!(StockPlan::from_lines(&[]), Err(StockError::EmptyTransaction));
    }

    #[test]
    fn test_plan_overflow() {
        assert!(matches!(
            StockPlan::from_lines(&[line("p", "p", i64::MAX, 2)]),
            Err(StockError::Overflow { .. })
        ));
    }

    #[test]
    fn test_level_rejects_broken_invariant() {
        assert!(StockLevel::new("p", 5, 6).is_err());
        assert!(StockLevel::new("p", -1, 0).is_err());
        assert!(StockLevel::new("p", 5, -1).is_err());
        assert!(StockLevel::new("p", 5, 5).is_ok());
    }

    #[test]
    fn test_reserve_commit_release() {
        let level = StockLevel::new("p", 10, 0).unwrap();

        let reserved = level.reserve(3).unwrap();
        assert_eq!((reserved.on_hand, reserved.reserved), (10, 3));

        let committed = reserved.commit(3).unwrap();
        assert_eq!((committed.on_hand, committed.reserved), (7, 0));

        let released = reserved.release(3).unwrap();
        assert_eq!((released.on_hand, released.reserved), (10, 0));
    }

    #[test]
    fn test_reserve_insufficient_names_counts() {
        let level = StockLevel::new("p", 10, 4).unwrap();
        assert_eq!(
            level.reserve(7),
            Err(StockError::InsufficientStock {
                product_id: "p".into(),
                available: 6,
                required: 7,
            })
        );
    }

    #[test]
    fn test_commit_and_release_need_reservation() {
        let level = StockLevel::new("p", 10, 2).unwrap();
        assert!(matches!(level.commit(3), Err(StockError::ReservationShort { .. })));
        assert!(matches!(level.release(3), Err(StockError::ReservationShort { .. })));
    }
}
