//! # Effective Price Selection
//!
//! Picks the single price that applies to a product for a customer
//! category at an instant.
//!
//! ```text
//! candidates ──► valid at `now`? ──► category tier ──┬─► newest valid_from
//!                                    (exact match)   │   then newest created_at
//!                                        │ none      │
//!                                        ▼           │
//!                                    default tier ───┘
//!                                    (category_id = NULL)
//! ```

use chrono::{DateTime, Utc};
use std::cmp::Ordering;

use crate::types::ProductPrice;

/// Returns the effective price among `candidates`, if any.
///
/// Rows for other categories are ignored. With no customer category only the
/// default tier is considered.
pub fn select_effective_price<'a>(
    candidates: &'a [ProductPrice],
    category_id: Option<&str>,
    now: DateTime<Utc>,
) -> Option<&'a ProductPrice> {
    let valid = candidates.iter().filter(|p| p.is_valid_at(now));

    let specific = category_id.and_then(|cat| {
        valid
            .clone()
            .filter(|p| p.category_id.as_deref() == Some(cat))
            .max_by(|a, b| newest_first(a, b))
    });

    specific.or_else(|| {
        valid
            .filter(|p| p.category_id.is_none())
            .max_by(|a, b| newest_first(a, b))
    })
}

fn newest_first(a: &ProductPrice, b: &ProductPrice) -> Ordering {
    a.valid_from
        .cmp(&b.valid_from)
        .then_with(|| a.created_at.cmp(&b.created_at))
}
