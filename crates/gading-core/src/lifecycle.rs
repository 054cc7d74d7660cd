//! # Transaction Lifecycle
//!
//! The status graph and the stock operation each edge requires.
//!
//! ```text
//!             reserve              commit
//!   ┌───────┐ ──────► ┌─────────┐ ──────► ┌───────────┐
//!   │ draft │         │ pending │         │ completed │ (terminal)
//!   └───┬───┘         └────┬────┘         └───────────┘
//!       │ (no effect)      │ release
//!       ▼                  ▼
//!   ┌─────────────────────────┐
//!   │        cancelled        │ (terminal)
//!   └─────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};

use crate::types::TransactionStatus;

/// Stock ledger operation paired with a status transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockEffect {
    None,
    Reserve,
    Release,
    Commit,
}

impl StockEffect {
    /// The stock operation for `from → to`, or `None` for an illegal edge.
    ///
    /// ```rust
    /// use gading_core::{StockEffect, TransactionStatus as S};
    ///
    /// assert_eq!(StockEffect::for_transition(S::Draft, S::Pending), Some(StockEffect::Reserve));
    /// assert_eq!(StockEffect::for_transition(S::Completed, S::Cancelled), None);
    /// ```
    pub fn for_transition(from: TransactionStatus, to: TransactionStatus) -> Option<StockEffect> {
        use TransactionStatus::*;
        match (from, to) {
            (Draft, Pending) => Some(StockEffect::Reserve),
            (Draft, Cancelled) => Some(StockEffect::None),
            (Pending, Completed) => Some(StockEffect::Commit),
            (Pending, Cancelled) => Some(StockEffect::Release),
            _ => None,
        }
    }

    /// Stock operations a freshly created transaction needs to reach
    /// `initial`. Reservation always runs before commit.
    pub fn on_create(initial: TransactionStatus) -> &'static [StockEffect] {
        match initial {
            TransactionStatus::Pending => &[StockEffect::Reserve],
            TransactionStatus::Completed => &[StockEffect::Reserve, StockEffect::Commit],
            TransactionStatus::Draft | TransactionStatus::Cancelled => &[],
        }
    }
}

impl TransactionStatus {
    /// Whether `self → to` is an edge of the status graph.
    #[inline]
    pub fn can_transition_to(&self, to: TransactionStatus) -> bool {
        StockEffect::for_transition(*self, to).is_some()
    }

    /// Statuses a transaction may be created in.
    #[inline]
    pub fn is_valid_initial(&self) -> bool {
        !matches!(self, TransactionStatus::Cancelled)
    }
}
