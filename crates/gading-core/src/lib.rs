//! # gading-core: Pure Domain Rules for the Gading Transaction Engine
//!
//! Everything in this crate is deterministic and free of I/O. The storage
//! and orchestration crates build on top of it.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Gading Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    gading CLI / callers                         │   │
//! │  │    create ──► status ──► fulfill ──► pay ──► view               │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              gading-ledger (lifecycle engine)                   │   │
//! │  │   TransactionService, PaymentService, Stock Ledger, Pricing     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ gading-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌──────────┐ │   │
//! │  │   │  money  │ │lifecycle│ │  stock  │ │ pricing │ │validation│ │   │
//! │  │   │ Decimal │ │  graph  │ │  plans  │ │ windows │ │  rules   │ │   │
//! │  │   └─────────┘ └─────────┘ └─────────┘ └─────────┘ └──────────┘ │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO CLOCK • PURE FUNCTIONS              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Exact two-decimal `Money` backed by `rust_decimal`
//! - [`types`] - Transactions, items, payments, views and inputs
//! - [`lifecycle`] - The transaction status graph and its stock effects
//! - [`stock`] - Base-unit requirements and reserve/commit/release math
//! - [`pricing`] - Effective price selection
//! - [`validation`] - Input validation
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use gading_core::money::Money;
//!
//! let unit: Money = "5000.00".parse().unwrap();
//! let line = unit.checked_mul_qty(2).unwrap();
//! assert_eq!(line.to_string(), "10000.00");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod lifecycle;
pub mod money;
pub mod pricing;
pub mod stock;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{MoneyError, StockError, ValidationError};
pub use lifecycle::StockEffect;
pub use money::Money;
pub use stock::{StockLevel, StockLine, StockPlan, StockRule};
pub use types::*;

/// Re-exported so dependents share one decimal type.
pub use rust_decimal::Decimal;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum line items allowed in a single transaction.
pub const MAX_TRANSACTION_ITEMS: usize = 100;

/// Maximum quantity of a single line item, in sellable units.
///
/// Keeps `qty * pack_size` and `unit_amount * qty` far away from overflow.
pub const MAX_ITEM_QUANTITY: i64 = 1_000_000;

/// Largest money amount, in minor units: 9_999_999_999_999_999.99.
///
/// Matches the `NUMERIC(18,2)` money columns. Payment amounts, line totals,
/// transaction totals and paid sums above it are rejected as input errors.
pub const MAX_AMOUNT_MINOR: i64 = 999_999_999_999_999_999;

/// Maximum length of free-text notes on transactions and payments.
pub const MAX_NOTES_LEN: usize = 1000;

/// Page size used when a list request asks for none or too many rows.
pub const DEFAULT_PAGE_SIZE: i64 = 20;

/// Largest page a list request may ask for.
pub const MAX_PAGE_SIZE: i64 = 100;
