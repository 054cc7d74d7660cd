//! # Error Types
//!
//! Domain-specific error types for gading-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  gading-core errors (this file)                                        │
//! │  ├── ValidationError  - Input validation failures                      │
//! │  ├── StockError       - Base-unit stock rule violations                │
//! │  └── MoneyError       - Decimal parsing / precision failures           │
//! │                                                                         │
//! │  gading-ledger errors                                                  │
//! │  ├── TransactionError - create / status / fulfill / read               │
//! │  ├── PaymentError     - post / list payments                           │
//! │  └── StoreError       - opaque storage failure                         │
//! │                                                                         │
//! │  gading-db errors                                                      │
//! │  └── DbError          - Classified sqlx failures → StoreError          │
//! │                                                                         │
//! │  Flow: ValidationError/StockError → TransactionError → CLI exit code   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when caller input doesn't meet requirements.
/// Used for early validation before any unit of work is opened.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Amount above the largest storable value.
    #[error("{field} must not exceed {max}")]
    TooLarge { field: String, max: String },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID, invalid decimal).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

impl ValidationError {
    /// Name of the offending field.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::Required { field }
            | ValidationError::TooLong { field, .. }
            | ValidationError::OutOfRange { field, .. }
            | ValidationError::TooLarge { field, .. }
            | ValidationError::MustBePositive { field }
            | ValidationError::InvalidFormat { field, .. }
            | ValidationError::NotAllowed { field, .. } => field,
        }
    }
}

// =============================================================================
// Stock Error
// =============================================================================

/// Violations of the stock rules for one stock-tracked product.
///
/// All counts are in base units of the stock-tracked product.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StockError {
    /// Not enough unreserved stock to place a reservation.
    ///
    /// ## When This Occurs
    /// ```text
    /// reserve(qty: 999)
    ///      │
    ///      ▼
    /// on_hand=10, reserved=0 → available=10
    ///      │
    ///      ▼
    /// InsufficientStock { available: 10, required: 999 }
    /// ```
    #[error("insufficient stock for product {product_id}: available {available}, required {required}")]
    InsufficientStock {
        product_id: String,
        available: i64,
        required: i64,
    },

    /// Commit or release asked for more than is currently reserved.
    #[error("reservation for product {product_id} is short: reserved {reserved}, required {required}")]
    ReservationShort {
        product_id: String,
        reserved: i64,
        required: i64,
    },

    /// Commit asked for more than is physically on hand.
    ///
    /// ## When This Occurs
    /// - An admin lowered on-hand stock between reserve and commit
    #[error("on-hand stock for product {product_id} is short: on hand {on_hand}, required {required}")]
    OnHandShort {
        product_id: String,
        on_hand: i64,
        required: i64,
    },

    /// Pack size is not a positive whole number.
    ///
    /// This is a catalog configuration problem, not an availability problem.
    #[error("invalid pack size for product {product_id}: {pack_size}")]
    InvalidPackSize { product_id: String, pack_size: String },

    /// A stock plan was built from zero lines.
    #[error("transaction has no stock lines")]
    EmptyTransaction,

    /// Counters that would break `0 <= reserved <= on_hand`.
    #[error("invalid stock level for product {product_id}: on hand {on_hand}, reserved {reserved}")]
    InvalidLevel {
        product_id: String,
        on_hand: i64,
        reserved: i64,
    },

    /// Base-unit arithmetic overflowed.
    #[error("stock quantity overflow for product {product_id}")]
    Overflow { product_id: String },
}

impl StockError {
    /// The product the error is about, when there is one.
    pub fn product_id(&self) -> Option<&str> {
        match self {
            StockError::InsufficientStock { product_id, .. }
            | StockError::ReservationShort { product_id, .. }
            | StockError::OnHandShort { product_id, .. }
            | StockError::InvalidPackSize { product_id, .. }
            | StockError::InvalidLevel { product_id, .. }
            | StockError::Overflow { product_id } => Some(product_id),
            StockError::EmptyTransaction => None,
        }
    }
}

// =============================================================================
// Money Error
// =============================================================================

/// Failures turning text or decimals into [`crate::Money`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoneyError {
    /// Input is not a decimal number.
    #[error("invalid amount '{0}'")]
    Parse(String),

    /// Input carries more than two fractional digits.
    #[error("amount '{0}' has more than 2 decimal places")]
    TooPrecise(String),

    /// A negative value where only zero or more is allowed.
    #[error("amount '{0}' must not be negative")]
    Negative(String),
}

// =============================================================================
// Unit Tests
// =============================================================================
