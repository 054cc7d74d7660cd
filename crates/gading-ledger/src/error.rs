//! # Ledger Errors
//!
//! One closed error enum per operation family, so callers match on variants
//! instead of comparing messages.
//!
//! ```text
//! ┌────────────────────────┬──────────────────────────────┬──────────────┐
//! │ Variant                │ Meaning                      │ Kind         │
//! ├────────────────────────┼──────────────────────────────┼──────────────┤
//! │ InvalidInput           │ malformed / missing field    │ InvalidInput │
//! │ Customer/Product/      │ referenced row absent        │ NotFound     │
//! │   PriceMissing         │                              │              │
//! │ InvalidStatus          │ unknown status text          │ InvalidInput │
//! │ InvalidTransition      │ edge not in status graph     │ StateConflict│
//! │ AlreadyFulfilled /     │ fulfill on terminal tx       │ StateConflict│
//! │   TransactionCanceled  │                              │              │
//! │ InsufficientStock      │ available < required         │ Insufficient │
//! │ MultiCurrency          │ mixed line currencies        │ InvalidInput │
//! │ InvalidPackSize        │ catalog misconfiguration     │ Configuration│
//! │ ReservationInconsistent│ reserved rows out of step    │ Configuration│
//! │ Store                  │ opaque storage failure       │ Internal     │
//! └────────────────────────┴──────────────────────────────┴──────────────┘
//! ```

use gading_core::{StockError, TransactionStatus, ValidationError};
use serde::Serialize;
use thiserror::Error;

// =============================================================================
// Error Kind
// =============================================================================

/// Coarse classification shared by every ledger error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Malformed or missing request fields.
    InvalidInput,
    /// A referenced customer, product, price or transaction does not exist.
    NotFound,
    /// The transaction's status does not allow the operation.
    StateConflict,
    /// Not enough stock.
    InsufficientStock,
    /// Catalog or stock data is inconsistent; server-side problem.
    Configuration,
    /// Storage failure.
    Internal,
}

impl ErrorKind {
    /// Whether the caller can fix the request and try again.
    pub fn is_caller_error(&self) -> bool {
        !matches!(self, ErrorKind::Configuration | ErrorKind::Internal)
    }
}

// =============================================================================
// Store Error
// =============================================================================

/// Storage failure surfaced by a store implementation.
///
/// By the time one of these reaches a service, the unit of work has been
/// rolled back.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Lock timeout, deadlock or serialization failure.
    #[error("storage conflict: {0}")]
    Conflict(String),

    /// Store unreachable.
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// Anything else.
    #[error("storage failure: {0}")]
    Internal(String),
}

/// Convenience type alias for store results.
pub type StoreResult<T> = Result<T, StoreError>;

// =============================================================================
// Transaction Error
// =============================================================================

/// Errors from creating, transitioning, fulfilling and reading transactions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransactionError {
    #[error("invalid input: {0}")]
    InvalidInput(#[from] ValidationError),

    #[error("customer not found: {0}")]
    CustomerMissing(String),

    #[error("product not found: {0}")]
    ProductMissing(String),

    /// No price row is valid now for the product in either tier.
    #[error("product price not found: {product_id}")]
    PriceMissing { product_id: String },

    #[error("invalid status: {0}")]
    InvalidStatus(String),

    #[error("invalid status transition: {from} -> {to}")]
    InvalidTransition {
        from: TransactionStatus,
        to: TransactionStatus,
    },

    /// ## When This Occurs
    /// - reserve on create (`pending` / `completed`) or on `draft → pending`
    /// - counts are base units of the stock-tracked product
    #[error("insufficient stock for product {product_id}: available {available}, required {required}")]
    InsufficientStock {
        product_id: String,
        available: i64,
        required: i64,
    },

    #[error("invalid pack size for product {product_id}: {pack_size}")]
    InvalidPackSize { product_id: String, pack_size: String },

    #[error("transaction already fulfilled: {0}")]
    AlreadyFulfilled(String),

    #[error("transaction cancelled: {0}")]
    TransactionCanceled(String),

    #[error("transaction not found: {0}")]
    TransactionMissing(String),

    /// Line prices resolved to different currencies.
    #[error("multi-currency not supported: expected {expected}, found {found}")]
    MultiCurrency { expected: String, found: String },

    /// Commit or release found fewer reserved units than the transaction needs.
    ///
    /// Only reachable when stock rows were edited out of band.
    #[error("stock for product {product_id} is inconsistent with the reservation: {reason}")]
    ReservationInconsistent { product_id: String, reason: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl TransactionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TransactionError::InvalidInput(_)
            | TransactionError::InvalidStatus(_)
            | TransactionError::MultiCurrency { .. } => ErrorKind::InvalidInput,
            TransactionError::CustomerMissing(_)
            | TransactionError::ProductMissing(_)
            | TransactionError::PriceMissing { .. }
            | TransactionError::TransactionMissing(_) => ErrorKind::NotFound,
            TransactionError::InvalidTransition { .. }
            | TransactionError::AlreadyFulfilled(_)
            | TransactionError::TransactionCanceled(_) => ErrorKind::StateConflict,
            TransactionError::InsufficientStock { .. } => ErrorKind::InsufficientStock,
            TransactionError::InvalidPackSize { .. }
            | TransactionError::ReservationInconsistent { .. } => ErrorKind::Configuration,
            TransactionError::Store(_) => ErrorKind::Internal,
        }
    }

    #[inline]
    pub fn is_caller_error(&self) -> bool {
        self.kind().is_caller_error()
    }
}

impl From<StockError> for TransactionError {
    fn from(err: StockError) -> Self {
        match err {
            StockError::InsufficientStock {
                product_id,
                available,
                required,
            } => TransactionError::InsufficientStock {
                product_id,
                available,
                required,
            },
            StockError::InvalidPackSize {
                product_id,
                pack_size,
            } => TransactionError::InvalidPackSize {
                product_id,
                pack_size,
            },
            StockError::EmptyTransaction => TransactionError::InvalidInput(ValidationError::Required {
                field: "items".to_string(),
            }),
            StockError::Overflow { product_id } => {
                TransactionError::InvalidInput(ValidationError::InvalidFormat {
                    field: "qty".to_string(),
                    reason: format!("base-unit quantity overflows for product {product_id}"),
                })
            }
            other => TransactionError::ReservationInconsistent {
                product_id: other.product_id().unwrap_or_default().to_string(),
                reason: other.to_string(),
            },
        }
    }
}

/// Convenience type alias for transaction operations.
pub type TransactionResult<T> = Result<T, TransactionError>;

// =============================================================================
// Payment Error
// =============================================================================

/// Errors from posting and listing payments.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaymentError {
    #[error("invalid input: {0}")]
    InvalidInput(#[from] ValidationError),

    #[error("transaction not found: {0}")]
    TransactionMissing(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl PaymentError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PaymentError::InvalidInput(_) => ErrorKind::InvalidInput,
            PaymentError::TransactionMissing(_) => ErrorKind::NotFound,
            PaymentError::Store(_) => ErrorKind::Internal,
        }
    }

    #[inline]
    pub fn is_caller_error(&self) -> bool {
        self.kind().is_caller_error()
    }
}

/// Convenience type alias for payment operations.
pub type PaymentResult<T> = Result<T, PaymentError>;

// =============================================================================
// Unit Tests
// =============================================================================
