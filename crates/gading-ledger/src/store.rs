//! # Store Capability Traits
//!
//! The engine never speaks SQL. It talks to storage through narrow traits:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Store                                                                  │
//! │  ├── begin() ──► UnitOfWork  (one atomic, isolated unit)                │
//! │  │               ├── CatalogReader    customer, product, prices         │
//! │  │               ├── StockRows        lines, lock_stock, write_stock    │
//! │  │               ├── TransactionRows  insert, lock, write_status        │
//! │  │               ├── PaymentRows      insert, posted amounts, state     │
//! │  │               └── commit(self)                                       │
//! │  │                                                                      │
//! │  └── read projections (no locks): find, list, view, payments            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Unit of work contract
//! - Nothing written through a unit is visible to others until `commit`.
//! - Dropping a unit without committing rolls it back. A cancelled caller
//!   therefore releases every lock it held.
//! - `lock_*` methods are "lock and read": the row stays exclusively locked
//!   until the unit ends.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gading_core::{
    Customer, ListTransactionsInput, Money, Payment, PaymentStatus, ProductPrice, StockLevel,
    StockLine, Transaction, TransactionDetail, TransactionItem, TransactionStatus,
    TransactionView,
};

use crate::error::StoreResult;

// =============================================================================
// Store
// =============================================================================

#[async_trait]
pub trait Store: Send + Sync {
    type Unit: UnitOfWork;

    /// Opens a new unit of work.
    async fn begin(&self) -> StoreResult<Self::Unit>;

    /// Header and items.
    async fn find_transaction(&self, id: &str) -> StoreResult<Option<TransactionDetail>>;

    /// Newest first, honoring the status filter and paging.
    async fn list_transactions(&self, input: ListTransactionsInput) -> StoreResult<Vec<Transaction>>;

    /// Composite projection. `None` when the transaction doesn't exist.
    async fn transaction_view(&self, id: &str) -> StoreResult<Option<TransactionView>>;

    /// Payments newest `paid_at` first, then newest `created_at`.
    /// `None` when the transaction doesn't exist.
    async fn payments_for(&self, transaction_id: &str) -> StoreResult<Option<Vec<Payment>>>;
}

// =============================================================================
// Unit of Work
// =============================================================================

#[async_trait]
pub trait UnitOfWork: CatalogReader + StockRows + TransactionRows + PaymentRows + Send {
    /// Makes every write of this unit durable and visible.
    async fn commit(self) -> StoreResult<()>;
}

/// Read-only master data.
#[async_trait]
pub trait CatalogReader: Send {
    async fn customer(&mut self, id: &str) -> StoreResult<Option<Customer>>;

    async fn product_exists(&mut self, id: &str) -> StoreResult<bool>;

    /// Price rows valid at `now` for the category tier and the default tier.
    ///
    /// Implementations may return extra rows; the caller does the final
    /// selection.
    async fn price_candidates(
        &mut self,
        product_id: &str,
        category_id: Option<&str>,
        now: DateTime<Utc>,
    ) -> StoreResult<Vec<ProductPrice>>;
}

/// Per-product stock counters.
#[async_trait]
pub trait StockRows: Send {
    /// The transaction's items joined with their stock rules.
    async fn stock_lines(&mut self, transaction_id: &str) -> StoreResult<Vec<StockLine>>;

    /// Locks the stock-tracked product's row and reads its counters.
    async fn lock_stock(&mut self, stock_product_id: &str) -> StoreResult<Option<StockLevel>>;

    /// Writes counters for a row locked earlier in this unit.
    async fn write_stock(&mut self, level: &StockLevel) -> StoreResult<()>;
}

/// Transaction headers and items.
#[async_trait]
pub trait TransactionRows: Send {
    async fn insert_transaction(&mut self, transaction: &Transaction) -> StoreResult<()>;

    async fn insert_item(&mut self, item: &TransactionItem) -> StoreResult<()>;

    /// Locks the transaction row and reads it.
    async fn lock_transaction(&mut self, id: &str) -> StoreResult<Option<Transaction>>;

    /// Sets the status of a locked transaction and returns the new header.
    async fn write_status(
        &mut self,
        id: &str,
        status: TransactionStatus,
        at: DateTime<Utc>,
    ) -> StoreResult<Transaction>;
}

/// Payment rows and the transaction's payment aggregate.
#[async_trait]
pub trait PaymentRows: Send {
    async fn insert_payment(&mut self, payment: &Payment) -> StoreResult<()>;

    /// Amounts of every `posted` payment of the transaction.
    async fn posted_payment_amounts(&mut self, transaction_id: &str) -> StoreResult<Vec<Money>>;

    async fn write_payment_state(
        &mut self,
        transaction_id: &str,
        paid_amount: Money,
        payment_status: PaymentStatus,
        at: DateTime<Utc>,
    ) -> StoreResult<()>;
}
