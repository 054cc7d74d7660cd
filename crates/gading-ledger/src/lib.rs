//! # Gading Ledger
//!
//! The transaction lifecycle engine: pricing, stock reservation and the
//! payment ledger, run against any [`Store`].
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                            gading-ledger                                │
//! │                                                                         │
//! │   TransactionService ──┬──► pricing::resolve                            │
//! │                        └──► stock_ledger::{reserve, commit, release}    │
//! │   PaymentService ─────────► PaymentRows                                 │
//! │                                                                         │
//! │   ─────────────────────── Store / UnitOfWork ─────────────────────────  │
//! │        MemoryStore (this crate)          PgStore (gading-db)            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every mutating operation opens one unit of work and either commits all of
//! its writes or none of them.
//!
//! ## Usage
//! ```rust,ignore
//! use gading_ledger::{MemoryStore, TransactionService};
//!
//! let service = TransactionService::new(MemoryStore::new());
//! let detail = service.create(input).await?;
//! service.update_status(&detail.transaction.id, TransactionStatus::Pending).await?;
//! ```

pub mod clock;
pub mod error;
pub mod memory;
pub mod payment;
pub mod pricing;
pub mod stock_ledger;
pub mod store;
pub mod transaction;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{
    ErrorKind, PaymentError, PaymentResult, StoreError, StoreResult, TransactionError,
    TransactionResult,
};
pub use memory::{MemoryStore, MemoryUnit};
pub use payment::PaymentService;
pub use pricing::ResolvedPrice;
pub use store::{CatalogReader, PaymentRows, StockRows, Store, TransactionRows, UnitOfWork};
pub use transaction::{parse_status, TransactionService};
