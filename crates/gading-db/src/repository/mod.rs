//! # Repository Module
//!
//! PostgreSQL access for the Gading engine.
//!
//! ## Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  PgStore / PgUnitOfWork (store.rs)   implements the ledger traits       │
//! │       │                                                                 │
//! │       ├── catalog.rs      customers, products, stock rules, prices      │
//! │       ├── stock.rs        base-unit lines, FOR UPDATE stock counters    │
//! │       ├── transaction.rs  headers, items, list, view                    │
//! │       └── payment.rs      payments and the paid aggregate               │
//! │                                                                         │
//! │  rows.rs maps selected rows onto gading-core types                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Query functions take `&mut PgConnection` so the same SQL runs on a pooled
//! connection for reads and inside a unit's transaction for writes.
//!
//! ## Available Repositories
//!
//! - [`CatalogRepository`](catalog::CatalogRepository) - Master data administration
//! - [`PgStore`](store::PgStore) - The engine store

pub mod catalog;
pub(crate) mod payment;
pub(crate) mod rows;
pub(crate) mod stock;
pub mod store;
pub(crate) mod transaction;
