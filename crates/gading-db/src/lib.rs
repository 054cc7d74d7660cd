//! # gading-db: PostgreSQL Store for Gading
//!
//! Implements the `gading-ledger` store traits on PostgreSQL with sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Gading Data Flow                                 │
//! │                                                                         │
//! │  gading CLI (create / status / fulfill / pay / view)                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  TransactionService / PaymentService (gading-ledger)                    │
//! │       │  Store::begin() ─► UnitOfWork                                   │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     gading-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐   │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │   │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │   │   │
//! │  │   │               │    │ PgStore       │    │ 001_initial  │   │   │
//! │  │   │ PgPool        │◄───│ CatalogRepo   │    │ ...          │   │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  PostgreSQL (row locks via SELECT ... FOR UPDATE)                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use gading_db::{Database, DbConfig};
//! use gading_ledger::TransactionService;
//!
//! let db = Database::new(DbConfig::new(url).run_migrations(true)).await?;
//! let service = TransactionService::new(db.store());
//! let detail = service.create(input).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::catalog::{CatalogRepository, NewCustomer, NewPrice, NewProduct};
pub use repository::store::{PgStore, PgUnitOfWork};
