//! # Database Error Types
//!
//! Error types for database operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  PostgreSQL Error (sqlx::Error)                                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbError (this module) ← SQLSTATE classification                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  StoreError (gading-ledger) ← opaque to the engine                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  CLI prints an INTERNAL error, exit code 1                             │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use gading_ledger::StoreError;
use thiserror::Error;

/// PostgreSQL error codes this crate distinguishes.
mod sqlstate {
    pub const UNIQUE_VIOLATION: &str = "23505";
    pub const FOREIGN_KEY_VIOLATION: &str = "23503";
    pub const CHECK_VIOLATION: &str = "23514";
    pub const SERIALIZATION_FAILURE: &str = "40001";
    pub const DEADLOCK_DETECTED: &str = "40P01";
    pub const LOCK_NOT_AVAILABLE: &str = "55P03";
    pub const QUERY_CANCELED: &str = "57014";
}

/// Database operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in database.
    ///
    /// ## When This Occurs
    /// - `fetch_one` returns no rows
    /// - An UPDATE by id touched nothing
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation.
    ///
    /// ## When This Occurs
    /// - Duplicate SKU, category code or customer email
    #[error("Duplicate value violates {constraint}")]
    UniqueViolation { constraint: String },

    /// Foreign key constraint violation.
    ///
    /// ## When This Occurs
    /// - Referencing a non-existent customer, product or category
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// CHECK constraint violation.
    ///
    /// ## When This Occurs
    /// - Stock counters would break `0 <= reserved <= on_hand`
    /// - Non-positive quantity or pack size
    #[error("Check constraint {constraint} violated")]
    CheckViolation { constraint: String },

    /// Lock could not be taken in time, deadlock, or serialization failure.
    #[error("Lock conflict: {0}")]
    LockConflict(String),

    /// Database connection failed.
    ///
    /// ## When This Occurs
    /// - Server unreachable
    /// - Bad credentials
    /// - Pool closed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// A stored row doesn't map onto a domain value.
    ///
    /// ## When This Occurs
    /// - Unknown status text
    /// - Stock counters outside their invariant
    #[error("Corrupt row: {0}")]
    Corrupt(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    pub fn corrupt(what: impl std::fmt::Display) -> Self {
        DbError::Corrupt(what.to_string())
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// sqlx::Error::Database       → SQLSTATE (23505, 23503, 23514, 40001, 40P01, 55P03, 57014)
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// sqlx::Error::PoolClosed/Io  → DbError::ConnectionFailed
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Record", "unknown"),

            sqlx::Error::Database(db_err) => {
                let constraint = db_err.constraint().unwrap_or("unknown").to_string();
                let message = db_err.message().to_string();

                match db_err.code().as_deref() {
                    Some(sqlstate::UNIQUE_VIOLATION) => DbError::UniqueViolation { constraint },
                    Some(sqlstate::FOREIGN_KEY_VIOLATION) => {
                        DbError::ForeignKeyViolation { message }
                    }
                    Some(sqlstate::CHECK_VIOLATION) => DbError::CheckViolation { constraint },
                    Some(
                        sqlstate::SERIALIZATION_FAILURE
                        | sqlstate::DEADLOCK_DETECTED
                        | sqlstate::LOCK_NOT_AVAILABLE
                        | sqlstate::QUERY_CANCELED,
                    ) => DbError::LockConflict(message),
                    _ => DbError::QueryFailed(message),
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            sqlx::Error::Io(e) => DbError::ConnectionFailed(e.to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// The engine only needs to know whether a failure was contention,
/// unavailability or anything else.
impl From<DbError> for StoreError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::LockConflict(_) => StoreError::Conflict(err.to_string()),
            DbError::ConnectionFailed(_) | DbError::PoolExhausted => {
                StoreError::Unavailable(err.to_string())
            }
            _ => StoreError::Internal(err.to_string()),
        }
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_mapping() {
        assert!(matches!(
            StoreError::from(DbError::LockConflict("deadlock detected".into())),
            StoreError::Conflict(_)
        ));
        assert!(matches!(
            StoreError::from(DbError::PoolExhausted),
            StoreError::Unavailable(_)
        ));
        assert!(matches!(
            StoreError::from(DbError::CheckViolation {
                constraint: "products_reserved_within_on_hand".into()
            }),
            StoreError::Internal(_)
        ));
    }

    #[test]
    fn test_row_not_found() {
        assert!(matches!(
            DbError::from(sqlx::Error::RowNotFound),
            DbError::NotFound { .. }
        ));
    }
}
