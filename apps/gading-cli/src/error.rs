//! # CLI Error Type
//!
//! Every failure leaves the binary as one JSON object and an exit code.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  TransactionError / PaymentError ──► kind() ──► ErrorCode              │
//! │  DbError / config / usage        ──────────►  ErrorCode                │
//! │                                                                         │
//! │  stdout: {"error": {"code": "INSUFFICIENT_STOCK", "message": "..."}}    │
//! │  exit:   2 caller error, 1 everything else                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use gading_db::DbError;
use gading_ledger::{ErrorKind, PaymentError, TransactionError};
use serde::Serialize;
use thiserror::Error;

/// Machine-readable error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Bad command line
    Usage,

    /// Malformed or missing fields
    InvalidInput,

    /// Customer, product, price or transaction missing
    NotFound,

    /// Status does not allow the operation
    StateConflict,

    /// Not enough stock
    InsufficientStock,

    /// Catalog/stock data is inconsistent, or the config file is broken
    Configuration,

    /// Database unreachable or failed
    DatabaseError,

    Internal,
}

impl From<ErrorKind> for ErrorCode {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::InvalidInput => ErrorCode::InvalidInput,
            ErrorKind::NotFound => ErrorCode::NotFound,
            ErrorKind::StateConflict => ErrorCode::StateConflict,
            ErrorKind::InsufficientStock => ErrorCode::InsufficientStock,
            ErrorKind::Configuration => ErrorCode::Configuration,
            ErrorKind::Internal => ErrorCode::Internal,
        }
    }
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Transaction(#[from] TransactionError),

    #[error(transparent)]
    Payment(#[from] PaymentError),

    #[error(transparent)]
    Database(#[from] DbError),

    #[error("failed to write output: {0}")]
    Output(#[from] serde_json::Error),
}

impl CliError {
    pub fn usage(message: impl Into<String>) -> Self {
        CliError::Usage(message.into())
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            CliError::Usage(_) => ErrorCode::Usage,
            CliError::Config(_) => ErrorCode::Configuration,
            CliError::Transaction(e) => e.kind().into(),
            CliError::Payment(e) => e.kind().into(),
            CliError::Database(_) => ErrorCode::DatabaseError,
            CliError::Output(_) => ErrorCode::Internal,
        }
    }

    /// 2 when the caller can fix the request, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        let caller = match self {
            CliError::Usage(_) | CliError::Config(_) => true,
            CliError::Transaction(e) => e.is_caller_error(),
            CliError::Payment(e) => e.is_caller_error(),
            CliError::Database(_) | CliError::Output(_) => false,
        };
        if caller {
            2
        } else {
            1
        }
    }

    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            code: self.code(),
            message: self.to_string(),
        }
    }
}

/// What gets printed for a failed command.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub code: ErrorCode,
    pub message: String,
}

pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;
    use gading_ledger::StoreError;

    #[test]
    fn test_ledger_kinds_map_to_codes() {
        let err = CliError::from(TransactionError::InsufficientStock {
            product_id: "p".into(),
            available: 1,
            required: 2,
        });
        assert_eq!(err.code(), ErrorCode::InsufficientStock);
        assert_eq!(err.exit_code(), 2);

        let err = CliError::from(TransactionError::InvalidPackSize {
            product_id: "p".into(),
            pack_size: "1.5".into(),
        });
        assert_eq!(err.code(), ErrorCode::Configuration);
        assert_eq!(err.exit_code(), 1);

        let err = CliError::from(PaymentError::Store(StoreError::Unavailable("down".into())));
        assert_eq!(err.code(), ErrorCode::Internal);
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_body_serializes_screaming_code() {
        let body = CliError::from(TransactionError::TransactionMissing("t-1".into())).body();
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["code"], "NOT_FOUND");
        assert_eq!(json["message"], "transaction not found: t-1");
    }

    #[test]
    fn test_usage_is_caller_error() {
        assert_eq!(CliError::usage("missing id").exit_code(), 2);
    }
}
