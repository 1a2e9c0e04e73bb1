//! Ledger Error Types
//!
//! One error type flows from the store through the coordinator to the gateway.
//! Validation failures are rejected before any storage access; everything the
//! store reports is propagated verbatim.

use thiserror::Error;

use crate::core_types::AccountId;

/// SQLSTATE for foreign key violations (entry/transfer on a missing account)
const PG_FOREIGN_KEY_VIOLATION: &str = "23503";
/// SQLSTATE for unique violations (duplicate owner/currency account)
const PG_UNIQUE_VIOLATION: &str = "23505";

/// Caller errors detected without touching storage
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Source and destination accounts must differ")]
    SameAccount,

    #[error("Amount must be greater than zero")]
    NonPositiveAmount,

    #[error("Account ID must be positive: {0}")]
    InvalidAccountId(AccountId),

    #[error("Unsupported currency: {0}")]
    UnsupportedCurrency(String),

    #[error("Account {account_id} currency mismatch: {actual} vs {expected}")]
    CurrencyMismatch {
        account_id: AccountId,
        expected: String,
        actual: String,
    },

    #[error("Owner must not be empty")]
    EmptyOwner,

    #[error("Invalid page: {0}")]
    InvalidPage(String),
}

/// Ledger error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LedgerError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Insufficient balance on account {account_id}")]
    InsufficientBalance { account_id: AccountId },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("transaction error: {cause}, rollback error: {rollback}")]
    Rollback {
        cause: Box<LedgerError>,
        rollback: Box<LedgerError>,
    },

    #[error("Operation cancelled")]
    Cancelled,
}

impl LedgerError {
    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        LedgerError::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    /// Get the error code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            LedgerError::Validation(_) => "VALIDATION_ERROR",
            LedgerError::NotFound { .. } => "NOT_FOUND",
            LedgerError::Conflict(_) => "CONFLICT",
            LedgerError::InsufficientBalance { .. } => "INSUFFICIENT_BALANCE",
            LedgerError::Storage(_) => "STORAGE_ERROR",
            LedgerError::Rollback { .. } => "ROLLBACK_ERROR",
            LedgerError::Cancelled => "CANCELLED",
        }
    }

    /// Get HTTP status code suggestion
    pub fn http_status(&self) -> u16 {
        match self {
            LedgerError::Validation(_) => 400,
            LedgerError::NotFound { .. } => 404,
            LedgerError::Conflict(_) => 409,
            LedgerError::InsufficientBalance { .. } => 422,
            LedgerError::Storage(_) | LedgerError::Rollback { .. } => 500,
            LedgerError::Cancelled => 503,
        }
    }
}

impl From<sqlx::Error> for LedgerError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::RowNotFound => LedgerError::not_found("row", "query returned no rows"),
            sqlx::Error::Database(db_err) => match db_err.code().as_deref() {
                Some(PG_FOREIGN_KEY_VIOLATION) => LedgerError::not_found(
                    "account",
                    db_err.constraint().unwrap_or("foreign key"),
                ),
                Some(PG_UNIQUE_VIOLATION) => LedgerError::Conflict(db_err.message().to_string()),
                _ => LedgerError::Storage(e.to_string()),
            },
            _ => LedgerError::Storage(e.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for LedgerError {
    fn from(e: sqlx::migrate::MigrateError) -> Self {
        LedgerError::Storage(e.to_string())
    }
}
