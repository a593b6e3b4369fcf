//! Database-layer error type.

use saldo_core::LedgerError;
use sea_orm::DbErr;
use thiserror::Error;

/// Errors surfaced by repositories: either a business rule violation from
/// the core, or a database failure.
#[derive(Debug, Error)]
pub enum DbError {
    /// Business rule violation.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Database failure.
    #[error("database error: {0}")]
    Database(#[from] DbErr),
}

impl DbError {
    /// Stable error code for the host application.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Ledger(e) => e.error_code(),
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Returns true if the caller should retry the operation.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Ledger(e) => e.is_retryable(),
            Self::Database(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ledger_codes_pass_through() {
        let err = DbError::from(LedgerError::ConcurrentModification);
        assert_eq!(err.error_code(), "CONCURRENT_MODIFICATION");
        assert!(err.is_retryable());
    }

    #[test]
    fn test_database_errors_are_not_retryable() {
        let err = DbError::from(DbErr::Custom("boom".to_string()));
        assert_eq!(err.error_code(), "DATABASE_ERROR");
        assert!(!err.is_retryable());
    }
}
