//! Storage-layer error type shared by every repository.
//!
//! The teacher gives each repository its own error enum (`OrganizationError`,
//! `BudgetError`, ...). Here every repository ultimately drives the same two
//! engines (C1/C3 together inside one transaction, C2 reading what C1/C3
//! wrote), so one shared `RepoError` plays that role instead of duplicating
//! the same `NotFound`/`Conflict`/`Database` variants five times.

use ledgercube_core::balance::BalanceError;
use ledgercube_core::cube::CubeError;
use ledgercube_core::ledger::LedgerError;
use ledgercube_shared::AppError;
use sea_orm::DbErr;

/// Errors a repository method can return.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    /// The referenced entity does not exist within the caller's tenant.
    #[error("not found: {0}")]
    NotFound(String),

    /// The referenced entity exists, but belongs to a different tenant.
    #[error("not found: {0}")]
    CrossTenant(String),

    /// A uniqueness constraint was violated.
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    /// The mutation conflicts with existing references (e.g. deleting an
    /// account that still has postings).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Pass-through of the ledger engine's validation errors.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Pass-through of the balance engine's validation errors.
    #[error(transparent)]
    Balance(#[from] BalanceError),

    /// Pass-through of the cube engine's validation errors.
    #[error(transparent)]
    Cube(#[from] CubeError),

    /// A database error.
    #[error("database error: {0}")]
    Database(#[from] DbErr),
}

impl RepoError {
    /// Stable machine-readable code, matching section 7's error kinds.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) | Self::CrossTenant(_) => "NOT_FOUND",
            Self::UniqueViolation(_) => "UNIQUE_VIOLATION",
            Self::Conflict(_) => "CONFLICT",
            Self::Ledger(err) => err.error_code(),
            Self::Balance(err) => err.error_code(),
            Self::Cube(err) => err.error_code(),
            Self::Database(_) => "STORAGE_FAILURE",
        }
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound(msg) => Self::NotFound(msg),
            RepoError::CrossTenant(msg) => Self::CrossTenant(msg),
            RepoError::UniqueViolation(msg) => Self::UniqueViolation(msg),
            RepoError::Conflict(msg) => Self::Conflict(msg),
            RepoError::Ledger(err) => err.into(),
            RepoError::Balance(err) => Self::Validation(err.to_string()),
            RepoError::Cube(err) => match err {
                CubeError::Inconsistent => Self::CubeInconsistency,
                CubeError::EmptyGroupBy => Self::Validation(err.to_string()),
            },
            RepoError::Database(err) => Self::StorageFailure(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_error_code() {
        assert_eq!(RepoError::NotFound("account".into()).error_code(), "NOT_FOUND");
    }

    #[test]
    fn test_ledger_error_code_passes_through() {
        let err = RepoError::Ledger(LedgerError::Validation("bad".into()));
        assert_eq!(err.error_code(), "VALIDATION");
    }

    #[test]
    fn test_into_app_error() {
        let err = RepoError::Conflict("still referenced".into());
        let app: AppError = err.into();
        assert_eq!(app.error_code(), "CONFLICT");
    }
}
