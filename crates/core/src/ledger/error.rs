//! Errors raised by the ledger service's validation and planning logic.

use chrono::NaiveDate;
use ledgercube_shared::AppError;
use thiserror::Error;

use super::types::ChangedField;

/// Errors the ledger service's pure logic can raise. Cross-tenant
/// references, not-found lookups, and storage failures are detected by the
/// repositories that actually run the queries and are reported as `db`
/// crate errors instead.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// An active account with this name already exists for the tenant.
    #[error("an active account named '{0}' already exists")]
    DuplicateAccountName(String),

    /// A category with this name and type already exists for the tenant.
    #[error("a category named '{name}' of type {kind:?} already exists")]
    DuplicateCategory {
        name: String,
        kind: super::types::FlowType,
    },

    /// A balance anchor already exists for this account on this date.
    #[error("a balance anchor already exists for this account on {0}")]
    DuplicateAnchorDate(NaiveDate),

    /// `reconcile_date` is later than today (UTC).
    #[error("reconcile date {0} is in the future")]
    FutureReconcileDate(NaiveDate),

    /// A bulk update's old value on the changed field was not uniform
    /// across the affected rows.
    #[error("old value of {field:?} is not uniform across the affected rows")]
    NonUniformBulk { field: ChangedField },

    /// A bulk update attempted to change a field outside the allowed set
    /// (most notably `date`).
    #[error("bulk updates cannot change '{0}'")]
    UnsupportedBulkField(String),

    /// Any other structural validation failure.
    #[error("{0}")]
    Validation(String),
}

impl LedgerError {
    /// Stable machine-readable code, matching section 7's error kinds.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::DuplicateAccountName(_) | Self::DuplicateCategory { .. } | Self::DuplicateAnchorDate(_) => {
                "UNIQUE_VIOLATION"
            }
            Self::FutureReconcileDate(_) => "FUTURE_RECONCILE_DATE",
            Self::NonUniformBulk { .. } => "NON_UNIFORM_BULK",
            Self::UnsupportedBulkField(_) => "UNSUPPORTED_BULK_FIELD",
            Self::Validation(_) => "VALIDATION",
        }
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::DuplicateAccountName(name) => AppError::UniqueViolation(name),
            LedgerError::DuplicateCategory { name, .. } => AppError::UniqueViolation(name),
            LedgerError::DuplicateAnchorDate(date) => AppError::UniqueViolation(date.to_string()),
            LedgerError::FutureReconcileDate(_) => AppError::FutureReconcileDate,
            LedgerError::NonUniformBulk { .. } => AppError::NonUniformBulk,
            LedgerError::UnsupportedBulkField(field) => AppError::UnsupportedBulkField(field),
            LedgerError::Validation(msg) => AppError::Validation(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::types::FlowType;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            LedgerError::DuplicateAccountName("Checking".to_string()).error_code(),
            "UNIQUE_VIOLATION"
        );
        assert_eq!(
            LedgerError::FutureReconcileDate(NaiveDate::from_ymd_opt(2099, 1, 1).unwrap())
                .error_code(),
            "FUTURE_RECONCILE_DATE"
        );
        assert_eq!(
            LedgerError::NonUniformBulk {
                field: ChangedField::CategoryId
            }
            .error_code(),
            "NON_UNIFORM_BULK"
        );
    }

    #[test]
    fn test_into_app_error_preserves_code() {
        let err = LedgerError::DuplicateCategory {
            name: "Groceries".to_string(),
            kind: FlowType::Expense,
        };
        let app_err: AppError = err.into();
        assert_eq!(app_err.error_code(), "UNIQUE_VIOLATION");
    }
}
