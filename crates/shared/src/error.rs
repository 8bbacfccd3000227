//! Application-wide error kinds.
//!
//! `AppError` is the outer envelope every crate in the workspace eventually
//! converts its own domain error into (via `From` impls living next to each
//! domain error type). It exists so a caller above the core -- which this
//! workspace does not implement -- has one stable set of kinds to map to
//! transport-level responses, without the core knowing what a transport is.

use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Application error kinds, corresponding to the error kinds named in the
/// ledger/cube/balance specification.
#[derive(Debug, Error)]
pub enum AppError {
    /// Tenant id was missing or empty where one is required.
    #[error("tenant id is required")]
    TenantRequired,

    /// Referenced entity does not exist within the caller's tenant.
    #[error("not found: {0}")]
    NotFound(String),

    /// Referenced entity exists, but in a different tenant.
    ///
    /// Reported identically to `NotFound` by callers to avoid leaking the
    /// existence of another tenant's data.
    #[error("not found: {0}")]
    CrossTenant(String),

    /// A uniqueness constraint (account name, category name+type, anchor
    /// date) was violated.
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    /// The requested mutation conflicts with existing references.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A reconciliation date was after today (UTC).
    #[error("reconcile date is in the future")]
    FutureReconcileDate,

    /// A bulk update's old value was not uniform across the affected rows.
    #[error("bulk update field is not uniform across the affected rows")]
    NonUniformBulk,

    /// A bulk update attempted to change a field bulk updates may not touch.
    #[error("field cannot be changed in a bulk update: {0}")]
    UnsupportedBulkField(String),

    /// Cube-vs-ledger consistency validation failed.
    #[error("cube is inconsistent with the ledger for the checked range")]
    CubeInconsistency,

    /// An I/O or transactional storage error.
    #[error("storage failure: {0}")]
    StorageFailure(String),

    /// Malformed or otherwise invalid input that does not fit a more
    /// specific kind above.
    #[error("validation error: {0}")]
    Validation(String),
}

impl AppError {
    /// Returns the stable error code for this kind, suitable for an external
    /// layer to map to a transport-specific status.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::TenantRequired => "TENANT_REQUIRED",
            Self::NotFound(_) | Self::CrossTenant(_) => "NOT_FOUND",
            Self::UniqueViolation(_) => "UNIQUE_VIOLATION",
            Self::Conflict(_) => "CONFLICT",
            Self::FutureReconcileDate => "FUTURE_RECONCILE_DATE",
            Self::NonUniformBulk => "NON_UNIFORM_BULK",
            Self::UnsupportedBulkField(_) => "UNSUPPORTED_BULK_FIELD",
            Self::CubeInconsistency => "CUBE_INCONSISTENCY",
            Self::StorageFailure(_) => "STORAGE_FAILURE",
            Self::Validation(_) => "VALIDATION_ERROR",
        }
    }

    /// Returns true if the failure is a storage/I/O failure rather than a
    /// semantic validation failure.
    #[must_use]
    pub const fn is_storage_failure(&self) -> bool {
        matches!(self, Self::StorageFailure(_))
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
