use super::*;

#[test]
fn test_app_error_codes() {
    assert_eq!(AppError::TenantRequired.error_code(), "TENANT_REQUIRED");
    assert_eq!(AppError::NotFound("x".into()).error_code(), "NOT_FOUND");
    assert_eq!(AppError::CrossTenant("x".into()).error_code(), "NOT_FOUND");
    assert_eq!(
        AppError::UniqueViolation("x".into()).error_code(),
        "UNIQUE_VIOLATION"
    );
    assert_eq!(AppError::Conflict("x".into()).error_code(), "CONFLICT");
    assert_eq!(
        AppError::FutureReconcileDate.error_code(),
        "FUTURE_RECONCILE_DATE"
    );
    assert_eq!(AppError::NonUniformBulk.error_code(), "NON_UNIFORM_BULK");
    assert_eq!(
        AppError::UnsupportedBulkField("date".into()).error_code(),
        "UNSUPPORTED_BULK_FIELD"
    );
    assert_eq!(
        AppError::CubeInconsistency.error_code(),
        "CUBE_INCONSISTENCY"
    );
    assert_eq!(
        AppError::StorageFailure("x".into()).error_code(),
        "STORAGE_FAILURE"
    );
    assert_eq!(
        AppError::Validation("x".into()).error_code(),
        "VALIDATION_ERROR"
    );
}

#[test]
fn test_cross_tenant_and_not_found_are_indistinguishable_by_code() {
    // Intentional: leaking whether an id belongs to another tenant is a
    // disclosure bug, so both must map to the same external error code.
    assert_eq!(
        AppError::NotFound("a".into()).error_code(),
        AppError::CrossTenant("a".into()).error_code()
    );
}

#[test]
fn test_is_storage_failure() {
    assert!(AppError::StorageFailure("x".into()).is_storage_failure());
    assert!(!AppError::NotFound("x".into()).is_storage_failure());
}

#[test]
fn test_display_messages() {
    assert_eq!(
        format!("{}", AppError::NonUniformBulk),
        "bulk update field is not uniform across the affected rows"
    );
    assert_eq!(
        format!("{}", AppError::FutureReconcileDate),
        "reconcile date is in the future"
    );
}
