use super::*;
use std::str::FromStr;
use uuid::Uuid;

#[test]
fn test_typed_id_creation() {
    let id = AccountId::new();
    assert!(!id.to_string().is_empty());
}

#[test]
fn test_typed_id_from_uuid() {
    let uuid = Uuid::new_v4();
    let id = AccountId::from_uuid(uuid);
    assert_eq!(id.into_inner(), uuid);
}

#[test]
fn test_typed_id_default() {
    let id = TransactionId::default();
    assert!(!id.to_string().is_empty());
}

#[test]
fn test_typed_id_display() {
    let uuid = Uuid::new_v4();
    let id = CategoryId::from_uuid(uuid);
    assert_eq!(format!("{}", id), uuid.to_string());
}

#[test]
fn test_typed_id_from_str() {
    let uuid = Uuid::new_v4();
    let id = BalanceAnchorId::from_str(&uuid.to_string()).unwrap();
    assert_eq!(id.into_inner(), uuid);
}

#[test]
fn test_typed_id_from_str_error() {
    assert!(AccountId::from_str("invalid").is_err());
}

#[test]
fn test_distinct_ids_do_not_collide_by_type() {
    // Same underlying uuid, different typed wrappers -- the point of the
    // typed-id pattern is that these are not interchangeable at the type
    // level, only (incidentally) equal in their raw representation.
    let uuid = Uuid::new_v4();
    let account = AccountId::from_uuid(uuid);
    let category = CategoryId::from_uuid(uuid);
    assert_eq!(account.into_inner(), category.into_inner());
}

#[test]
fn test_tenant_id_rejects_empty() {
    assert!(matches!(TenantId::new(""), Err(TenantIdError::Empty)));
    assert!(matches!(TenantId::new("   "), Err(TenantIdError::Empty)));
}

#[test]
fn test_tenant_id_accepts_opaque_string() {
    let tenant = TenantId::new("tenant-42").unwrap();
    assert_eq!(tenant.as_str(), "tenant-42");
    assert_eq!(tenant.to_string(), "tenant-42");
}
