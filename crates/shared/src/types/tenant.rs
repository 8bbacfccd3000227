//! Explicit tenant scoping context.
//!
//! The specification's REDESIGN FLAGS call for replacing "decorator"
//! middleware tenant scoping with an explicit value threaded through every
//! API. `TenantCtx` is that value: every `core` and `db` function that
//! touches tenant-owned data takes one as its first parameter, and the
//! storage adapter has no code path that can build a query without one in
//! scope.

use crate::types::id::TenantId;

/// Carries the tenant a call is scoped to.
///
/// Deliberately not `Copy`-free of intent: cloning a `TenantCtx` is cheap
/// (one `String` clone) and callers are expected to pass it by value down
/// call chains rather than threading a reference, matching how the rest of
/// the core passes small value types.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TenantCtx {
    tenant_id: TenantId,
}

impl TenantCtx {
    /// Creates a new tenant context for the given tenant id.
    #[must_use]
    pub const fn new(tenant_id: TenantId) -> Self {
        Self { tenant_id }
    }

    /// Returns the wrapped tenant id.
    #[must_use]
    pub const fn tenant_id(&self) -> &TenantId {
        &self.tenant_id
    }
}

impl From<TenantId> for TenantCtx {
    fn from(tenant_id: TenantId) -> Self {
        Self::new(tenant_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tenant_ctx_roundtrips_id() {
        let id = TenantId::new("acme").unwrap();
        let ctx = TenantCtx::new(id.clone());
        assert_eq!(ctx.tenant_id(), &id);
    }

    #[test]
    fn test_tenant_ctx_from_id() {
        let id = TenantId::new("acme").unwrap();
        let ctx: TenantCtx = id.clone().into();
        assert_eq!(ctx.tenant_id(), &id);
    }
}
