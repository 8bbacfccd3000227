//! Balance anchor repository: direct CRUD over the anchor table (section
//! 3). `reconcile_account` (see [`crate::repositories::account`]) writes its
//! own anchor inline as part of the reconciliation transaction; this
//! repository covers anchor management outside that workflow.

use ledgercube_core::ledger::{BalanceAnchor, LedgerService, NewBalanceAnchor};
use ledgercube_shared::{AccountId, BalanceAnchorId, TenantCtx};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set};

use crate::entities::balance_anchors;
use crate::error::RepoError;

/// Repository for balance anchors.
#[derive(Debug, Clone)]
pub struct BalanceAnchorRepository {
    db: DatabaseConnection,
}

impl BalanceAnchorRepository {
    /// Creates a new balance anchor repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists every anchor for an account, ordered `(anchor_date ASC)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_anchors(
        &self,
        tenant: &TenantCtx,
        account_id: AccountId,
    ) -> Result<Vec<BalanceAnchor>, RepoError> {
        let rows = balance_anchors::Entity::find()
            .filter(balance_anchors::Column::TenantId.eq(tenant.tenant_id().as_str()))
            .filter(balance_anchors::Column::AccountId.eq(account_id.into_inner()))
            .order_by_asc(balance_anchors::Column::AnchorDate)
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(to_core_anchor).collect())
    }

    /// Fetches a single anchor scoped to the tenant.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`/`CrossTenant` if the anchor does not belong to
    /// this tenant, or an error if the query fails.
    pub async fn get_anchor(&self, tenant: &TenantCtx, id: BalanceAnchorId) -> Result<BalanceAnchor, RepoError> {
        let row = find_anchor_row(&self.db, tenant, id).await?;
        Ok(to_core_anchor(row))
    }

    /// Creates a new anchor, rejecting a `(account_id, anchor_date)`
    /// collision.
    ///
    /// # Errors
    ///
    /// Returns `UniqueViolation` on a collision, or an error if the insert
    /// fails.
    pub async fn create_anchor(
        &self,
        tenant: &TenantCtx,
        new: NewBalanceAnchor,
    ) -> Result<BalanceAnchor, RepoError> {
        let existing = balance_anchors::Entity::find()
            .filter(balance_anchors::Column::TenantId.eq(tenant.tenant_id().as_str()))
            .filter(balance_anchors::Column::AccountId.eq(new.account_id.into_inner()))
            .all(&self.db)
            .await?;
        let existing_dates: Vec<chrono::NaiveDate> = existing.iter().map(|a| a.anchor_date).collect();
        LedgerService::validate_unique_anchor_date(&existing_dates, new.anchor_date)?;

        let id = BalanceAnchorId::new();
        let model = balance_anchors::ActiveModel {
            id: Set(id.into_inner()),
            tenant_id: Set(tenant.tenant_id().as_str().to_string()),
            account_id: Set(new.account_id.into_inner()),
            anchor_date: Set(new.anchor_date),
            balance: Set(new.balance),
            description: Set(new.description),
        };
        let row = model.insert(&self.db).await?;
        Ok(to_core_anchor(row))
    }

    /// Deletes an anchor.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`/`CrossTenant` if the anchor does not belong to
    /// this tenant, or an error if the delete fails.
    pub async fn delete_anchor(&self, tenant: &TenantCtx, id: BalanceAnchorId) -> Result<(), RepoError> {
        let row = find_anchor_row(&self.db, tenant, id).await?;
        let model: balance_anchors::ActiveModel = row.into();
        model.delete(&self.db).await?;
        Ok(())
    }
}

async fn find_anchor_row(
    conn: &DatabaseConnection,
    tenant: &TenantCtx,
    id: BalanceAnchorId,
) -> Result<balance_anchors::Model, RepoError> {
    let row = balance_anchors::Entity::find_by_id(id.into_inner()).one(conn).await?;
    match row {
        Some(row) if row.tenant_id == tenant.tenant_id().as_str() => Ok(row),
        Some(_) => Err(RepoError::CrossTenant(format!("balance anchor {id}"))),
        None => Err(RepoError::NotFound(format!("balance anchor {id}"))),
    }
}

fn to_core_anchor(row: balance_anchors::Model) -> BalanceAnchor {
    BalanceAnchor {
        id: BalanceAnchorId::from_uuid(row.id),
        account_id: AccountId::from_uuid(row.account_id),
        anchor_date: row.anchor_date,
        balance: row.balance,
        description: row.description,
    }
}
