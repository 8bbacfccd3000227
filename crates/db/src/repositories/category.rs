//! Category repository: CRUD scoped to a tenant (section 4.1).

use ledgercube_core::ledger::{Category, CategoryFilter, CategoryUpdate, FlowType, LedgerService, NewCategory};
use ledgercube_shared::{CategoryId, TenantCtx};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use crate::entities::{categories, transactions};
use crate::error::RepoError;

/// Repository for categories.
#[derive(Debug, Clone)]
pub struct CategoryRepository {
    db: DatabaseConnection,
}

impl CategoryRepository {
    /// Creates a new category repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists categories for a tenant, ordered `(name ASC)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_categories(
        &self,
        tenant: &TenantCtx,
        filter: &CategoryFilter,
    ) -> Result<Vec<Category>, RepoError> {
        let mut query =
            categories::Entity::find().filter(categories::Column::TenantId.eq(tenant.tenant_id().as_str()));

        if let Some(kind) = filter.kind {
            query = query.filter(categories::Column::Kind.eq(crate::entities::sea_orm_active_enums::FlowType::from(kind)));
        }
        if let Some(search) = &filter.search {
            query = query.filter(categories::Column::Name.contains(search));
        }

        let rows = query.order_by_asc(categories::Column::Name).all(&self.db).await?;
        Ok(rows.into_iter().map(to_core_category).collect())
    }

    /// Fetches a single category scoped to the tenant.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`/`CrossTenant` if the category does not belong to
    /// this tenant, or an error if the query fails.
    pub async fn get_category(&self, tenant: &TenantCtx, id: CategoryId) -> Result<Category, RepoError> {
        let row = find_category_row(&self.db, tenant, id).await?;
        Ok(to_core_category(row))
    }

    /// Creates a new category, rejecting a `(name, kind)` collision.
    ///
    /// # Errors
    ///
    /// Returns `UniqueViolation` on a collision, or an error if the insert
    /// fails.
    pub async fn create_category(&self, tenant: &TenantCtx, new: NewCategory) -> Result<Category, RepoError> {
        let existing = categories::Entity::find()
            .filter(categories::Column::TenantId.eq(tenant.tenant_id().as_str()))
            .all(&self.db)
            .await?;
        let existing_pairs: Vec<(&str, FlowType)> =
            existing.iter().map(|c| (c.name.as_str(), FlowType::from(c.kind))).collect();
        LedgerService::validate_unique_category(&existing_pairs, &new.name, new.kind)?;

        let id = CategoryId::new();
        let model = categories::ActiveModel {
            id: Set(id.into_inner()),
            tenant_id: Set(tenant.tenant_id().as_str().to_string()),
            name: Set(new.name),
            kind: Set(new.kind.into()),
            color: Set(new.color),
        };
        let row = model.insert(&self.db).await?;
        Ok(to_core_category(row))
    }

    /// Applies a partial update to a category.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`/`CrossTenant` if the category does not belong to
    /// this tenant, `UniqueViolation` on a `(name, kind)` collision, or an
    /// error if the update fails.
    pub async fn update_category(
        &self,
        tenant: &TenantCtx,
        id: CategoryId,
        update: CategoryUpdate,
    ) -> Result<Category, RepoError> {
        let row = find_category_row(&self.db, tenant, id).await?;

        let next_name = update.name.clone().unwrap_or_else(|| row.name.clone());
        let next_kind = update.kind.unwrap_or_else(|| FlowType::from(row.kind));
        if next_name != row.name || next_kind != FlowType::from(row.kind) {
            let existing = categories::Entity::find()
                .filter(categories::Column::TenantId.eq(tenant.tenant_id().as_str()))
                .filter(categories::Column::Id.ne(row.id))
                .all(&self.db)
                .await?;
            let existing_pairs: Vec<(&str, FlowType)> =
                existing.iter().map(|c| (c.name.as_str(), FlowType::from(c.kind))).collect();
            LedgerService::validate_unique_category(&existing_pairs, &next_name, next_kind)?;
        }

        let mut model: categories::ActiveModel = row.into();
        if let Some(name) = update.name {
            model.name = Set(name);
        }
        if let Some(kind) = update.kind {
            model.kind = Set(kind.into());
        }
        if let Some(color) = update.color {
            model.color = Set(color);
        }

        let row = model.update(&self.db).await?;
        Ok(to_core_category(row))
    }

    /// Deletes a category, refusing when postings still reference it
    /// (section 4.1: delete of a referenced account or category fails with
    /// `Conflict`).
    ///
    /// # Errors
    ///
    /// Returns `Conflict` if referencing transactions exist, `NotFound`/
    /// `CrossTenant` if the category does not belong to this tenant, or an
    /// error if the delete fails.
    pub async fn delete_category(&self, tenant: &TenantCtx, id: CategoryId) -> Result<(), RepoError> {
        let row = find_category_row(&self.db, tenant, id).await?;

        let referencing = transactions::Entity::find()
            .filter(transactions::Column::CategoryId.eq(row.id))
            .filter(transactions::Column::TenantId.eq(tenant.tenant_id().as_str()))
            .one(&self.db)
            .await?;
        if referencing.is_some() {
            return Err(RepoError::Conflict(format!("category {id} still has transactions")));
        }

        let model: categories::ActiveModel = row.into();
        model.delete(&self.db).await?;
        Ok(())
    }
}

pub(crate) async fn find_category_row(
    conn: &impl ConnectionTrait,
    tenant: &TenantCtx,
    id: CategoryId,
) -> Result<categories::Model, RepoError> {
    let row = categories::Entity::find_by_id(id.into_inner()).one(conn).await?;
    match row {
        Some(row) if row.tenant_id == tenant.tenant_id().as_str() => Ok(row),
        Some(_) => Err(RepoError::CrossTenant(format!("category {id}"))),
        None => Err(RepoError::NotFound(format!("category {id}"))),
    }
}

fn to_core_category(row: categories::Model) -> Category {
    Category { id: CategoryId::from_uuid(row.id), name: row.name, kind: FlowType::from(row.kind), color: row.color }
}
