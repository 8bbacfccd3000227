//! Transaction repository: posting CRUD plus the bulk-update/bulk-delete
//! fast paths (section 4.1/4.3.3), each driving the cube's
//! [`regenerate_targets`] inside the same transaction as the ledger write.

use chrono::Utc;
use ledgercube_core::cube::TargetPlanner;
use ledgercube_core::ledger::{
    BulkChangeDescriptor, BulkFieldChange, ChangeDescriptor, ChangeProjection, ChangedField, DimensionCombo, FlowType,
    LedgerService, NewTransaction, Transaction, TransactionFilter, TransactionUpdate, TransactionWithNames,
};
use ledgercube_shared::{AccountId, CategoryId, TenantCtx, TransactionId};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, Set, TransactionTrait,
};

use crate::entities::{accounts, categories, transactions};
use crate::error::RepoError;
use crate::repositories::account::find_account_row;
use crate::repositories::category::find_category_row;
use crate::repositories::cube::regenerate_targets;

/// The outcome of a bulk mutation: how many rows were affected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BulkOutcome {
    pub affected_count: u64,
}

/// Repository for ledger postings.
#[derive(Debug, Clone)]
pub struct TransactionRepository {
    db: DatabaseConnection,
}

impl TransactionRepository {
    /// Creates a new transaction repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists transactions for a tenant (section 4.1.1), joined with
    /// denormalized account/category names, ordered newest-first by the
    /// same `(date, id, description)` key C2 uses for running balances.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_transactions(
        &self,
        tenant: &TenantCtx,
        filter: &TransactionFilter,
    ) -> Result<Vec<TransactionWithNames>, RepoError> {
        let mut query =
            transactions::Entity::find().filter(transactions::Column::TenantId.eq(tenant.tenant_id().as_str()));

        if let Some(account_id) = filter.account_id {
            query = query.filter(transactions::Column::AccountId.eq(account_id.into_inner()));
        }
        if let Some(category_id) = filter.category_id {
            query = query.filter(transactions::Column::CategoryId.eq(category_id.into_inner()));
        }
        if let Some(tx_type) = filter.tx_type {
            query = query.filter(
                transactions::Column::TxType.eq(crate::entities::sea_orm_active_enums::FlowType::from(tx_type)),
            );
        }
        if let Some(is_recurring) = filter.is_recurring {
            query = query.filter(transactions::Column::IsRecurring.eq(is_recurring));
        }
        if let Some(date_from) = filter.date_from {
            query = query.filter(transactions::Column::Date.gte(date_from));
        }
        if let Some(date_to) = filter.date_to {
            query = query.filter(transactions::Column::Date.lte(date_to));
        }

        let rows = query.all(&self.db).await?;
        let account_names = load_account_names(&self.db, tenant).await?;
        let category_names = load_category_names(&self.db, tenant).await?;

        let mut with_names: Vec<TransactionWithNames> = rows
            .into_iter()
            .map(|row| to_core_with_names(row, &account_names, &category_names))
            .collect();
        with_names.sort_by(|a, b| {
            a.transaction
                .date
                .cmp(&b.transaction.date)
                .then_with(|| a.transaction.id.cmp(&b.transaction.id))
                .then_with(|| a.transaction.description.cmp(&b.transaction.description))
        });
        with_names.reverse();
        Ok(with_names)
    }

    /// Fetches a single transaction, joined with its names.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`/`CrossTenant` if the transaction does not belong
    /// to this tenant, or an error if the query fails.
    pub async fn get_transaction(&self, tenant: &TenantCtx, id: TransactionId) -> Result<TransactionWithNames, RepoError> {
        let row = find_transaction_row(&self.db, tenant, id).await?;
        let account_names = load_account_names(&self.db, tenant).await?;
        let category_names = load_category_names(&self.db, tenant).await?;
        Ok(to_core_with_names(row, &account_names, &category_names))
    }

    /// Creates a new posting, validating its account and (optional)
    /// category belong to the tenant, then regenerates the cube cells it
    /// affects inside the same transaction.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`/`CrossTenant` if the referenced account or
    /// category does not belong to this tenant, or an error if the insert
    /// or cube regeneration fails.
    pub async fn create_transaction(&self, tenant: &TenantCtx, new: NewTransaction) -> Result<Transaction, RepoError> {
        let txn = self.db.begin().await?;

        find_account_row(&txn, tenant, new.account_id).await?;
        if let Some(category_id) = new.category_id {
            find_category_row(&txn, tenant, category_id).await?;
        }

        let id = TransactionId::new();
        let now = Utc::now();
        let model = transactions::ActiveModel {
            id: Set(id.into_inner()),
            tenant_id: Set(tenant.tenant_id().as_str().to_string()),
            account_id: Set(new.account_id.into_inner()),
            category_id: Set(new.category_id.map(CategoryId::into_inner)),
            amount: Set(new.amount),
            description: Set(new.description.clone()),
            date: Set(new.date),
            tx_type: Set(new.tx_type.into()),
            is_recurring: Set(new.is_recurring),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };
        model.insert(&txn).await?;

        let projection = ChangeProjection {
            account_id: new.account_id,
            category_id: new.category_id,
            amount: new.amount,
            date: new.date,
            tx_type: new.tx_type,
            is_recurring: new.is_recurring,
        };
        let change = ChangeDescriptor::Insert { tx_id: id, new: projection };
        let targets = TargetPlanner::targets_for_change(tenant.tenant_id(), &change);
        regenerate_targets(&txn, tenant, targets).await?;

        txn.commit().await?;

        Ok(Transaction {
            id,
            account_id: new.account_id,
            category_id: new.category_id,
            amount: new.amount,
            description: new.description,
            date: new.date,
            tx_type: new.tx_type,
            is_recurring: new.is_recurring,
        })
    }

    /// Applies a partial update to a posting, revalidating any changed
    /// account/category reference, then regenerates the old and new cube
    /// cells inside the same transaction.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`/`CrossTenant` if the transaction, or a newly
    /// referenced account/category, does not belong to this tenant, or an
    /// error if the update or cube regeneration fails.
    pub async fn update_transaction(
        &self,
        tenant: &TenantCtx,
        id: TransactionId,
        update: TransactionUpdate,
    ) -> Result<Transaction, RepoError> {
        let txn = self.db.begin().await?;

        let row = find_transaction_row(&txn, tenant, id).await?;
        let old_projection = to_projection(&row);

        if let Some(account_id) = update.account_id {
            find_account_row(&txn, tenant, account_id).await?;
        }
        if let Some(Some(category_id)) = update.category_id {
            find_category_row(&txn, tenant, category_id).await?;
        }

        let mut model: transactions::ActiveModel = row.into();
        if let Some(account_id) = update.account_id {
            model.account_id = Set(account_id.into_inner());
        }
        if let Some(category_id) = update.category_id {
            model.category_id = Set(category_id.map(CategoryId::into_inner));
        }
        if let Some(amount) = update.amount {
            model.amount = Set(amount);
        }
        if let Some(description) = update.description {
            model.description = Set(description);
        }
        if let Some(date) = update.date {
            model.date = Set(date);
        }
        if let Some(tx_type) = update.tx_type {
            model.tx_type = Set(tx_type.into());
        }
        if let Some(is_recurring) = update.is_recurring {
            model.is_recurring = Set(is_recurring);
        }
        model.updated_at = Set(Utc::now().into());

        let row = model.update(&txn).await?;
        let new_projection = to_projection(&row);

        let change = ChangeDescriptor::Update { tx_id: id, old: old_projection, new: new_projection };
        let targets = TargetPlanner::targets_for_change(tenant.tenant_id(), &change);
        regenerate_targets(&txn, tenant, targets).await?;

        txn.commit().await?;
        Ok(to_core_transaction(row))
    }

    /// Deletes a posting and regenerates the cube cells it affected inside
    /// the same transaction.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`/`CrossTenant` if the transaction does not belong
    /// to this tenant, or an error if the delete or cube regeneration
    /// fails.
    pub async fn delete_transaction(&self, tenant: &TenantCtx, id: TransactionId) -> Result<(), RepoError> {
        let txn = self.db.begin().await?;

        let row = find_transaction_row(&txn, tenant, id).await?;
        let old_projection = to_projection(&row);

        let model: transactions::ActiveModel = row.into();
        model.delete(&txn).await?;

        let change = ChangeDescriptor::Delete { tx_id: id, old: old_projection };
        let targets = TargetPlanner::targets_for_change(tenant.tenant_id(), &change);
        regenerate_targets(&txn, tenant, targets).await?;

        txn.commit().await?;
        Ok(())
    }

    /// Bulk-updates a single field across many postings (section 4.3.3's
    /// fast path, scenarios S1/S6): validates the affected rows' old values
    /// for the changed field are uniform, applies one `UPDATE` statement,
    /// then regenerates exactly the cells the cross product of distinct
    /// dimension combos x overlapping periods names, all inside one
    /// transaction.
    ///
    /// # Errors
    ///
    /// Returns `NonUniformBulk` if the affected rows' old values for the
    /// changed field are not all equal, `NotFound` if any `id` does not
    /// belong to this tenant, or an error if the update or cube
    /// regeneration fails.
    pub async fn bulk_update_transactions(
        &self,
        tenant: &TenantCtx,
        ids: &[TransactionId],
        change: BulkFieldChange,
    ) -> Result<BulkOutcome, RepoError> {
        let txn = self.db.begin().await?;

        let uuids: Vec<uuid::Uuid> = ids.iter().map(|id| id.into_inner()).collect();
        let rows = transactions::Entity::find()
            .filter(transactions::Column::TenantId.eq(tenant.tenant_id().as_str()))
            .filter(transactions::Column::Id.is_in(uuids.clone()))
            .all(&txn)
            .await?;
        if rows.len() != ids.len() {
            return Err(RepoError::NotFound("one or more transactions in bulk update".to_string()));
        }

        validate_bulk_precondition(&change, &rows)?;

        let distinct_dimension_combos = distinct_combos(&rows);
        let min_date = rows.iter().map(|r| r.date).min().unwrap_or_default();
        let max_date = rows.iter().map(|r| r.date).max().unwrap_or_default();

        let mut update = transactions::Entity::update_many()
            .filter(transactions::Column::TenantId.eq(tenant.tenant_id().as_str()))
            .filter(transactions::Column::Id.is_in(uuids));
        update = apply_bulk_field(update, &change);
        update = update.col_expr(transactions::Column::UpdatedAt, sea_orm::sea_query::Expr::value(Utc::now()));
        let result = update.exec(&txn).await?;

        let bulk = BulkChangeDescriptor {
            tx_ids: ids.to_vec(),
            change,
            min_date,
            max_date,
            distinct_dimension_combos,
        };
        let targets = TargetPlanner::targets_for_bulk(tenant.tenant_id(), &bulk);
        regenerate_targets(&txn, tenant, targets).await?;

        txn.commit().await?;
        Ok(BulkOutcome { affected_count: result.rows_affected })
    }

    /// Bulk-deletes many postings, regenerating the cells their combined
    /// set of old projections names, all inside one transaction.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if any `id` does not belong to this tenant, or an
    /// error if the delete or cube regeneration fails.
    pub async fn bulk_delete_transactions(
        &self,
        tenant: &TenantCtx,
        ids: &[TransactionId],
    ) -> Result<BulkOutcome, RepoError> {
        let txn = self.db.begin().await?;

        let uuids: Vec<uuid::Uuid> = ids.iter().map(|id| id.into_inner()).collect();
        let rows = transactions::Entity::find()
            .filter(transactions::Column::TenantId.eq(tenant.tenant_id().as_str()))
            .filter(transactions::Column::Id.is_in(uuids.clone()))
            .all(&txn)
            .await?;
        if rows.len() != ids.len() {
            return Err(RepoError::NotFound("one or more transactions in bulk delete".to_string()));
        }

        let old_projections: Vec<ChangeProjection> = rows.iter().map(to_projection).collect();

        let result = transactions::Entity::delete_many()
            .filter(transactions::Column::TenantId.eq(tenant.tenant_id().as_str()))
            .filter(transactions::Column::Id.is_in(uuids))
            .exec(&txn)
            .await?;

        let targets = TargetPlanner::targets_for_bulk_delete(tenant.tenant_id(), &old_projections);
        regenerate_targets(&txn, tenant, targets).await?;

        txn.commit().await?;
        Ok(BulkOutcome { affected_count: result.rows_affected })
    }
}

fn validate_bulk_precondition(change: &BulkFieldChange, rows: &[transactions::Model]) -> Result<(), RepoError> {
    match change {
        BulkFieldChange::CategoryId { .. } => {
            let old_values: Vec<Option<uuid::Uuid>> = rows.iter().map(|r| r.category_id).collect();
            LedgerService::validate_bulk_precondition(ChangedField::CategoryId, &old_values)?;
        }
        BulkFieldChange::AccountId { .. } => {
            let old_values: Vec<uuid::Uuid> = rows.iter().map(|r| r.account_id).collect();
            LedgerService::validate_bulk_precondition(ChangedField::AccountId, &old_values)?;
        }
        BulkFieldChange::Type { .. } => {
            let old_values: Vec<FlowType> = rows.iter().map(|r| FlowType::from(r.tx_type)).collect();
            LedgerService::validate_bulk_precondition(ChangedField::Type, &old_values)?;
        }
        BulkFieldChange::Amount { .. } => {
            let old_values: Vec<rust_decimal::Decimal> = rows.iter().map(|r| r.amount).collect();
            LedgerService::validate_bulk_precondition(ChangedField::Amount, &old_values)?;
        }
        BulkFieldChange::IsRecurring { .. } => {
            let old_values: Vec<bool> = rows.iter().map(|r| r.is_recurring).collect();
            LedgerService::validate_bulk_precondition(ChangedField::IsRecurring, &old_values)?;
        }
    }
    Ok(())
}

fn distinct_combos(rows: &[transactions::Model]) -> Vec<DimensionCombo> {
    let mut combos: Vec<DimensionCombo> = Vec::new();
    for row in rows {
        let combo = DimensionCombo {
            tx_type: FlowType::from(row.tx_type),
            category_id: row.category_id.map(CategoryId::from_uuid),
            account_id: AccountId::from_uuid(row.account_id),
            is_recurring: row.is_recurring,
        };
        if !combos.contains(&combo) {
            combos.push(combo);
        }
    }
    combos
}

fn apply_bulk_field(
    update: sea_orm::UpdateMany<transactions::Entity>,
    change: &BulkFieldChange,
) -> sea_orm::UpdateMany<transactions::Entity> {
    match change {
        BulkFieldChange::CategoryId { new, .. } => update.col_expr(
            transactions::Column::CategoryId,
            sea_orm::sea_query::Expr::value(new.map(CategoryId::into_inner)),
        ),
        BulkFieldChange::AccountId { new, .. } => {
            update.col_expr(transactions::Column::AccountId, sea_orm::sea_query::Expr::value(new.into_inner()))
        }
        BulkFieldChange::Type { new, .. } => update.col_expr(
            transactions::Column::TxType,
            sea_orm::sea_query::Expr::value(crate::entities::sea_orm_active_enums::FlowType::from(*new)),
        ),
        BulkFieldChange::Amount { new, .. } => {
            update.col_expr(transactions::Column::Amount, sea_orm::sea_query::Expr::value(*new))
        }
        BulkFieldChange::IsRecurring { new, .. } => {
            update.col_expr(transactions::Column::IsRecurring, sea_orm::sea_query::Expr::value(*new))
        }
    }
}

pub(crate) async fn find_transaction_row(
    conn: &impl ConnectionTrait,
    tenant: &TenantCtx,
    id: TransactionId,
) -> Result<transactions::Model, RepoError> {
    let row = transactions::Entity::find_by_id(id.into_inner()).one(conn).await?;
    match row {
        Some(row) if row.tenant_id == tenant.tenant_id().as_str() => Ok(row),
        Some(_) => Err(RepoError::CrossTenant(format!("transaction {id}"))),
        None => Err(RepoError::NotFound(format!("transaction {id}"))),
    }
}

async fn load_account_names(
    conn: &impl ConnectionTrait,
    tenant: &TenantCtx,
) -> Result<std::collections::HashMap<uuid::Uuid, String>, RepoError> {
    let rows = accounts::Entity::find()
        .filter(accounts::Column::TenantId.eq(tenant.tenant_id().as_str()))
        .all(conn)
        .await?;
    Ok(rows.into_iter().map(|row| (row.id, row.name)).collect())
}

async fn load_category_names(
    conn: &impl ConnectionTrait,
    tenant: &TenantCtx,
) -> Result<std::collections::HashMap<uuid::Uuid, String>, RepoError> {
    let rows = categories::Entity::find()
        .filter(categories::Column::TenantId.eq(tenant.tenant_id().as_str()))
        .all(conn)
        .await?;
    Ok(rows.into_iter().map(|row| (row.id, row.name)).collect())
}

fn to_projection(row: &transactions::Model) -> ChangeProjection {
    ChangeProjection {
        account_id: AccountId::from_uuid(row.account_id),
        category_id: row.category_id.map(CategoryId::from_uuid),
        amount: row.amount,
        date: row.date,
        tx_type: FlowType::from(row.tx_type),
        is_recurring: row.is_recurring,
    }
}

fn to_core_transaction(row: transactions::Model) -> Transaction {
    Transaction {
        id: TransactionId::from_uuid(row.id),
        account_id: AccountId::from_uuid(row.account_id),
        category_id: row.category_id.map(CategoryId::from_uuid),
        amount: row.amount,
        description: row.description,
        date: row.date,
        tx_type: FlowType::from(row.tx_type),
        is_recurring: row.is_recurring,
    }
}

fn to_core_with_names(
    row: transactions::Model,
    account_names: &std::collections::HashMap<uuid::Uuid, String>,
    category_names: &std::collections::HashMap<uuid::Uuid, String>,
) -> TransactionWithNames {
    let account_name = account_names.get(&row.account_id).cloned().unwrap_or_default();
    let category_name = row.category_id.and_then(|id| category_names.get(&id).cloned());
    TransactionWithNames { transaction: to_core_transaction(row), account_name, category_name }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(
        account: uuid::Uuid,
        category: Option<uuid::Uuid>,
        tx_type: crate::entities::sea_orm_active_enums::FlowType,
        is_recurring: bool,
    ) -> transactions::Model {
        transactions::Model {
            id: uuid::Uuid::now_v7(),
            tenant_id: "t1".to_string(),
            account_id: account,
            category_id: category,
            amount: rust_decimal::Decimal::new(1000, 2),
            description: "x".to_string(),
            date: chrono::NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            tx_type,
            is_recurring,
            created_at: chrono::Utc::now().into(),
            updated_at: chrono::Utc::now().into(),
        }
    }

    /// Scenario S1: 100 affected postings spread across 3 accounts and both
    /// recurring flags collapse to exactly 3 distinct dimension combos (the
    /// test here uses a smaller representative set).
    #[test]
    fn test_distinct_combos_dedupes_by_full_tuple() {
        let a1 = uuid::Uuid::now_v7();
        let a2 = uuid::Uuid::now_v7();
        let expense = crate::entities::sea_orm_active_enums::FlowType::Expense;
        let rows = vec![
            row(a1, None, expense, false),
            row(a1, None, expense, false),
            row(a1, None, expense, true),
            row(a2, None, expense, false),
        ];
        let combos = distinct_combos(&rows);
        assert_eq!(combos.len(), 3);
    }

    /// Scenario S6: non-uniform old category values are rejected before any
    /// write happens.
    #[test]
    fn test_validate_bulk_precondition_rejects_non_uniform_categories() {
        let a1 = uuid::Uuid::now_v7();
        let c1 = uuid::Uuid::now_v7();
        let c2 = uuid::Uuid::now_v7();
        let expense = crate::entities::sea_orm_active_enums::FlowType::Expense;
        let rows = vec![row(a1, Some(c1), expense, false), row(a1, Some(c2), expense, false)];
        let change = BulkFieldChange::CategoryId { old: None, new: None };
        let result = validate_bulk_precondition(&change, &rows);
        assert!(result.is_err());
    }
}
