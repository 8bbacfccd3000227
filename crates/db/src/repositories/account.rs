//! Account repository: CRUD plus reconciliation (section 4.1).

use chrono::Utc;
use ledgercube_core::balance::{AnchorRef, BalanceEngine, Posting};
use ledgercube_core::cube::TargetPlanner;
use ledgercube_core::ledger::{
    Account, AccountFilter, AccountType, AccountUpdate, ChangeDescriptor, ChangeProjection, FlowType, LedgerService,
    NetWorthCategory, NewAccount, NewTransaction,
};
use ledgercube_shared::{AccountId, BalanceAnchorId, TenantCtx, TransactionId};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};

use crate::entities::{accounts, balance_anchors, transactions};
use crate::error::RepoError;
use crate::repositories::cube::regenerate_targets;

/// The outcome of `reconcile_account` (section 4.1/4.2.1/S5).
#[derive(Debug, Clone)]
pub struct ReconcileOutcome {
    pub account: Account,
    pub adjustment_transaction: Option<ledgercube_core::ledger::Transaction>,
}

/// Repository for accounts, including the reconciliation workflow that
/// touches balance anchors, adjustment postings, and the cube in one
/// transaction.
#[derive(Debug, Clone)]
pub struct AccountRepository {
    db: DatabaseConnection,
}

impl AccountRepository {
    /// Creates a new account repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists accounts for a tenant (section 4.1.1): ordered `(name ASC)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_accounts(&self, tenant: &TenantCtx, filter: &AccountFilter) -> Result<Vec<Account>, RepoError> {
        let mut query = accounts::Entity::find().filter(accounts::Column::TenantId.eq(tenant.tenant_id().as_str()));

        if let Some(account_type) = filter.account_type {
            query = query.filter(
                accounts::Column::AccountType.eq(crate::entities::sea_orm_active_enums::AccountType::from(account_type)),
            );
        }
        if let Some(is_active) = filter.is_active {
            query = query.filter(accounts::Column::IsActive.eq(is_active));
        }
        if let Some(search) = &filter.search {
            query = query.filter(accounts::Column::Name.contains(search));
        }

        let rows = query.order_by_asc(accounts::Column::Name).all(&self.db).await?;
        Ok(rows.into_iter().map(to_core_account).collect())
    }

    /// Fetches a single account scoped to the tenant.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no such account exists for this tenant, or an
    /// error if the query fails.
    pub async fn get_account(&self, tenant: &TenantCtx, id: AccountId) -> Result<Account, RepoError> {
        let row = self.find_row(tenant, id).await?;
        Ok(to_core_account(row))
    }

    async fn find_row(&self, tenant: &TenantCtx, id: AccountId) -> Result<accounts::Model, RepoError> {
        find_account_row(&self.db, tenant, id).await
    }

    /// Creates a new account, rejecting a name collision with another active
    /// account in the same tenant.
    ///
    /// # Errors
    ///
    /// Returns `UniqueViolation` on a name collision, or an error if the
    /// insert fails.
    pub async fn create_account(&self, tenant: &TenantCtx, new: NewAccount) -> Result<Account, RepoError> {
        let existing = accounts::Entity::find()
            .filter(accounts::Column::TenantId.eq(tenant.tenant_id().as_str()))
            .filter(accounts::Column::IsActive.eq(true))
            .all(&self.db)
            .await?;
        let existing_names: Vec<&str> = existing.iter().map(|a| a.name.as_str()).collect();
        LedgerService::validate_unique_account_name(&existing_names, &new.name)?;

        let net_worth_category = LedgerService::resolve_net_worth_category(new.account_type, new.net_worth_category);
        let id = AccountId::new();
        let model = accounts::ActiveModel {
            id: Set(id.into_inner()),
            tenant_id: Set(tenant.tenant_id().as_str().to_string()),
            name: Set(new.name),
            account_type: Set(new.account_type.into()),
            net_worth_category: Set(net_worth_category.into()),
            balance: Set(new.balance),
            balance_date: Set(new.balance_date),
            color: Set(new.color),
            is_active: Set(new.is_active),
        };
        let row = model.insert(&self.db).await?;
        Ok(to_core_account(row))
    }

    /// Applies a partial update to an account.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`/`CrossTenant` if the account does not belong to
    /// this tenant, `UniqueViolation` on a name collision, or an error if
    /// the update fails.
    pub async fn update_account(
        &self,
        tenant: &TenantCtx,
        id: AccountId,
        update: AccountUpdate,
    ) -> Result<Account, RepoError> {
        let row = self.find_row(tenant, id).await?;

        if let Some(name) = &update.name {
            if name != &row.name {
                let existing = accounts::Entity::find()
                    .filter(accounts::Column::TenantId.eq(tenant.tenant_id().as_str()))
                    .filter(accounts::Column::IsActive.eq(true))
                    .filter(accounts::Column::Id.ne(row.id))
                    .all(&self.db)
                    .await?;
                let existing_names: Vec<&str> = existing.iter().map(|a| a.name.as_str()).collect();
                LedgerService::validate_unique_account_name(&existing_names, name)?;
            }
        }

        let mut model: accounts::ActiveModel = row.into();
        if let Some(name) = update.name {
            model.name = Set(name);
        }
        if let Some(account_type) = update.account_type {
            model.account_type = Set(account_type.into());
        }
        if let Some(net_worth_category) = update.net_worth_category {
            model.net_worth_category = Set(net_worth_category.into());
        }
        if let Some(balance) = update.balance {
            model.balance = Set(balance);
        }
        if let Some(balance_date) = update.balance_date {
            model.balance_date = Set(balance_date);
        }
        if let Some(color) = update.color {
            model.color = Set(color);
        }
        if let Some(is_active) = update.is_active {
            model.is_active = Set(is_active);
        }

        let row = model.update(&self.db).await?;
        Ok(to_core_account(row))
    }

    /// Deletes an account, refusing when postings still reference it.
    ///
    /// # Errors
    ///
    /// Returns `Conflict` if referencing transactions exist, `NotFound`/
    /// `CrossTenant` if the account is not this tenant's, or an error if the
    /// delete fails.
    pub async fn delete_account(&self, tenant: &TenantCtx, id: AccountId) -> Result<(), RepoError> {
        let row = self.find_row(tenant, id).await?;

        let referencing = transactions::Entity::find()
            .filter(transactions::Column::AccountId.eq(row.id))
            .filter(transactions::Column::TenantId.eq(tenant.tenant_id().as_str()))
            .one(&self.db)
            .await?;
        if referencing.is_some() {
            return Err(RepoError::Conflict(format!("account {id} still has transactions")));
        }

        let model: accounts::ActiveModel = row.into();
        model.delete(&self.db).await?;
        Ok(())
    }

    /// Reconciles an account to `new_balance` as of `reconcile_date`
    /// (section 4.1/4.2.1/S5): writes a balance anchor, synthesizes a single
    /// adjustment posting when the discrepancy exceeds the epsilon, updates
    /// the cached balance, and regenerates the cube cells the adjustment
    /// affects, all inside one transaction.
    ///
    /// # Errors
    ///
    /// Returns `FutureReconcileDate` if `reconcile_date` is after today, or
    /// an error if any step fails.
    pub async fn reconcile_account(
        &self,
        tenant: &TenantCtx,
        id: AccountId,
        new_balance: Decimal,
        reconcile_date: chrono::NaiveDate,
        adjustment_type: Option<FlowType>,
    ) -> Result<ReconcileOutcome, RepoError> {
        LedgerService::validate_reconcile_date(reconcile_date, Utc::now().date_naive())?;

        let txn = self.db.begin().await?;

        let account_row = find_account_row(&txn, tenant, id).await?;

        let postings = load_postings(&txn, tenant, id).await?;
        let anchors = load_anchors(&txn, tenant, id).await?;
        let current = BalanceEngine::balance_at(&postings, &anchors, reconcile_date);
        let plan = LedgerService::plan_reconciliation(current.balance, new_balance, reconcile_date, adjustment_type);

        let anchor_id = BalanceAnchorId::new();
        let anchor_model = balance_anchors::ActiveModel {
            id: Set(anchor_id.into_inner()),
            tenant_id: Set(tenant.tenant_id().as_str().to_string()),
            account_id: Set(id.into_inner()),
            anchor_date: Set(plan.anchor_date),
            balance: Set(plan.anchor_balance),
            description: Set(Some("reconciliation".to_string())),
        };
        anchor_model.insert(&txn).await?;

        let mut adjustment_transaction = None;
        if let Some(adjustment) = &plan.adjustment {
            let new_tx = NewTransaction {
                account_id: id,
                category_id: None,
                amount: adjustment.amount,
                description: "Balance reconciliation adjustment".to_string(),
                date: adjustment.date,
                tx_type: adjustment.tx_type,
                is_recurring: false,
            };
            let tx_id = TransactionId::new();
            let now = Utc::now();
            let tx_model = transactions::ActiveModel {
                id: Set(tx_id.into_inner()),
                tenant_id: Set(tenant.tenant_id().as_str().to_string()),
                account_id: Set(new_tx.account_id.into_inner()),
                category_id: Set(None),
                amount: Set(new_tx.amount),
                description: Set(new_tx.description.clone()),
                date: Set(new_tx.date),
                tx_type: Set(new_tx.tx_type.into()),
                is_recurring: Set(new_tx.is_recurring),
                created_at: Set(now.into()),
                updated_at: Set(now.into()),
            };
            tx_model.insert(&txn).await?;

            let projection = ChangeProjection {
                account_id: new_tx.account_id,
                category_id: new_tx.category_id,
                amount: new_tx.amount,
                date: new_tx.date,
                tx_type: new_tx.tx_type,
                is_recurring: new_tx.is_recurring,
            };
            let change = ChangeDescriptor::Insert { tx_id, new: projection };
            let targets = TargetPlanner::targets_for_change(tenant.tenant_id(), &change);
            regenerate_targets(&txn, tenant, targets).await?;

            adjustment_transaction = Some(ledgercube_core::ledger::Transaction {
                id: tx_id,
                account_id: new_tx.account_id,
                category_id: new_tx.category_id,
                amount: new_tx.amount,
                description: new_tx.description,
                date: new_tx.date,
                tx_type: new_tx.tx_type,
                is_recurring: new_tx.is_recurring,
            });
        }

        let mut account_model: accounts::ActiveModel = account_row.into();
        account_model.balance = Set(plan.anchor_balance);
        account_model.balance_date = Set(plan.anchor_date);
        let account_row = account_model.update(&txn).await?;

        txn.commit().await?;

        Ok(ReconcileOutcome {
            account: to_core_account(account_row),
            adjustment_transaction,
        })
    }
}

pub(crate) async fn find_account_row(
    conn: &impl ConnectionTrait,
    tenant: &TenantCtx,
    id: AccountId,
) -> Result<accounts::Model, RepoError> {
    let row = accounts::Entity::find_by_id(id.into_inner()).one(conn).await?;
    match row {
        Some(row) if row.tenant_id == tenant.tenant_id().as_str() => Ok(row),
        Some(_) => Err(RepoError::CrossTenant(format!("account {id}"))),
        None => Err(RepoError::NotFound(format!("account {id}"))),
    }
}

pub(crate) async fn load_postings(
    conn: &impl ConnectionTrait,
    tenant: &TenantCtx,
    account_id: AccountId,
) -> Result<Vec<Posting>, RepoError> {
    let rows = transactions::Entity::find()
        .filter(transactions::Column::TenantId.eq(tenant.tenant_id().as_str()))
        .filter(transactions::Column::AccountId.eq(account_id.into_inner()))
        .all(conn)
        .await?;
    Ok(rows
        .into_iter()
        .map(|row| Posting {
            id: TransactionId::from_uuid(row.id),
            date: row.date,
            description: row.description,
            amount: row.amount,
        })
        .collect())
}

pub(crate) async fn load_anchors(
    conn: &impl ConnectionTrait,
    tenant: &TenantCtx,
    account_id: AccountId,
) -> Result<Vec<AnchorRef>, RepoError> {
    let rows = balance_anchors::Entity::find()
        .filter(balance_anchors::Column::TenantId.eq(tenant.tenant_id().as_str()))
        .filter(balance_anchors::Column::AccountId.eq(account_id.into_inner()))
        .all(conn)
        .await?;
    Ok(rows
        .into_iter()
        .map(|row| AnchorRef {
            id: BalanceAnchorId::from_uuid(row.id),
            anchor_date: row.anchor_date,
            balance: row.balance,
        })
        .collect())
}

fn to_core_account(row: accounts::Model) -> Account {
    Account {
        id: AccountId::from_uuid(row.id),
        name: row.name,
        account_type: AccountType::from(row.account_type),
        net_worth_category: NetWorthCategory::from(row.net_worth_category),
        balance: row.balance,
        balance_date: row.balance_date,
        color: row.color,
        is_active: row.is_active,
    }
}
