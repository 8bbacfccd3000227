//! Cube maintenance repository (C3): regeneration, backfill, consistency
//! checking, and the read-only trend/aggregate query surface (section 4.3).

use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use ledgercube_core::cube::{
    AggregateGroupKey, AggregateRow, BackfillOptions, BackfillResult, ConsistencyChecker, CubeCell, CubeDimension,
    CubeDimensionKey, CubeStatistics, Period, PeriodType, RegenerationTarget, TargetPlanner, TrendFilter,
};
use ledgercube_core::ledger::{BulkChangeDescriptor, ChangeDescriptor, ChangeProjection, FlowType};
use ledgercube_shared::{AccountId, CategoryId, TenantCtx};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::entities::{accounts, categories, financial_cube, transactions};
use crate::error::RepoError;

/// What `apply_changes` was asked to recompute the cube for.
#[derive(Debug, Clone)]
pub enum CubeChange {
    Single(ChangeDescriptor),
    Bulk(BulkChangeDescriptor),
    BulkDelete(Vec<ChangeProjection>),
}

/// Repository for the pre-aggregated dimensional cube.
#[derive(Debug, Clone)]
pub struct CubeRepository {
    db: DatabaseConnection,
}

impl CubeRepository {
    /// Creates a new cube repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Recomputes every cube cell a ledger change may have affected, in its
    /// own transaction. Callers that already hold a transaction (C1
    /// mutations) call [`regenerate_targets`] directly instead, so the
    /// ledger write and the cube update commit or roll back together.
    ///
    /// # Errors
    ///
    /// Returns an error if the regeneration fails.
    pub async fn apply_changes(&self, tenant: &TenantCtx, change: CubeChange) -> Result<(), RepoError> {
        let targets = match change {
            CubeChange::Single(descriptor) => TargetPlanner::targets_for_change(tenant.tenant_id(), &descriptor),
            CubeChange::Bulk(bulk) => TargetPlanner::targets_for_bulk(tenant.tenant_id(), &bulk),
            CubeChange::BulkDelete(projections) => {
                TargetPlanner::targets_for_bulk_delete(tenant.tenant_id(), &projections)
            }
        };
        let txn = self.db.begin().await?;
        regenerate_targets(&txn, tenant, targets).await?;
        txn.commit().await?;
        Ok(())
    }

    /// Backfills the cube over `[options.start, options.end]` (section
    /// 4.3.4): every weekly and monthly period in range is fully
    /// recomputed, in batches with a small inter-batch pause. A per-period
    /// failure is logged and skipped, not propagated.
    ///
    /// # Errors
    ///
    /// Returns an error only if listing periods or the initial clear fails;
    /// per-period regeneration failures are swallowed (logged instead).
    pub async fn populate_historical(
        &self,
        tenant: &TenantCtx,
        options: &BackfillOptions,
    ) -> Result<BackfillResult, RepoError> {
        let start_instant = std::time::Instant::now();
        let periods = TargetPlanner::periods_overlapping(options.start, options.end);

        if options.clear_existing {
            let mut query = financial_cube::Entity::delete_many()
                .filter(financial_cube::Column::TenantId.eq(tenant.tenant_id().as_str()))
                .filter(financial_cube::Column::PeriodStart.gte(options.start))
                .filter(financial_cube::Column::PeriodStart.lte(options.end));
            if let Some(account_id) = options.account_id {
                query = query.filter(financial_cube::Column::AccountId.eq(account_id.into_inner()));
            }
            query.exec(&self.db).await?;
        }

        let batch_size = if options.batch_size == 0 { periods.len().max(1) } else { options.batch_size };
        let batches = ConsistencyChecker::batches(&periods, batch_size);

        let mut periods_processed = 0usize;
        let mut periods_skipped = 0usize;
        let mut cells_created = 0usize;

        for batch in batches {
            for period in batch {
                match self.regenerate_period(tenant, period, options.account_id).await {
                    Ok(created) => {
                        periods_processed += 1;
                        cells_created += created;
                    }
                    Err(err) => {
                        periods_skipped += 1;
                        tracing::warn!(
                            tenant = %tenant.tenant_id(),
                            period_start = %period.start,
                            error = %err,
                            "skipping period during historical backfill"
                        );
                    }
                }
            }
            tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        }

        Ok(BackfillResult {
            periods_processed,
            periods_skipped,
            cells_created,
            elapsed_ms: u64::try_from(start_instant.elapsed().as_millis()).unwrap_or(u64::MAX),
        })
    }

    async fn regenerate_period(
        &self,
        tenant: &TenantCtx,
        period: &Period,
        account_id: Option<AccountId>,
    ) -> Result<usize, RepoError> {
        let txn = self.db.begin().await?;

        let mut delete = financial_cube::Entity::delete_many()
            .filter(financial_cube::Column::TenantId.eq(tenant.tenant_id().as_str()))
            .filter(financial_cube::Column::PeriodType.eq(db_period_type(period.period_type)))
            .filter(financial_cube::Column::PeriodStart.eq(period.start));
        if let Some(account_id) = account_id {
            delete = delete.filter(financial_cube::Column::AccountId.eq(account_id.into_inner()));
        }
        delete.exec(&txn).await?;

        let cells = aggregate_period(&txn, tenant, period.start, period.end, account_id).await?;
        let mut created = 0usize;
        for cell in &cells {
            insert_cell(&txn, tenant, period, cell).await?;
            created += 1;
        }

        txn.commit().await?;
        Ok(created)
    }

    /// Deletes every cube cell belonging to this tenant.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub async fn clear_all(&self, tenant: &TenantCtx) -> Result<u64, RepoError> {
        let result = financial_cube::Entity::delete_many()
            .filter(financial_cube::Column::TenantId.eq(tenant.tenant_id().as_str()))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected)
    }

    /// Read-only cube statistics (section 4.3).
    ///
    /// # Errors
    ///
    /// Returns an error if any of the underlying queries fail.
    pub async fn statistics(&self, tenant: &TenantCtx) -> Result<CubeStatistics, RepoError> {
        let rows = financial_cube::Entity::find()
            .filter(financial_cube::Column::TenantId.eq(tenant.tenant_id().as_str()))
            .all(&self.db)
            .await?;

        let mut stats = CubeStatistics {
            total_cells: i64::try_from(rows.len()).unwrap_or(i64::MAX),
            ..CubeStatistics::default()
        };
        let mut accounts_seen: Vec<Uuid> = Vec::new();
        let mut categories_seen: Vec<Uuid> = Vec::new();

        for row in &rows {
            match row.period_type {
                crate::entities::sea_orm_active_enums::PeriodType::Weekly => stats.weekly_cells += 1,
                crate::entities::sea_orm_active_enums::PeriodType::Monthly => stats.monthly_cells += 1,
            }
            stats.earliest_period_start = Some(stats.earliest_period_start.map_or(row.period_start, |d| d.min(row.period_start)));
            stats.latest_period_end = Some(stats.latest_period_end.map_or(row.period_end, |d| d.max(row.period_end)));
            if !accounts_seen.contains(&row.account_id) {
                accounts_seen.push(row.account_id);
            }
            if let Some(category_id) = row.category_id {
                if !categories_seen.contains(&category_id) {
                    categories_seen.push(category_id);
                }
            }
            let updated_at: chrono::DateTime<Utc> = row.updated_at.into();
            stats.last_updated = Some(stats.last_updated.map_or(updated_at, |d| d.max(updated_at)));
        }

        stats.distinct_accounts = i64::try_from(accounts_seen.len()).unwrap_or(i64::MAX);
        stats.distinct_categories = i64::try_from(categories_seen.len()).unwrap_or(i64::MAX);
        Ok(stats)
    }

    /// Returns raw cube cells matching `filters`, sorted by `(period_start,
    /// transaction_type, category_name, account_name)` (section 4.3.6).
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn get_trends(&self, tenant: &TenantCtx, filters: &TrendFilter) -> Result<Vec<CubeCell>, RepoError> {
        let rows = self.filtered_rows(tenant, filters).await?;
        let mut cells: Vec<CubeCell> = rows.into_iter().map(|row| to_core_cell(tenant, row)).collect();
        cells.sort_by(|a, b| {
            a.key
                .period_start
                .cmp(&b.key.period_start)
                .then_with(|| flow_type_rank(a.key.transaction_type).cmp(&flow_type_rank(b.key.transaction_type)))
                .then_with(|| a.category_name.cmp(&b.category_name))
                .then_with(|| a.account_name.cmp(&b.account_name))
        });
        Ok(cells)
    }

    /// Aggregates cube cells by any subset of the dimensions (section
    /// 4.3.6).
    ///
    /// # Errors
    ///
    /// Returns an error if `group_by` is empty or the underlying query
    /// fails.
    pub async fn get_aggregated_totals(
        &self,
        tenant: &TenantCtx,
        group_by: &[CubeDimension],
        filters: &TrendFilter,
    ) -> Result<Vec<AggregateRow>, RepoError> {
        if group_by.is_empty() {
            return Err(RepoError::Cube(ledgercube_core::cube::CubeError::EmptyGroupBy));
        }

        let cells = self.get_trends(tenant, filters).await?;
        let mut groups: HashMap<AggregateGroupKey, (Decimal, i64)> = HashMap::new();
        for cell in cells {
            let key = group_key(&cell, group_by);
            let entry = groups.entry(key).or_insert((Decimal::ZERO, 0));
            entry.0 += cell.total_amount;
            entry.1 += cell.transaction_count;
        }

        Ok(groups
            .into_iter()
            .map(|(key, (total_amount, transaction_count))| AggregateRow { key, total_amount, transaction_count })
            .collect())
    }

    /// Category-over-time: total/count per `(period_start, category_id)`
    /// (section 4.3.6), a thin composition of [`Self::get_aggregated_totals`].
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying query fails.
    pub async fn category_over_time(&self, tenant: &TenantCtx, filters: &TrendFilter) -> Result<Vec<AggregateRow>, RepoError> {
        self.get_aggregated_totals(tenant, ledgercube_core::cube::CATEGORY_OVER_TIME_GROUP_BY, filters).await
    }

    /// Account-over-time: total/count per `(period_start, account_id)`
    /// (section 4.3.6), a thin composition of [`Self::get_aggregated_totals`].
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying query fails.
    pub async fn account_over_time(&self, tenant: &TenantCtx, filters: &TrendFilter) -> Result<Vec<AggregateRow>, RepoError> {
        self.get_aggregated_totals(tenant, ledgercube_core::cube::ACCOUNT_OVER_TIME_GROUP_BY, filters).await
    }

    /// Income-vs-expense: total/count per `(period_start, transaction_type)`
    /// (section 4.3.6), a thin composition of [`Self::get_aggregated_totals`].
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying query fails.
    pub async fn income_vs_expense(&self, tenant: &TenantCtx, filters: &TrendFilter) -> Result<Vec<AggregateRow>, RepoError> {
        self.get_aggregated_totals(tenant, ledgercube_core::cube::INCOME_VS_EXPENSE_GROUP_BY, filters).await
    }

    /// Validates that the cube's totals agree with the ledger's, per period
    /// type, to within the epsilon (section 4.3.5).
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying queries fail.
    pub async fn validate_consistency(&self, tenant: &TenantCtx) -> Result<bool, RepoError> {
        let ledger_sum = self.ledger_sum(tenant).await?;
        for period_type in [PeriodType::Weekly, PeriodType::Monthly] {
            let cube_sum = self.cube_sum_for_period_type(tenant, period_type).await?;
            if !ConsistencyChecker::is_consistent(cube_sum, ledger_sum) {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Rebuilds the cube from scratch over the tenant's full transaction
    /// date range when [`Self::validate_consistency`] finds a disagreement
    /// (section 4.3.5).
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying queries fail.
    pub async fn reconcile(&self, tenant: &TenantCtx) -> Result<(), RepoError> {
        if self.validate_consistency(tenant).await? {
            return Ok(());
        }
        let Some((start, end)) = self.transaction_date_range(tenant).await? else {
            return Ok(());
        };
        let options = BackfillOptions { start, end, clear_existing: true, batch_size: 100, account_id: None };
        self.populate_historical(tenant, &options).await?;
        Ok(())
    }

    async fn filtered_rows(&self, tenant: &TenantCtx, filters: &TrendFilter) -> Result<Vec<financial_cube::Model>, RepoError> {
        let mut query = financial_cube::Entity::find().filter(financial_cube::Column::TenantId.eq(tenant.tenant_id().as_str()));

        if let Some(period_type) = filters.period_type {
            query = query.filter(financial_cube::Column::PeriodType.eq(db_period_type(period_type)));
        }
        if let Some((start, end)) = filters.date_range {
            query = query.filter(financial_cube::Column::PeriodStart.gte(start)).filter(financial_cube::Column::PeriodStart.lte(end));
        }
        if let Some(tx_type) = filters.transaction_type {
            query = query.filter(financial_cube::Column::TransactionType.eq(db_flow_type(tx_type)));
        }
        if let Some(category_ids) = &filters.category_ids {
            let ids: Vec<Uuid> = category_ids.iter().map(|id| id.into_inner()).collect();
            query = query.filter(financial_cube::Column::CategoryId.is_in(ids));
        }
        if let Some(account_ids) = &filters.account_ids {
            let ids: Vec<Uuid> = account_ids.iter().map(|id| id.into_inner()).collect();
            query = query.filter(financial_cube::Column::AccountId.is_in(ids));
        }
        if let Some(is_recurring) = filters.is_recurring {
            query = query.filter(financial_cube::Column::IsRecurring.eq(is_recurring));
        }

        Ok(query.all(&self.db).await?)
    }

    async fn ledger_sum(&self, tenant: &TenantCtx) -> Result<Decimal, RepoError> {
        let rows = transactions::Entity::find()
            .filter(transactions::Column::TenantId.eq(tenant.tenant_id().as_str()))
            .all(&self.db)
            .await?;
        Ok(rows.iter().map(|r| r.amount).sum())
    }

    async fn cube_sum_for_period_type(&self, tenant: &TenantCtx, period_type: PeriodType) -> Result<Decimal, RepoError> {
        let rows = financial_cube::Entity::find()
            .filter(financial_cube::Column::TenantId.eq(tenant.tenant_id().as_str()))
            .filter(financial_cube::Column::PeriodType.eq(db_period_type(period_type)))
            .all(&self.db)
            .await?;
        Ok(rows.iter().map(|r| r.total_amount).sum())
    }

    async fn transaction_date_range(&self, tenant: &TenantCtx) -> Result<Option<(NaiveDate, NaiveDate)>, RepoError> {
        let rows = transactions::Entity::find()
            .filter(transactions::Column::TenantId.eq(tenant.tenant_id().as_str()))
            .order_by_asc(transactions::Column::Date)
            .all(&self.db)
            .await?;
        let Some(first) = rows.first() else { return Ok(None) };
        let last = rows.last().unwrap_or(first);
        Ok(Some((first.date, last.date)))
    }
}

/// Recomputes exactly the cube cells named by `targets`, inside the
/// caller's transaction (section 4.3.2). Other repositories that mutate the
/// ledger inside a `with_transaction` block call this directly so the
/// ledger write and the cube update commit or roll back together.
///
/// # Errors
///
/// Returns an error if any query fails.
pub(crate) async fn regenerate_targets(
    txn: &DatabaseTransaction,
    tenant: &TenantCtx,
    targets: Vec<RegenerationTarget>,
) -> Result<(), RepoError> {
    if targets.is_empty() {
        return Ok(());
    }

    let mut periods: Vec<(PeriodType, NaiveDate, NaiveDate)> = Vec::new();
    for target in &targets {
        let key = (target.key.period_type, target.key.period_start, target.key.period_end);
        if !periods.contains(&key) {
            periods.push(key);
        }
    }

    for (period_type, period_start, period_end) in periods {
        let period_targets: Vec<&RegenerationTarget> = targets
            .iter()
            .filter(|t| t.key.period_type == period_type && t.key.period_start == period_start)
            .collect();

        for target in &period_targets {
            let mut delete = financial_cube::Entity::delete_many()
                .filter(financial_cube::Column::TenantId.eq(tenant.tenant_id().as_str()))
                .filter(financial_cube::Column::PeriodType.eq(db_period_type(period_type)))
                .filter(financial_cube::Column::PeriodStart.eq(period_start))
                .filter(financial_cube::Column::TransactionType.eq(db_flow_type(target.key.transaction_type)))
                .filter(financial_cube::Column::AccountId.eq(target.key.account_id.into_inner()))
                .filter(financial_cube::Column::IsRecurring.eq(target.key.is_recurring));
            delete = match target.key.category_id {
                Some(category_id) => delete.filter(financial_cube::Column::CategoryId.eq(category_id.into_inner())),
                None => delete.filter(financial_cube::Column::CategoryId.is_null()),
            };
            delete.exec(txn).await?;
        }

        let cells = aggregate_period(txn, tenant, period_start, period_end, None).await?;
        let period = Period { period_type, start: period_start, end: period_end };
        for target in &period_targets {
            if let Some(cell) = cells.iter().find(|c| matches_key(c, &target.key)) {
                insert_cell(txn, tenant, &period, cell).await?;
            }
        }
    }

    Ok(())
}

/// One group produced by aggregating ledger rows over a period.
struct AggregatedCell {
    tx_type: FlowType,
    category_id: Option<CategoryId>,
    account_id: AccountId,
    is_recurring: bool,
    category_name: Option<String>,
    account_name: String,
    total_amount: Decimal,
    transaction_count: i64,
}

fn matches_key(cell: &AggregatedCell, key: &CubeDimensionKey) -> bool {
    cell.tx_type == key.transaction_type
        && cell.category_id == key.category_id
        && cell.account_id == key.account_id
        && cell.is_recurring == key.is_recurring
}

async fn aggregate_period(
    conn: &impl ConnectionTrait,
    tenant: &TenantCtx,
    period_start: NaiveDate,
    period_end: NaiveDate,
    account_id: Option<AccountId>,
) -> Result<Vec<AggregatedCell>, RepoError> {
    let mut query = transactions::Entity::find()
        .filter(transactions::Column::TenantId.eq(tenant.tenant_id().as_str()))
        .filter(transactions::Column::Date.gte(period_start))
        .filter(transactions::Column::Date.lte(period_end));
    if let Some(account_id) = account_id {
        query = query.filter(transactions::Column::AccountId.eq(account_id.into_inner()));
    }
    let tx_rows = query.all(conn).await?;

    let account_names: HashMap<Uuid, String> = accounts::Entity::find()
        .filter(accounts::Column::TenantId.eq(tenant.tenant_id().as_str()))
        .all(conn)
        .await?
        .into_iter()
        .map(|row| (row.id, row.name))
        .collect();

    let category_names: HashMap<Uuid, String> = categories::Entity::find()
        .filter(categories::Column::TenantId.eq(tenant.tenant_id().as_str()))
        .all(conn)
        .await?
        .into_iter()
        .map(|row| (row.id, row.name))
        .collect();

    let mut groups: HashMap<(FlowType, Option<Uuid>, Uuid, bool), (Decimal, i64)> = HashMap::new();
    for row in &tx_rows {
        let key = (FlowType::from(row.tx_type), row.category_id, row.account_id, row.is_recurring);
        let entry = groups.entry(key).or_insert((Decimal::ZERO, 0));
        entry.0 += row.amount;
        entry.1 += 1;
    }

    Ok(groups
        .into_iter()
        .filter(|(_, (_, count))| *count > 0)
        .map(|((tx_type, category_id, account_id, is_recurring), (total_amount, transaction_count))| AggregatedCell {
            tx_type,
            category_id: category_id.map(CategoryId::from_uuid),
            account_id: AccountId::from_uuid(account_id),
            is_recurring,
            category_name: match category_id {
                None => Some("Uncategorized".to_string()),
                Some(id) => category_names.get(&id).cloned(),
            },
            account_name: account_names.get(&account_id).cloned().unwrap_or_default(),
            total_amount,
            transaction_count,
        })
        .collect())
}

async fn insert_cell(
    conn: &impl ConnectionTrait,
    tenant: &TenantCtx,
    period: &Period,
    cell: &AggregatedCell,
) -> Result<(), RepoError> {
    let model = financial_cube::ActiveModel {
        id: Set(Uuid::now_v7()),
        tenant_id: Set(tenant.tenant_id().as_str().to_string()),
        period_type: Set(db_period_type(period.period_type)),
        period_start: Set(period.start),
        period_end: Set(period.end),
        transaction_type: Set(db_flow_type(cell.tx_type)),
        category_id: Set(cell.category_id.map(CategoryId::into_inner)),
        account_id: Set(cell.account_id.into_inner()),
        is_recurring: Set(cell.is_recurring),
        category_name: Set(cell.category_name.clone()),
        account_name: Set(cell.account_name.clone()),
        total_amount: Set(cell.total_amount),
        transaction_count: Set(cell.transaction_count),
        updated_at: Set(Utc::now().into()),
    };
    model.insert(conn).await?;
    Ok(())
}

fn to_core_cell(tenant: &TenantCtx, row: financial_cube::Model) -> CubeCell {
    CubeCell {
        key: CubeDimensionKey {
            tenant_id: tenant.tenant_id().clone(),
            period_type: PeriodType::from(row.period_type),
            period_start: row.period_start,
            period_end: row.period_end,
            transaction_type: FlowType::from(row.transaction_type),
            category_id: row.category_id.map(CategoryId::from_uuid),
            account_id: AccountId::from_uuid(row.account_id),
            is_recurring: row.is_recurring,
        },
        category_name: row.category_name,
        account_name: row.account_name,
        total_amount: row.total_amount,
        transaction_count: row.transaction_count,
    }
}

fn group_key(cell: &CubeCell, group_by: &[CubeDimension]) -> AggregateGroupKey {
    let mut key = AggregateGroupKey::default();
    for dimension in group_by {
        match dimension {
            CubeDimension::PeriodType => key.period_type = Some(cell.key.period_type),
            CubeDimension::PeriodStart => key.period_start = Some(cell.key.period_start),
            CubeDimension::TransactionType => key.transaction_type = Some(cell.key.transaction_type),
            CubeDimension::CategoryId => key.category_id = Some(cell.key.category_id),
            CubeDimension::AccountId => key.account_id = Some(cell.key.account_id),
            CubeDimension::IsRecurring => key.is_recurring = Some(cell.key.is_recurring),
        }
    }
    key
}

fn flow_type_rank(tx_type: FlowType) -> u8 {
    match tx_type {
        FlowType::Income => 0,
        FlowType::Expense => 1,
        FlowType::Transfer => 2,
    }
}

fn db_period_type(period_type: PeriodType) -> crate::entities::sea_orm_active_enums::PeriodType {
    period_type.into()
}

fn db_flow_type(tx_type: FlowType) -> crate::entities::sea_orm_active_enums::FlowType {
    tx_type.into()
}
