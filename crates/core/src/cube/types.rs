//! Value types for the cube maintenance engine (C3).

use chrono::{DateTime, NaiveDate, Utc};
use ledgercube_shared::{AccountId, CategoryId, TenantId};
use rust_decimal::Decimal;

use crate::ledger::FlowType;

/// Cube period granularity (section 3: WEEKLY or MONTHLY).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PeriodType {
    Weekly,
    Monthly,
}

/// A concrete period instance: an ISO week (Monday-start) or a calendar
/// month, always closed `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Period {
    pub period_type: PeriodType,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// A cube cell's full identity: the dimensional tuple without its facts
/// (section 3's `D`). This is also what `RegenerationTarget` carries.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CubeDimensionKey {
    pub tenant_id: TenantId,
    pub period_type: PeriodType,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub transaction_type: FlowType,
    pub category_id: Option<CategoryId>,
    pub account_id: AccountId,
    pub is_recurring: bool,
}

/// A dimensional key the cube engine plans to recompute from the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RegenerationTarget {
    pub key: CubeDimensionKey,
}

/// A fully materialized cube cell, as persisted and as `get_trends` returns
/// it.
#[derive(Debug, Clone, PartialEq)]
pub struct CubeCell {
    pub key: CubeDimensionKey,
    pub category_name: Option<String>,
    pub account_name: String,
    pub total_amount: Decimal,
    pub transaction_count: i64,
}

impl CubeCell {
    /// Zero-sum cells must never be persisted (section 3).
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.total_amount.is_zero() && self.transaction_count == 0
    }
}

/// Read-only cube statistics (section 4.3).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CubeStatistics {
    pub total_cells: i64,
    pub weekly_cells: i64,
    pub monthly_cells: i64,
    pub earliest_period_start: Option<NaiveDate>,
    pub latest_period_end: Option<NaiveDate>,
    pub distinct_accounts: i64,
    pub distinct_categories: i64,
    pub last_updated: Option<DateTime<Utc>>,
}

/// A dimension the cube's query surface may group or filter by -- note facts
/// (`total_amount`, `transaction_count`) are not members of this enum, so
/// "group-by must reference only dimensions, not facts" (section 4.3.6) is
/// enforced by the type system rather than a runtime check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CubeDimension {
    PeriodType,
    PeriodStart,
    TransactionType,
    CategoryId,
    AccountId,
    IsRecurring,
}

/// Filters accepted by `get_trends` and `get_aggregated_totals`.
#[derive(Debug, Clone, Default)]
pub struct TrendFilter {
    pub period_type: Option<PeriodType>,
    pub date_range: Option<(NaiveDate, NaiveDate)>,
    pub transaction_type: Option<FlowType>,
    pub category_ids: Option<Vec<CategoryId>>,
    pub account_ids: Option<Vec<AccountId>>,
    pub is_recurring: Option<bool>,
}

/// The grouped dimension values of one `get_aggregated_totals` row; only the
/// fields named in the query's `group_by` are populated.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AggregateGroupKey {
    pub period_type: Option<PeriodType>,
    pub period_start: Option<NaiveDate>,
    pub transaction_type: Option<FlowType>,
    pub category_id: Option<Option<CategoryId>>,
    pub account_id: Option<AccountId>,
    pub is_recurring: Option<bool>,
}

/// One row of `get_aggregated_totals`.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateRow {
    pub key: AggregateGroupKey,
    pub total_amount: Decimal,
    pub transaction_count: i64,
}

/// Group-by preset for the category-over-time derived helper (section
/// 4.3.6).
pub const CATEGORY_OVER_TIME_GROUP_BY: &[CubeDimension] =
    &[CubeDimension::PeriodStart, CubeDimension::CategoryId];

/// Group-by preset for the account-over-time derived helper.
pub const ACCOUNT_OVER_TIME_GROUP_BY: &[CubeDimension] =
    &[CubeDimension::PeriodStart, CubeDimension::AccountId];

/// Group-by preset for the income-vs-expense derived helper.
pub const INCOME_VS_EXPENSE_GROUP_BY: &[CubeDimension] =
    &[CubeDimension::PeriodStart, CubeDimension::TransactionType];

/// Options accepted by `populate_historical` (section 6).
#[derive(Debug, Clone)]
pub struct BackfillOptions {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub clear_existing: bool,
    pub batch_size: usize,
    pub account_id: Option<AccountId>,
}

impl Default for BackfillOptions {
    fn default() -> Self {
        Self {
            start: NaiveDate::from_ymd_opt(1970, 1, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(1970, 1, 1).unwrap(),
            clear_existing: false,
            batch_size: 100,
            account_id: None,
        }
    }
}

/// The result of `populate_historical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BackfillResult {
    pub periods_processed: usize,
    pub periods_skipped: usize,
    pub cells_created: usize,
    pub elapsed_ms: u64,
}
