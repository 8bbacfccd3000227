//! Balance repository: read-side queries and the sync workflow built on top
//! of [`BalanceEngine`]. All storage access goes through the loader helpers
//! [`super::account::find_account_row`], [`super::account::load_postings`],
//! and [`super::account::load_anchors`] that `AccountRepository` already
//! uses for `reconcile_account`.

use chrono::{Days, NaiveDate};
use ledgercube_core::balance::{AnnotatedPosting, BalanceAt, BalanceEngine, BalanceSummary, HistoryPoint, SyncResult};
use ledgercube_shared::{AccountId, CubeConfig, TenantCtx};
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};

use crate::entities::accounts;
use crate::error::RepoError;
use crate::repositories::account::{find_account_row, load_anchors, load_postings};

/// Repository wrapping the pure balance engine with persistence.
#[derive(Debug, Clone)]
pub struct BalanceRepository {
    db: DatabaseConnection,
    /// Window used by `balance_history_default`/`balance_summary_default`
    /// when the caller does not supply an explicit range (section 6:
    /// `CubeConfig::default_history_window_days`).
    default_history_window_days: u64,
}

impl BalanceRepository {
    /// Creates a new balance repository using the default history window
    /// (30 days).
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self::with_config(db, &CubeConfig::default())
    }

    /// Creates a new balance repository, taking the default history window
    /// from the application's cube configuration.
    #[must_use]
    pub fn with_config(db: DatabaseConnection, cube_config: &CubeConfig) -> Self {
        let default_history_window_days =
            u64::try_from(cube_config.default_history_window_days).unwrap_or(30);
        Self { db, default_history_window_days }
    }

    /// Computes the balance of an account as of `target_date` (section 4.2).
    ///
    /// # Errors
    ///
    /// Returns `NotFound`/`CrossTenant` if the account does not belong to
    /// this tenant, or an error if loading postings/anchors fails.
    pub async fn balance_at(
        &self,
        tenant: &TenantCtx,
        account_id: AccountId,
        target_date: NaiveDate,
    ) -> Result<BalanceAt, RepoError> {
        find_account_row(&self.db, tenant, account_id).await?;
        let postings = load_postings(&self.db, tenant, account_id).await?;
        let anchors = load_anchors(&self.db, tenant, account_id).await?;
        Ok(BalanceEngine::balance_at(&postings, &anchors, target_date))
    }

    /// Returns the running-balance-annotated posting list, newest first
    /// (section 4.2).
    ///
    /// # Errors
    ///
    /// Returns `NotFound`/`CrossTenant` if the account does not belong to
    /// this tenant, or an error if loading postings/anchors fails.
    pub async fn running_balances(
        &self,
        tenant: &TenantCtx,
        account_id: AccountId,
    ) -> Result<Vec<AnnotatedPosting>, RepoError> {
        let account = find_account_row(&self.db, tenant, account_id).await?;
        let postings = load_postings(&self.db, tenant, account_id).await?;
        let anchors = load_anchors(&self.db, tenant, account_id).await?;
        let latest_anchor = anchors.iter().max_by_key(|a| a.anchor_date).copied();
        Ok(BalanceEngine::running_balances(&postings, latest_anchor, account.balance))
    }

    /// Returns a daily balance-history series over `[start, end]`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDateRange` if `end` precedes `start`, `NotFound`/
    /// `CrossTenant` if the account does not belong to this tenant, or an
    /// error if loading postings/anchors fails.
    pub async fn balance_history(
        &self,
        tenant: &TenantCtx,
        account_id: AccountId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<HistoryPoint>, RepoError> {
        BalanceEngine::validate_date_range(start, end)?;
        find_account_row(&self.db, tenant, account_id).await?;
        let postings = load_postings(&self.db, tenant, account_id).await?;
        let anchors = load_anchors(&self.db, tenant, account_id).await?;
        Ok(BalanceEngine::daily_series(&postings, &anchors, start, end))
    }

    /// Summarizes the balance history over `[start, end]`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDateRange` if `end` precedes `start`, `NotFound`/
    /// `CrossTenant` if the account does not belong to this tenant, or an
    /// error if loading postings/anchors fails.
    pub async fn balance_summary(
        &self,
        tenant: &TenantCtx,
        account_id: AccountId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<BalanceSummary, RepoError> {
        let series = self.balance_history(tenant, account_id, start, end).await?;
        let postings = load_postings(&self.db, tenant, account_id).await?;
        let in_range = postings.iter().filter(|p| p.date >= start && p.date <= end).count();
        Ok(BalanceEngine::summarize(&series, in_range))
    }

    /// Like [`Self::balance_history`], but resolves an absent range to the
    /// configured default window ending today UTC (section 4.2/section 6).
    ///
    /// # Errors
    ///
    /// See [`Self::balance_history`].
    pub async fn balance_history_default(
        &self,
        tenant: &TenantCtx,
        account_id: AccountId,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<HistoryPoint>, RepoError> {
        let (start, end) = self.resolve_range(start, end);
        self.balance_history(tenant, account_id, start, end).await
    }

    /// Like [`Self::balance_summary`], but resolves an absent range to the
    /// configured default window ending today UTC (section 4.2/section 6).
    ///
    /// # Errors
    ///
    /// See [`Self::balance_summary`].
    pub async fn balance_summary_default(
        &self,
        tenant: &TenantCtx,
        account_id: AccountId,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<BalanceSummary, RepoError> {
        let (start, end) = self.resolve_range(start, end);
        self.balance_summary(tenant, account_id, start, end).await
    }

    /// Resolves an optional `(start, end)` pair, defaulting `end` to today
    /// UTC and `start` to `end - default_history_window_days`.
    fn resolve_range(&self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> (NaiveDate, NaiveDate) {
        let end = end.unwrap_or_else(|| chrono::Utc::now().date_naive());
        let start = start.unwrap_or_else(|| {
            end.checked_sub_days(Days::new(self.default_history_window_days)).unwrap_or(end)
        });
        (start, end)
    }

    /// Recomputes an account's balance as of today and, when it disagrees
    /// with the cached value by more than the epsilon, persists the fresh
    /// value.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`/`CrossTenant` if the account does not belong to
    /// this tenant, or an error if loading or updating fails.
    pub async fn sync_account_balance(&self, tenant: &TenantCtx, account_id: AccountId) -> Result<SyncResult, RepoError> {
        let row = find_account_row(&self.db, tenant, account_id).await?;
        let postings = load_postings(&self.db, tenant, account_id).await?;
        let anchors = load_anchors(&self.db, tenant, account_id).await?;
        let today = chrono::Utc::now().date_naive();
        let computed = BalanceEngine::balance_at(&postings, &anchors, today);
        let result = BalanceEngine::sync(row.balance, computed.balance);

        if result.updated {
            let mut model: accounts::ActiveModel = row.into();
            model.balance = Set(result.new);
            model.balance_date = Set(today);
            model.update(&self.db).await?;
        }

        Ok(result)
    }
}
