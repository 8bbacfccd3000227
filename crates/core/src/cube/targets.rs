//! Target identification for the cube maintenance engine (section 4.3.1).

use chrono::{Datelike, NaiveDate};
use ledgercube_shared::TenantId;

use crate::ledger::{BulkChangeDescriptor, BulkFieldChange, ChangeDescriptor, ChangeProjection, DimensionCombo};

use super::types::{CubeDimensionKey, Period, PeriodType, RegenerationTarget};

/// Computes `RegenerationTarget`s from ledger change descriptors. Holds no
/// state.
pub struct TargetPlanner;

impl TargetPlanner {
    /// The ISO week (Monday-start, UTC) containing `date`.
    #[must_use]
    pub fn weekly_period(date: NaiveDate) -> Period {
        let offset = i64::from(date.weekday().num_days_from_monday());
        let start = date - chrono::Duration::days(offset);
        let end = start + chrono::Duration::days(6);
        Period {
            period_type: PeriodType::Weekly,
            start,
            end,
        }
    }

    /// The calendar month containing `date`.
    #[must_use]
    pub fn monthly_period(date: NaiveDate) -> Period {
        let start = NaiveDate::from_ymd_opt(date.year(), date.month(), 1).unwrap();
        let end = Self::next_month_first_day(start) - chrono::Duration::days(1);
        Period {
            period_type: PeriodType::Monthly,
            start,
            end,
        }
    }

    fn next_month_first_day(date: NaiveDate) -> NaiveDate {
        if date.month() == 12 {
            NaiveDate::from_ymd_opt(date.year() + 1, 1, 1).unwrap()
        } else {
            NaiveDate::from_ymd_opt(date.year(), date.month() + 1, 1).unwrap()
        }
    }

    /// Every weekly and monthly period whose range intersects
    /// `[start, end]`, used both for target identification and historical
    /// backfill (section 4.3.4).
    #[must_use]
    pub fn periods_overlapping(start: NaiveDate, end: NaiveDate) -> Vec<Period> {
        let mut periods = Self::periods_overlapping_of_type(PeriodType::Weekly, start, end);
        periods.extend(Self::periods_overlapping_of_type(PeriodType::Monthly, start, end));
        periods
    }

    fn periods_overlapping_of_type(period_type: PeriodType, start: NaiveDate, end: NaiveDate) -> Vec<Period> {
        let mut periods = Vec::new();
        let mut cursor = start;
        loop {
            let period = match period_type {
                PeriodType::Weekly => Self::weekly_period(cursor),
                PeriodType::Monthly => Self::monthly_period(cursor),
            };
            if period.start > end {
                break;
            }
            let next_cursor = match period_type {
                PeriodType::Weekly => period.start + chrono::Duration::days(7),
                PeriodType::Monthly => Self::next_month_first_day(period.start),
            };
            periods.push(period);
            cursor = next_cursor;
        }
        periods
    }

    /// Targets for a single-row `Insert`/`Update`/`Delete` (section 4.3.1
    /// rules 3-4): one target per period per affected projection.
    #[must_use]
    pub fn targets_for_change(tenant: &TenantId, change: &ChangeDescriptor) -> Vec<RegenerationTarget> {
        let mut targets = match change {
            ChangeDescriptor::Insert { new, .. } => Self::targets_for_projection(tenant, new),
            ChangeDescriptor::Delete { old, .. } => Self::targets_for_projection(tenant, old),
            ChangeDescriptor::Update { old, new, .. } => {
                let mut targets = Self::targets_for_projection(tenant, old);
                targets.extend(Self::targets_for_projection(tenant, new));
                targets
            }
        };
        Self::dedupe(&mut targets);
        targets
    }

    fn targets_for_projection(tenant: &TenantId, projection: &ChangeProjection) -> Vec<RegenerationTarget> {
        [
            Self::weekly_period(projection.date),
            Self::monthly_period(projection.date),
        ]
        .into_iter()
        .map(|period| RegenerationTarget {
            key: CubeDimensionKey {
                tenant_id: tenant.clone(),
                period_type: period.period_type,
                period_start: period.start,
                period_end: period.end,
                transaction_type: projection.tx_type,
                category_id: projection.category_id,
                account_id: projection.account_id,
                is_recurring: projection.is_recurring,
            },
        })
        .collect()
    }

    /// Targets for a bulk update (section 4.3.1 rule 5 / 4.3.3 fast path):
    /// the cross product of every distinct pre-change dimension combo with
    /// every period overlapping the bulk's date envelope, emitting both the
    /// old-value and new-value leg of the changed field for each.
    #[must_use]
    pub fn targets_for_bulk(tenant: &TenantId, bulk: &BulkChangeDescriptor) -> Vec<RegenerationTarget> {
        let periods = Self::periods_overlapping(bulk.min_date, bulk.max_date);
        let mut targets = Vec::new();
        for combo in &bulk.distinct_dimension_combos {
            let (old_leg, new_leg) = Self::apply_leg(*combo, &bulk.change);
            for period in &periods {
                targets.push(Self::target_from_combo(tenant, period, old_leg));
                targets.push(Self::target_from_combo(tenant, period, new_leg));
            }
        }
        Self::dedupe(&mut targets);
        targets
    }

    /// Targets for a bulk delete: every affected projection's period,
    /// reusing the single-row path since a bulk delete still carries the
    /// exact old projections rather than a pinned field change.
    #[must_use]
    pub fn targets_for_bulk_delete(tenant: &TenantId, old_projections: &[ChangeProjection]) -> Vec<RegenerationTarget> {
        let mut targets = Vec::new();
        for projection in old_projections {
            targets.extend(Self::targets_for_projection(tenant, projection));
        }
        Self::dedupe(&mut targets);
        targets
    }

    fn apply_leg(combo: DimensionCombo, change: &BulkFieldChange) -> (DimensionCombo, DimensionCombo) {
        match change {
            BulkFieldChange::CategoryId { old, new } => (
                DimensionCombo { category_id: *old, ..combo },
                DimensionCombo { category_id: *new, ..combo },
            ),
            BulkFieldChange::AccountId { old, new } => (
                DimensionCombo { account_id: *old, ..combo },
                DimensionCombo { account_id: *new, ..combo },
            ),
            BulkFieldChange::Type { old, new } => (
                DimensionCombo { tx_type: *old, ..combo },
                DimensionCombo { tx_type: *new, ..combo },
            ),
            BulkFieldChange::IsRecurring { old, new } => (
                DimensionCombo { is_recurring: *old, ..combo },
                DimensionCombo { is_recurring: *new, ..combo },
            ),
            // `amount` is never part of the dimensional key -- both legs are
            // the same combo, and dedup collapses them back to one target.
            BulkFieldChange::Amount { .. } => (combo, combo),
        }
    }

    fn target_from_combo(tenant: &TenantId, period: &Period, combo: DimensionCombo) -> RegenerationTarget {
        RegenerationTarget {
            key: CubeDimensionKey {
                tenant_id: tenant.clone(),
                period_type: period.period_type,
                period_start: period.start,
                period_end: period.end,
                transaction_type: combo.tx_type,
                category_id: combo.category_id,
                account_id: combo.account_id,
                is_recurring: combo.is_recurring,
            },
        }
    }

    /// Deduplicates targets by their full dimensional key (section 4.3.1
    /// rule 6).
    fn dedupe(targets: &mut Vec<RegenerationTarget>) {
        let mut seen: Vec<CubeDimensionKey> = Vec::with_capacity(targets.len());
        let mut deduped = Vec::with_capacity(targets.len());
        for target in std::mem::take(targets) {
            if !seen.contains(&target.key) {
                seen.push(target.key.clone());
                deduped.push(target);
            }
        }
        *targets = deduped;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{ChangeProjection, FlowType};
    use ledgercube_shared::{AccountId, CategoryId, TransactionId};
    use rust_decimal::Decimal;

    fn tenant() -> TenantId {
        TenantId::new("t1").unwrap()
    }

    #[test]
    fn test_weekly_period_starts_monday() {
        let monday = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let period = TargetPlanner::weekly_period(monday);
        assert_eq!(period.start, monday);
        assert_eq!(period.end, NaiveDate::from_ymd_opt(2024, 1, 21).unwrap());

        let wednesday = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        let period = TargetPlanner::weekly_period(wednesday);
        assert_eq!(period.start, NaiveDate::from_ymd_opt(2024, 1, 29).unwrap());
        assert_eq!(period.end, NaiveDate::from_ymd_opt(2024, 2, 4).unwrap());
    }

    #[test]
    fn test_monthly_period_bounds() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 15).unwrap();
        let period = TargetPlanner::monthly_period(date);
        assert_eq!(period.start, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert_eq!(period.end, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
    }

    fn projection(account: AccountId, category: Option<CategoryId>, date: NaiveDate, recurring: bool) -> ChangeProjection {
        ChangeProjection {
            account_id: account,
            category_id: category,
            amount: Decimal::new(-1000, 2),
            date,
            tx_type: FlowType::Expense,
            is_recurring: recurring,
        }
    }

    /// Scenario S2: a cross-period date move produces targets in both the
    /// old and new period.
    #[test]
    fn test_targets_for_update_spans_old_and_new_periods() {
        let account = AccountId::new();
        let category = CategoryId::new();
        let old = projection(account, Some(category), NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(), false);
        let new = projection(account, Some(category), NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(), false);
        let change = ChangeDescriptor::Update {
            tx_id: TransactionId::new(),
            old,
            new,
        };

        let targets = TargetPlanner::targets_for_change(&tenant(), &change);
        // 2 periods (weekly+monthly) for the old date, 2 for the new date,
        // all distinct because January and February don't share a weekly or
        // monthly period.
        assert_eq!(targets.len(), 4);
        assert!(targets.iter().any(|t| t.key.period_type == PeriodType::Monthly
            && t.key.period_start == NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()));
        assert!(targets.iter().any(|t| t.key.period_type == PeriodType::Monthly
            && t.key.period_start == NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()));
    }

    #[test]
    fn test_targets_for_insert_single_row() {
        let projection = projection(AccountId::new(), None, NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(), true);
        let change = ChangeDescriptor::Insert {
            tx_id: TransactionId::new(),
            new: projection,
        };
        let targets = TargetPlanner::targets_for_change(&tenant(), &change);
        assert_eq!(targets.len(), 2);
    }

    /// Scenario S1: a category-only bulk update across 3 accounts and both
    /// recurring flags regenerates exactly 24 cells.
    #[test]
    fn test_targets_for_bulk_category_change_matches_s1() {
        let a1 = AccountId::new();
        let a2 = AccountId::new();
        let a3 = AccountId::new();
        let old_category = CategoryId::new();
        let new_category = CategoryId::new();

        let mut combos = Vec::new();
        for account in [a1, a2, a3] {
            for recurring in [false, true] {
                combos.push(DimensionCombo {
                    tx_type: FlowType::Expense,
                    category_id: Some(old_category),
                    account_id: account,
                    is_recurring: recurring,
                });
            }
        }

        let bulk = BulkChangeDescriptor {
            tx_ids: Vec::new(),
            change: BulkFieldChange::CategoryId {
                old: Some(old_category),
                new: Some(new_category),
            },
            min_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            max_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            distinct_dimension_combos: combos,
        };

        let targets = TargetPlanner::targets_for_bulk(&tenant(), &bulk);
        // 3 accounts x 2 categories x 2 periods x 2 recurring flags = 24.
        assert_eq!(targets.len(), 24);
    }

    #[test]
    fn test_targets_for_bulk_amount_change_collapses_legs() {
        let account = AccountId::new();
        let combo = DimensionCombo {
            tx_type: FlowType::Expense,
            category_id: None,
            account_id: account,
            is_recurring: false,
        };
        let bulk = BulkChangeDescriptor {
            tx_ids: Vec::new(),
            change: BulkFieldChange::Amount {
                old: Decimal::new(5000, 2),
                new: Decimal::new(4500, 2),
            },
            min_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            max_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            distinct_dimension_combos: vec![combo],
        };

        let targets = TargetPlanner::targets_for_bulk(&tenant(), &bulk);
        // 1 combo x 2 periods; the old/new legs are identical for amount
        // changes and collapse under dedup.
        assert_eq!(targets.len(), 2);
    }

    #[test]
    fn test_periods_overlapping_spans_multiple_weeks_and_months() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 29).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 2, 5).unwrap();
        let periods = TargetPlanner::periods_overlapping(start, end);
        assert!(periods.iter().any(|p| p.period_type == PeriodType::Monthly
            && p.start == NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()));
        assert!(periods.iter().any(|p| p.period_type == PeriodType::Monthly
            && p.start == NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()));
    }
}
