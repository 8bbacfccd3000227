//! Pure validation and planning logic for the ledger service (C1).
//!
//! `LedgerService` is a zero-field unit struct of associated functions, like
//! the teacher's other core services: it holds no state and needs no
//! constructor. Callers (the `db` crate's repositories) fetch whatever rows
//! a decision needs and pass them in; nothing here touches storage.

use chrono::NaiveDate;
use ledgercube_shared::{approx_eq, round2};
use rust_decimal::Decimal;

use super::error::LedgerError;
use super::types::{ChangedField, FlowType};

/// Pure business logic for accounts, categories, transactions, and
/// reconciliation.
pub struct LedgerService;

impl LedgerService {
    /// Resolves the net worth category for a new or updated account,
    /// defaulting from the account type when the caller left it unset.
    #[must_use]
    pub fn resolve_net_worth_category(
        account_type: super::types::AccountType,
        requested: Option<super::types::NetWorthCategory>,
    ) -> super::types::NetWorthCategory {
        requested.unwrap_or_else(|| account_type.default_net_worth_category())
    }

    /// Rejects a name that collides with another active account's name in
    /// the same tenant.
    pub fn validate_unique_account_name(
        existing_active_names: &[&str],
        name: &str,
    ) -> Result<(), LedgerError> {
        if existing_active_names.contains(&name) {
            return Err(LedgerError::DuplicateAccountName(name.to_string()));
        }
        Ok(())
    }

    /// Rejects a `(name, type)` pair that collides with an existing category
    /// in the same tenant.
    pub fn validate_unique_category(
        existing: &[(&str, FlowType)],
        name: &str,
        kind: FlowType,
    ) -> Result<(), LedgerError> {
        if existing.iter().any(|(n, k)| *n == name && *k == kind) {
            return Err(LedgerError::DuplicateCategory {
                name: name.to_string(),
                kind,
            });
        }
        Ok(())
    }

    /// Rejects a new anchor date that collides with an existing anchor for
    /// the same account (section 3: `(account_id, anchor_date)` is unique).
    pub fn validate_unique_anchor_date(
        existing_dates: &[NaiveDate],
        anchor_date: NaiveDate,
    ) -> Result<(), LedgerError> {
        if existing_dates.contains(&anchor_date) {
            return Err(LedgerError::DuplicateAnchorDate(anchor_date));
        }
        Ok(())
    }

    /// Rejects a reconciliation date later than `today`.
    pub fn validate_reconcile_date(
        reconcile_date: NaiveDate,
        today: NaiveDate,
    ) -> Result<(), LedgerError> {
        if reconcile_date > today {
            return Err(LedgerError::FutureReconcileDate(reconcile_date));
        }
        Ok(())
    }

    /// Computes the reconciliation plan for `reconcile_account` (section
    /// 4.1/4.2.1/S5): the anchor balance to write and, when the discrepancy
    /// exceeds `AMOUNT_EPSILON`, the single adjustment posting to synthesize.
    #[must_use]
    pub fn plan_reconciliation(
        current_computed_balance: Decimal,
        new_balance: Decimal,
        reconcile_date: NaiveDate,
        requested_type: Option<FlowType>,
    ) -> ReconciliationPlan {
        let adjustment = if approx_eq(current_computed_balance, new_balance) {
            None
        } else {
            let difference = new_balance - current_computed_balance;
            let tx_type = requested_type.unwrap_or(if difference.is_sign_positive() {
                FlowType::Income
            } else {
                FlowType::Expense
            });
            Some(AdjustmentPlan {
                tx_type,
                amount: round2(difference),
                date: reconcile_date,
            })
        };
        ReconciliationPlan {
            anchor_balance: round2(new_balance),
            anchor_date: reconcile_date,
            adjustment,
        }
    }

    /// Validates the `NonUniformBulk` precondition (sections 4.1/4.3.3): the
    /// fast path is only sound when every affected row shared the same old
    /// value for the field being changed. `observed_old_values` is whatever
    /// the caller found among the affected rows.
    pub fn validate_bulk_precondition<T: PartialEq>(
        field: ChangedField,
        observed_old_values: &[T],
    ) -> Result<(), LedgerError> {
        let mut distinct: Vec<&T> = Vec::new();
        for value in observed_old_values {
            if !distinct.iter().any(|existing| *existing == value) {
                distinct.push(value);
            }
        }
        if distinct.len() > 1 {
            return Err(LedgerError::NonUniformBulk { field });
        }
        Ok(())
    }

    /// Rejects a bulk update that names `date` as the field to change.
    ///
    /// `ChangedField` already excludes `Date` at the type level; this exists
    /// only as a defense-in-depth check for a caller building a
    /// `BulkFieldChange` from an external partial-update payload that still
    /// names fields as strings before typing them.
    pub fn reject_bulk_date_change(requested_field_name: &str) -> Result<(), LedgerError> {
        if requested_field_name.eq_ignore_ascii_case("date") {
            return Err(LedgerError::UnsupportedBulkField("date".to_string()));
        }
        Ok(())
    }
}

/// The single adjustment posting a reconciliation synthesizes, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct AdjustmentPlan {
    pub tx_type: FlowType,
    pub amount: Decimal,
    pub date: NaiveDate,
}

/// The outcome of `LedgerService::plan_reconciliation`.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconciliationPlan {
    pub anchor_balance: Decimal,
    pub anchor_date: NaiveDate,
    pub adjustment: Option<AdjustmentPlan>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::types::{AccountType, NetWorthCategory};

    #[test]
    fn test_resolve_net_worth_category_defaults() {
        assert_eq!(
            LedgerService::resolve_net_worth_category(AccountType::Checking, None),
            NetWorthCategory::Asset
        );
        assert_eq!(
            LedgerService::resolve_net_worth_category(AccountType::Loan, None),
            NetWorthCategory::Liability
        );
    }

    #[test]
    fn test_resolve_net_worth_category_respects_explicit_request() {
        assert_eq!(
            LedgerService::resolve_net_worth_category(
                AccountType::Checking,
                Some(NetWorthCategory::Excluded)
            ),
            NetWorthCategory::Excluded
        );
    }

    #[test]
    fn test_validate_unique_account_name_rejects_collision() {
        let existing = ["Checking", "Savings"];
        assert!(LedgerService::validate_unique_account_name(&existing, "Savings").is_err());
        assert!(LedgerService::validate_unique_account_name(&existing, "Credit").is_ok());
    }

    #[test]
    fn test_validate_unique_category_checks_name_and_type() {
        let existing = [("Food", FlowType::Expense)];
        assert!(LedgerService::validate_unique_category(&existing, "Food", FlowType::Expense)
            .is_err());
        assert!(LedgerService::validate_unique_category(&existing, "Food", FlowType::Income)
            .is_ok());
    }

    #[test]
    fn test_validate_unique_anchor_date_rejects_collision() {
        let d = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let existing = [d, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()];
        assert!(LedgerService::validate_unique_anchor_date(&existing, d).is_err());
        assert!(LedgerService::validate_unique_anchor_date(
            &existing,
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
        )
        .is_ok());
    }

    #[test]
    fn test_validate_reconcile_date_rejects_future() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let future = NaiveDate::from_ymd_opt(2024, 6, 2).unwrap();
        assert!(LedgerService::validate_reconcile_date(future, today).is_err());
        assert!(LedgerService::validate_reconcile_date(today, today).is_ok());
    }

    /// Scenario S5: computed balance 980.00, reconcile to 1000.00 produces a
    /// single +20.00 INCOME adjustment.
    #[test]
    fn test_plan_reconciliation_with_adjustment() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let plan = LedgerService::plan_reconciliation(
            Decimal::new(98000, 2),
            Decimal::new(100000, 2),
            today,
            None,
        );
        assert_eq!(plan.anchor_balance, Decimal::new(100000, 2));
        let adjustment = plan.adjustment.expect("expected an adjustment");
        assert_eq!(adjustment.tx_type, FlowType::Income);
        assert_eq!(adjustment.amount, Decimal::new(2000, 2));
        assert_eq!(adjustment.date, today);
    }

    /// Property 8: a discrepancy within epsilon creates no adjustment.
    #[test]
    fn test_plan_reconciliation_within_epsilon_skips_adjustment() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let plan = LedgerService::plan_reconciliation(
            Decimal::new(100000, 2),
            Decimal::new(100040, 2),
            today,
            None,
        );
        assert!(plan.adjustment.is_none());
    }

    #[test]
    fn test_plan_reconciliation_negative_difference_defaults_to_expense() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let plan = LedgerService::plan_reconciliation(
            Decimal::new(100000, 2),
            Decimal::new(90000, 2),
            today,
            None,
        );
        let adjustment = plan.adjustment.expect("expected an adjustment");
        assert_eq!(adjustment.tx_type, FlowType::Expense);
        assert_eq!(adjustment.amount, Decimal::new(-10000, 2));
    }

    #[test]
    fn test_plan_reconciliation_respects_explicit_type() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let plan = LedgerService::plan_reconciliation(
            Decimal::new(100000, 2),
            Decimal::new(90000, 2),
            today,
            Some(FlowType::Transfer),
        );
        assert_eq!(plan.adjustment.unwrap().tx_type, FlowType::Transfer);
    }

    /// Scenario S6: non-uniform old values on the changed field are rejected.
    #[test]
    fn test_validate_bulk_precondition_rejects_non_uniform() {
        let old_category_ids = ["C1", "C1", "C2"];
        let result =
            LedgerService::validate_bulk_precondition(ChangedField::CategoryId, &old_category_ids);
        assert!(matches!(
            result,
            Err(LedgerError::NonUniformBulk {
                field: ChangedField::CategoryId
            })
        ));
    }

    #[test]
    fn test_validate_bulk_precondition_accepts_uniform() {
        let old_category_ids = ["C1", "C1", "C1"];
        assert!(
            LedgerService::validate_bulk_precondition(ChangedField::CategoryId, &old_category_ids)
                .is_ok()
        );
    }

    #[test]
    fn test_reject_bulk_date_change() {
        assert!(LedgerService::reject_bulk_date_change("date").is_err());
        assert!(LedgerService::reject_bulk_date_change("amount").is_ok());
    }
}
