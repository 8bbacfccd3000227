//! Consistency checking and backfill batching (sections 4.3.4/4.3.5).

use ledgercube_shared::approx_eq;
use rust_decimal::Decimal;

use super::types::Period;

/// Pure arithmetic and batching helpers the cube engine's repair and
/// backfill procedures drive; fetching the sums and running the regenerate
/// procedure itself belongs to the `db` crate.
pub struct ConsistencyChecker;

impl ConsistencyChecker {
    /// Property 1: the cube is consistent with the ledger for a period type
    /// iff their sums agree to within `AMOUNT_EPSILON`.
    #[must_use]
    pub fn is_consistent(cube_sum: Decimal, ledger_sum: Decimal) -> bool {
        approx_eq(cube_sum, ledger_sum)
    }

    /// Splits `periods` into batches of at most `batch_size` for
    /// `populate_historical` (section 4.3.4; default batch size 100).
    #[must_use]
    pub fn batches(periods: &[Period], batch_size: usize) -> Vec<&[Period]> {
        if batch_size == 0 {
            return vec![periods];
        }
        periods.chunks(batch_size).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cube::types::PeriodType;
    use chrono::NaiveDate;

    #[test]
    fn test_is_consistent_within_epsilon() {
        assert!(ConsistencyChecker::is_consistent(
            Decimal::new(100000, 2),
            Decimal::new(100003, 2)
        ));
        assert!(!ConsistencyChecker::is_consistent(
            Decimal::new(100000, 2),
            Decimal::new(100100, 2)
        ));
    }

    fn period(day: u32) -> Period {
        Period {
            period_type: PeriodType::Weekly,
            start: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            end: NaiveDate::from_ymd_opt(2024, 1, day + 6).unwrap(),
        }
    }

    #[test]
    fn test_batches_splits_by_size() {
        let periods = vec![period(1), period(8), period(15)];
        let batches = ConsistencyChecker::batches(&periods, 2);
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].len(), 2);
        assert_eq!(batches[1].len(), 1);
    }

    #[test]
    fn test_batches_zero_size_returns_single_batch() {
        let periods = vec![period(1)];
        let batches = ConsistencyChecker::batches(&periods, 0);
        assert_eq!(batches.len(), 1);
    }
}
