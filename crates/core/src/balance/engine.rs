//! Pure computation for the balance engine (C2).
//!
//! `BalanceEngine` is a zero-field unit struct, like `LedgerService`: all
//! state (postings, anchors, the account's cached balance) is fetched by
//! the caller and passed in.

use chrono::NaiveDate;
use ledgercube_shared::approx_eq;
use rust_decimal::Decimal;

use super::error::BalanceError;
use super::types::{
    AnchorRef, AnnotatedPosting, BalanceAt, BalanceMethod, BalanceSummary, HistoryPoint,
    MethodCounts, Posting, SyncResult,
};

pub struct BalanceEngine;

impl BalanceEngine {
    /// Sorts postings into the one deterministic order this engine ever
    /// uses for running-balance computation: `(date ASC, id ASC,
    /// description ASC)`.
    pub fn order_postings(postings: &mut [Posting]) {
        postings.sort_by(|a, b| {
            a.date
                .cmp(&b.date)
                .then_with(|| a.id.cmp(&b.id))
                .then_with(|| a.description.cmp(&b.description))
        });
    }

    /// Rejects a history/backfill range whose end precedes its start.
    pub fn validate_date_range(start: NaiveDate, end: NaiveDate) -> Result<(), BalanceError> {
        if end < start {
            return Err(BalanceError::InvalidDateRange { start, end });
        }
        Ok(())
    }

    /// Balance-at-date algorithm (section 4.2): prefers the latest anchor at
    /// or before `target_date` (forward replay), falls back to the earliest
    /// anchor at or after it (backward replay), and finally to a direct sum
    /// from the beginning of time when no anchor exists at all.
    #[must_use]
    pub fn balance_at(
        postings: &[Posting],
        anchors: &[AnchorRef],
        target_date: NaiveDate,
    ) -> BalanceAt {
        if let Some(anchor) = anchors
            .iter()
            .filter(|a| a.anchor_date <= target_date)
            .max_by_key(|a| a.anchor_date)
        {
            let sum: Decimal = postings
                .iter()
                .filter(|p| p.date > anchor.anchor_date && p.date <= target_date)
                .map(|p| p.amount)
                .sum();
            return BalanceAt {
                balance: anchor.balance + sum,
                method: BalanceMethod::AnchorForward,
                anchor: Some(*anchor),
            };
        }

        if let Some(anchor) = anchors
            .iter()
            .filter(|a| a.anchor_date >= target_date)
            .min_by_key(|a| a.anchor_date)
        {
            let sum: Decimal = postings
                .iter()
                .filter(|p| p.date >= target_date && p.date <= anchor.anchor_date)
                .map(|p| p.amount)
                .sum();
            return BalanceAt {
                balance: anchor.balance - sum,
                method: BalanceMethod::AnchorBackward,
                anchor: Some(*anchor),
            };
        }

        let sum: Decimal = postings
            .iter()
            .filter(|p| p.date <= target_date)
            .map(|p| p.amount)
            .sum();
        BalanceAt {
            balance: sum,
            method: BalanceMethod::Direct,
            anchor: None,
        }
    }

    /// Running-balance reconstruction (section 4.2): replays `postings` in
    /// deterministic order around `anchor` (if any), returning the annotated
    /// list newest-first. When an anchor is present and the resulting final
    /// balance disagrees with `cached_balance` by more than the epsilon, the
    /// disagreement is logged, never treated as a failure (section 4.2.1).
    #[must_use]
    pub fn running_balances(
        postings: &[Posting],
        anchor: Option<AnchorRef>,
        cached_balance: Decimal,
    ) -> Vec<AnnotatedPosting> {
        let mut ordered = postings.to_vec();
        Self::order_postings(&mut ordered);

        let mut annotated = match anchor {
            Some(anchor) => {
                let result = Self::running_balances_with_anchor(&ordered, anchor);
                if let Some(last) = result.last() {
                    if !approx_eq(last.running_balance, cached_balance) {
                        tracing::warn!(
                            account_anchor_balance = %anchor.balance,
                            computed_balance = %last.running_balance,
                            cached_balance = %cached_balance,
                            delta = %(last.running_balance - cached_balance),
                            "anchor-derived balance disagrees with cached account balance"
                        );
                    }
                }
                result
            }
            None => Self::running_balances_without_anchor(&ordered, cached_balance),
        };

        annotated.reverse();
        annotated
    }

    fn running_balances_with_anchor(
        ordered: &[Posting],
        anchor: AnchorRef,
    ) -> Vec<AnnotatedPosting> {
        let (pre, post): (Vec<&Posting>, Vec<&Posting>) =
            ordered.iter().partition(|p| p.date <= anchor.anchor_date);

        let mut pre_annotated = Vec::with_capacity(pre.len());
        let mut running = anchor.balance;
        for posting in pre.iter().rev() {
            pre_annotated.push(AnnotatedPosting {
                posting: (*posting).clone(),
                running_balance: running,
            });
            running -= posting.amount;
        }
        pre_annotated.reverse();

        let mut post_annotated = Vec::with_capacity(post.len());
        let mut running = anchor.balance;
        for posting in &post {
            running += posting.amount;
            post_annotated.push(AnnotatedPosting {
                posting: (*posting).clone(),
                running_balance: running,
            });
        }

        pre_annotated.into_iter().chain(post_annotated).collect()
    }

    fn running_balances_without_anchor(
        ordered: &[Posting],
        cached_balance: Decimal,
    ) -> Vec<AnnotatedPosting> {
        let total: Decimal = ordered.iter().map(|p| p.amount).sum();
        let mut running = cached_balance - total;
        ordered
            .iter()
            .map(|posting| {
                running += posting.amount;
                AnnotatedPosting {
                    posting: posting.clone(),
                    running_balance: running,
                }
            })
            .collect()
    }

    /// Daily balance-history series over `[start, end]` (section 4.2): one
    /// point per distinct posting date in range, each tagged with the
    /// method `balance_at` used to compute it.
    #[must_use]
    pub fn daily_series(
        postings: &[Posting],
        anchors: &[AnchorRef],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Vec<HistoryPoint> {
        let mut dates: Vec<NaiveDate> = postings
            .iter()
            .map(|p| p.date)
            .filter(|d| *d >= start && *d <= end)
            .collect();
        dates.sort();
        dates.dedup();

        dates
            .into_iter()
            .map(|date| {
                let at = Self::balance_at(postings, anchors, date);
                let daily_net: Decimal = postings
                    .iter()
                    .filter(|p| p.date == date)
                    .map(|p| p.amount)
                    .sum();
                HistoryPoint {
                    date,
                    balance: at.balance,
                    daily_net,
                    method: at.method,
                }
            })
            .collect()
    }

    /// Summarizes a history series already computed by `daily_series`.
    #[must_use]
    pub fn summarize(points: &[HistoryPoint], transaction_count: usize) -> BalanceSummary {
        let (start_balance, end_balance) = match (points.first(), points.last()) {
            (Some(first), Some(last)) => (first.balance, last.balance),
            _ => (Decimal::ZERO, Decimal::ZERO),
        };

        let mut method_counts = MethodCounts::default();
        for point in points {
            match point.method {
                BalanceMethod::Direct => method_counts.direct += 1,
                BalanceMethod::AnchorForward => method_counts.anchor_forward += 1,
                BalanceMethod::AnchorBackward => method_counts.anchor_backward += 1,
            }
        }

        BalanceSummary {
            start_balance,
            end_balance,
            net_change: end_balance - start_balance,
            transaction_count,
            method_counts,
        }
    }

    /// `sync_account_balance`: compares the freshly computed balance against
    /// the cached one and reports whether the caller needs to persist it.
    #[must_use]
    pub fn sync(old_balance: Decimal, computed: Decimal) -> SyncResult {
        SyncResult {
            old: old_balance,
            new: computed,
            updated: !approx_eq(old_balance, computed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgercube_shared::{BalanceAnchorId, TransactionId};

    fn posting(id: u128, date: NaiveDate, description: &str, amount: Decimal) -> Posting {
        Posting {
            id: TransactionId::from_uuid(uuid::Uuid::from_u128(id)),
            date,
            description: description.to_string(),
            amount,
        }
    }

    fn anchor(date: NaiveDate, balance: Decimal) -> AnchorRef {
        AnchorRef {
            id: BalanceAnchorId::new(),
            anchor_date: date,
            balance,
        }
    }

    /// Scenario S3: anchor-forward and anchor-backward balance lookups.
    #[test]
    fn test_balance_at_anchor_forward_and_backward() {
        let d = |y, m, day| NaiveDate::from_ymd_opt(y, m, day).unwrap();
        let anchors = vec![anchor(d(2024, 1, 1), Decimal::new(100000, 2))];
        let postings = vec![
            posting(1, d(2024, 1, 15), "x", Decimal::new(50000, 2)),
            posting(2, d(2024, 1, 20), "y", Decimal::new(-20000, 2)),
        ];

        let forward = BalanceEngine::balance_at(&postings, &anchors, d(2024, 1, 25));
        assert_eq!(forward.balance, Decimal::new(130000, 2));
        assert_eq!(forward.method, BalanceMethod::AnchorForward);

        let backward = BalanceEngine::balance_at(&postings, &anchors, d(2023, 12, 31));
        assert_eq!(backward.balance, Decimal::new(100000, 2));
        assert_eq!(backward.method, BalanceMethod::AnchorBackward);
    }

    #[test]
    fn test_balance_at_no_anchor_sums_directly() {
        let d = |y, m, day| NaiveDate::from_ymd_opt(y, m, day).unwrap();
        let postings = vec![
            posting(1, d(2024, 1, 1), "x", Decimal::new(10000, 2)),
            posting(2, d(2024, 1, 5), "y", Decimal::new(-2500, 2)),
        ];
        let result = BalanceEngine::balance_at(&postings, &[], d(2024, 1, 10));
        assert_eq!(result.balance, Decimal::new(7500, 2));
        assert_eq!(result.method, BalanceMethod::Direct);
        assert!(result.anchor.is_none());
    }

    /// Scenario S4: deterministic same-date ordering drives running balance.
    #[test]
    fn test_running_balances_same_date_ordering() {
        let d = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap();
        let anchor_ref = anchor(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(), Decimal::ZERO);
        let postings = vec![
            posting(7, d, "b", Decimal::new(1000, 2)),
            posting(5, d, "a", Decimal::new(-300, 2)),
        ];

        let annotated = BalanceEngine::running_balances(&postings, Some(anchor_ref), Decimal::new(700, 2));
        assert_eq!(annotated.len(), 2);
        assert_eq!(annotated[0].posting.id, TransactionId::from_uuid(uuid::Uuid::from_u128(7)));
        assert_eq!(annotated[0].running_balance, Decimal::new(700, 2));
        assert_eq!(annotated[1].posting.id, TransactionId::from_uuid(uuid::Uuid::from_u128(5)));
        assert_eq!(annotated[1].running_balance, Decimal::new(-300, 2));
    }

    #[test]
    fn test_running_balances_without_anchor_matches_cached_total() {
        let d = |y, m, day| NaiveDate::from_ymd_opt(y, m, day).unwrap();
        let postings = vec![
            posting(1, d(2024, 1, 1), "x", Decimal::new(10000, 2)),
            posting(2, d(2024, 1, 2), "y", Decimal::new(-4000, 2)),
        ];
        let annotated = BalanceEngine::running_balances(&postings, None, Decimal::new(6000, 2));
        assert_eq!(annotated.first().unwrap().running_balance, Decimal::new(6000, 2));
    }

    #[test]
    fn test_daily_series_and_summary() {
        let d = |y, m, day| NaiveDate::from_ymd_opt(y, m, day).unwrap();
        let anchors = vec![anchor(d(2024, 1, 1), Decimal::new(100000, 2))];
        let postings = vec![
            posting(1, d(2024, 1, 15), "x", Decimal::new(50000, 2)),
            posting(2, d(2024, 1, 20), "y", Decimal::new(-20000, 2)),
        ];

        let series = BalanceEngine::daily_series(&postings, &anchors, d(2024, 1, 1), d(2024, 1, 31));
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].date, d(2024, 1, 15));
        assert_eq!(series[1].date, d(2024, 1, 20));

        let summary = BalanceEngine::summarize(&series, 2);
        assert_eq!(summary.start_balance, Decimal::new(150000, 2));
        assert_eq!(summary.end_balance, Decimal::new(130000, 2));
        assert_eq!(summary.net_change, Decimal::new(-20000, 2));
        assert_eq!(summary.method_counts.anchor_forward, 2);
    }

    #[test]
    fn test_sync_reports_update_only_beyond_epsilon() {
        let unchanged = BalanceEngine::sync(Decimal::new(100000, 2), Decimal::new(100002, 2));
        assert!(!unchanged.updated);

        let changed = BalanceEngine::sync(Decimal::new(100000, 2), Decimal::new(98000, 2));
        assert!(changed.updated);
        assert_eq!(changed.new, Decimal::new(98000, 2));
    }

    #[test]
    fn test_validate_date_range_rejects_inverted_range() {
        let d = |y, m, day| NaiveDate::from_ymd_opt(y, m, day).unwrap();
        assert!(BalanceEngine::validate_date_range(d(2024, 2, 1), d(2024, 1, 1)).is_err());
        assert!(BalanceEngine::validate_date_range(d(2024, 1, 1), d(2024, 2, 1)).is_ok());
    }
}
