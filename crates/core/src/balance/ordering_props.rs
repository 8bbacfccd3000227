//! Property 4: posting ordering is stable and deterministic.

use chrono::NaiveDate;
use ledgercube_shared::TransactionId;
use proptest::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::engine::BalanceEngine;
use super::types::Posting;

fn postings_strategy() -> impl Strategy<Value = Vec<Posting>> {
    prop::collection::vec((0i64..60, -100_000i64..100_000i64, 0u8..5), 0..50).prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(i, (day_offset, cents, desc_variant))| Posting {
                id: TransactionId::from_uuid(Uuid::from_u128(i as u128)),
                date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Duration::days(day_offset),
                description: format!("tx-{desc_variant}"),
                amount: Decimal::new(cents, 2),
            })
            .collect()
    })
}

proptest! {
    /// Sorting the same posting set twice always yields byte-identical
    /// output -- the ordering is a pure function of the data, not of
    /// insertion order or any hidden tie-breaker.
    #[test]
    fn ordering_is_deterministic_across_repeated_sorts(postings in postings_strategy()) {
        let mut first = postings.clone();
        BalanceEngine::order_postings(&mut first);
        let mut second = postings.clone();
        BalanceEngine::order_postings(&mut second);
        prop_assert_eq!(first, second);
    }

    /// After sorting, every adjacent pair satisfies the `(date, id,
    /// description)` ordering the engine promises.
    #[test]
    fn ordering_is_non_decreasing_by_key(mut postings in postings_strategy()) {
        BalanceEngine::order_postings(&mut postings);
        for window in postings.windows(2) {
            let key_a = (window[0].date, window[0].id, window[0].description.clone());
            let key_b = (window[1].date, window[1].id, window[1].description.clone());
            prop_assert!(key_a <= key_b);
        }
    }
}
