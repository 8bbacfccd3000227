//! Value types for the balance engine (C2).

use chrono::NaiveDate;
use ledgercube_shared::{BalanceAnchorId, TransactionId};
use rust_decimal::Decimal;

/// Which computation path produced a balance result (section 4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceMethod {
    Direct,
    AnchorForward,
    AnchorBackward,
}

/// A balance snapshot the engine treats as a trusted starting point,
/// detached from the persisted `BalanceAnchor` row shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnchorRef {
    pub id: BalanceAnchorId,
    pub anchor_date: NaiveDate,
    pub balance: Decimal,
}

/// A posting the engine replays, detached from the ledger `Transaction` row
/// shape so the engine can be exercised without the rest of the domain.
#[derive(Debug, Clone, PartialEq)]
pub struct Posting {
    pub id: TransactionId,
    pub date: NaiveDate,
    pub description: String,
    pub amount: Decimal,
}

/// The result of `balance_at`.
#[derive(Debug, Clone, PartialEq)]
pub struct BalanceAt {
    pub balance: Decimal,
    pub method: BalanceMethod,
    pub anchor: Option<AnchorRef>,
}

/// A posting annotated with the running balance immediately after it.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedPosting {
    pub posting: Posting,
    pub running_balance: Decimal,
}

/// One point in a daily balance history series.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryPoint {
    pub date: NaiveDate,
    pub balance: Decimal,
    pub daily_net: Decimal,
    pub method: BalanceMethod,
}

/// How many history points were computed by each method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MethodCounts {
    pub direct: usize,
    pub anchor_forward: usize,
    pub anchor_backward: usize,
}

/// The result of `balance_summary`.
#[derive(Debug, Clone, PartialEq)]
pub struct BalanceSummary {
    pub start_balance: Decimal,
    pub end_balance: Decimal,
    pub net_change: Decimal,
    pub transaction_count: usize,
    pub method_counts: MethodCounts,
}

/// The result of `sync_account_balance`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyncResult {
    pub old: Decimal,
    pub new: Decimal,
    pub updated: bool,
}
