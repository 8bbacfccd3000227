//! Ledger service (C1): validated CRUD logic for accounts, categories, and
//! transactions, plus reconciliation planning and bulk-update preconditions.
//!
//! This module holds pure decision logic only; the `db` crate's repositories
//! perform the actual queries and call back into it for validation and
//! planning before committing a change.

pub mod error;
pub mod service;
pub mod types;

pub use error::LedgerError;
pub use service::{AdjustmentPlan, LedgerService, ReconciliationPlan};
pub use types::*;
