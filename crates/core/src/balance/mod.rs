//! Balance engine (C2): balance-at-date reconstruction, running balances,
//! daily history series, and summary/sync computations.
//!
//! Pure logic only; the `db` crate fetches postings and anchors and calls
//! into this module to decide balances.

pub mod engine;
pub mod error;
pub mod types;

#[cfg(test)]
mod ordering_props;

pub use engine::BalanceEngine;
pub use error::BalanceError;
pub use types::*;
