//! Cube maintenance engine (C3): weekly/monthly regeneration target
//! identification, consistency checking, and backfill batching.
//!
//! Pure logic only; the `db` crate owns the aggregation queries and the
//! persisted cube table itself, calling into this module to decide which
//! cells need recomputing and whether the result agrees with the ledger.

pub mod consistency;
pub mod error;
pub mod targets;
pub mod types;

#[cfg(test)]
mod targets_props;

pub use consistency::ConsistencyChecker;
pub use error::CubeError;
pub use targets::TargetPlanner;
pub use types::*;
