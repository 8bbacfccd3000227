//! Common types used across the application.

pub mod decimal;
pub mod id;
pub mod tenant;

pub use decimal::{approx_eq, round2, AMOUNT_EPSILON};
pub use id::*;
pub use tenant::TenantCtx;
