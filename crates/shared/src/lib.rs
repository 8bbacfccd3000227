//! Shared types, errors, and configuration for Ledgercube.
//!
//! This crate provides common types used across the `core` and `db` crates:
//! - Typed IDs for type-safe entity references
//! - Decimal/date helpers for money math (no floats, ever)
//! - The tenant-scoping context threaded through every core/db API
//! - Application-wide error types
//! - Configuration management

pub mod config;
pub mod error;
pub mod types;

pub use config::{AppConfig, CubeConfig};
pub use error::{AppError, AppResult};
pub use types::*;
