//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations, hiding
//! the `SeaORM` implementation details from the rest of the application.
//! One file per entity, following the teacher's convention.

pub mod account;
pub mod balance;
pub mod balance_anchor;
pub mod category;
pub mod cube;
pub mod transaction;

pub use account::{AccountRepository, ReconcileOutcome};
pub use balance::BalanceRepository;
pub use balance_anchor::BalanceAnchorRepository;
pub use category::CategoryRepository;
pub use cube::{CubeChange, CubeRepository};
pub use transaction::{BulkOutcome, TransactionRepository};
