//! Database layer: `SeaORM` entities, migrations, and repositories.
//!
//! This crate is the only one in the workspace that talks to Postgres. It
//! translates between persisted rows and the pure domain types in
//! `ledgercube_core`, and is where the C3 regeneration procedure and the C2
//! balance queries are actually wired to storage.

pub mod entities;
pub mod error;
pub mod migration;
pub mod repositories;

pub use error::RepoError;
pub use repositories::{
    AccountRepository, BalanceAnchorRepository, BalanceRepository, CategoryRepository,
    CubeRepository, TransactionRepository,
};

use std::future::Future;

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DatabaseTransaction, DbErr, TransactionTrait};

/// Establishes a connection pool to the database, sized per configuration.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(
    database_url: &str,
    max_connections: u32,
    min_connections: u32,
) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(database_url);
    opt.max_connections(max_connections)
        .min_connections(min_connections)
        .sqlx_logging(true);
    Database::connect(opt).await
}

/// Runs `f` inside a single database transaction, committing on success.
///
/// Mirrors the teacher's `begin` -> run queries against the txn -> `commit`
/// lifecycle, except the bound is an explicit closure rather than a
/// Postgres session variable: callers scope every statement themselves via
/// the `TenantCtx` they already hold, instead of relying on a decorator to
/// set it. If `f` returns `Err`, the transaction is dropped without being
/// committed and Postgres rolls it back.
///
/// Repositories that touch more than one table (applying a
/// [`ledgercube_core::ledger::ChangeDescriptor`] and the cube cells it
/// affects, for instance) use this instead of managing `begin`/`commit` by
/// hand at every call site.
///
/// # Errors
///
/// Propagates whatever error `f` produces, or a [`DbErr`] if the transaction
/// itself cannot be opened or committed.
pub async fn with_transaction<T, E, F, Fut>(db: &DatabaseConnection, f: F) -> Result<T, E>
where
    F: FnOnce(DatabaseTransaction) -> Fut,
    Fut: Future<Output = Result<(T, DatabaseTransaction), E>>,
    E: From<DbErr>,
{
    let txn = db.begin().await.map_err(E::from)?;
    let (value, txn) = f(txn).await?;
    txn.commit().await.map_err(E::from)?;
    Ok(value)
}
