//! # Schema Migrations
//!
//! The SQL files under `migrations/sqlite/` are compiled into the binary, so
//! a fresh `kasir.db` (or `:memory:` in tests) gets the full schema on open.
//!
//! ```text
//! migrations/sqlite/
//!   0001_initial_schema.sql   users, catalogue, customers, transactions,
//!                             stock ledger, barcode log
//! ```
//!
//! Applied files are recorded with their checksum in `_sqlx_migrations`.
//! Schema changes go into a new `NNNN_description.sql`; an applied file must
//! stay byte-for-byte unchanged or startup fails with a checksum mismatch.

use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::DbResult;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Applies every embedded migration not yet recorded in the store.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    debug!(embedded = MIGRATOR.migrations.len(), "Running migrations");
    MIGRATOR.run(pool).await?;
    info!("Schema up to date");
    Ok(())
}

/// `(embedded, applied)` migration counts.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<(usize, usize)> {
    let applied: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = 1")
            .fetch_one(pool)
            .await?;

    Ok((MIGRATOR.migrations.len(), applied as usize))
}
