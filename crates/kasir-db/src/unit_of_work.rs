//! # Unit of Work
//!
//! All-or-nothing execution of several statements over one SQLite
//! transaction.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  unit_of_work(|conn| Box::pin(async move { ... }))                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  BEGIN                                                                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  work(conn)  ── INSERT transaction, items, UPDATE stock, movements ──   │
//! │       │                                                                 │
//! │       ├── Ok(value)  → COMMIT   → Ok(value)                             │
//! │       │                                                                 │
//! │       └── Err(err)   → ROLLBACK → Err(err)                              │
//! │                        (no row written by `work` survives)             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Business failures travel as ordinary errors: a repository helper that
//! returns `DbError::Core(CoreError::InsufficientStock { .. })` aborts the
//! whole unit through `?`.
//!
//! The closure receives a `&mut SqliteConnection` borrowed for the
//! transaction's lifetime; anything it needs from the caller must be moved
//! into the `async move` block as owned data.

use futures_util::future::BoxFuture;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, warn};

use crate::error::DbError;

/// Future returned by the body of a unit of work.
pub type UnitOfWork<'c, T, E> = BoxFuture<'c, Result<T, E>>;

/// Runs `work` inside a transaction on a connection from `pool`.
///
/// ## Example
/// ```rust,ignore
/// let moved = unit_of_work::run(&pool, |conn| {
///     Box::pin(async move {
///         sqlx::query("UPDATE products SET stock = stock - 1 WHERE id = ?")
///             .bind(product_id)
///             .execute(&mut *conn)
///             .await?;
///         Ok::<_, DbError>(())
///     })
/// })
/// .await?;
/// ```
pub async fn run<T, E, F>(pool: &SqlitePool, work: F) -> Result<T, E>
where
    F: for<'c> FnOnce(&'c mut SqliteConnection) -> UnitOfWork<'c, T, E>,
    E: From<DbError>,
{
    let mut tx = pool.begin().await.map_err(|e| E::from(DbError::from(e)))?;
    debug!("Unit of work started");

    match work(&mut *tx).await {
        Ok(value) => {
            tx.commit()
                .await
                .map_err(|e| E::from(DbError::TransactionFailed(e.to_string())))?;
            debug!("Unit of work committed");
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                // The connection is discarded by the pool; SQLite drops the
                // open transaction with it.
                warn!(error = %rollback_err, "Rollback failed");
            } else {
                debug!("Unit of work rolled back");
            }
            Err(err)
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
