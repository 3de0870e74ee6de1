//! # Store Errors
//!
//! Everything a repository call can fail with, including business-rule
//! rejections raised in the middle of a unit of work.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Failure Layers                                       │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)        Business rule (CoreError)           │
//! │       │                                   │                             │
//! │       ▼                                   ▼                             │
//! │  DbError (this module) ◄──────────── DbError::Core                     │
//! │       │                                                                 │
//! │       │  returned from a unit of work → transaction rolled back        │
//! │       ▼                                                                 │
//! │  ApiError (kasir-server) ← status code + Indonesian message            │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use kasir_core::CoreError;
use thiserror::Error;

/// Failure of a repository call.
#[derive(Debug, Error)]
pub enum DbError {
    /// No row with that id, or only a soft-deleted one where an active row
    /// is required.
    #[error("{entity} {id} does not exist")]
    NotFound { entity: String, id: String },

    /// SKU, barcode, username, category name or customer email taken.
    #[error("{field} '{value}' is already in use")]
    UniqueViolation { field: String, value: String },

    /// Reference to a category, supplier, customer or user that is gone.
    #[error("Broken reference: {message}")]
    ForeignKeyViolation { message: String },

    /// E.g. deleting a category that still has active products.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A business rule rejected the operation inside a unit of work.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The file could not be opened or created.
    #[error("Cannot open database: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// BEGIN or COMMIT failed.
    #[error("Unit of work failed: {0}")]
    TransactionFailed(String),

    /// No connection freed up within the acquire timeout.
    #[error("All database connections are busy")]
    PoolExhausted,

    #[error("Database error: {0}")]
    Internal(String),
}

impl DbError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Fills in the offending value of a UniqueViolation raised by SQLite,
    /// which only reports the column.
    pub fn with_value(self, field: &str, value: &str) -> Self {
        match self {
            DbError::UniqueViolation { field: column, .. } if column == field => {
                DbError::duplicate(column, value)
            }
            other => other,
        }
    }
}

/// Classifies driver errors. SQLite reports constraint failures only as
/// message text, so the message is inspected.
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound {
                entity: "Record".to_string(),
                id: "unknown".to_string(),
            },

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                // SQLite constraint messages:
                // "UNIQUE constraint failed: products.sku"
                // "FOREIGN KEY constraint failed"
                if let Some(target) = msg.strip_prefix("UNIQUE constraint failed: ") {
                    let column = target
                        .split(',')
                        .next()
                        .and_then(|qualified| qualified.trim().split('.').nth(1))
                        .unwrap_or("unknown")
                        .to_string();
                    DbError::UniqueViolation {
                        field: column,
                        value: "unknown".to_string(),
                    }
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("pool closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

impl From<kasir_core::ValidationError> for DbError {
    fn from(err: kasir_core::ValidationError) -> Self {
        DbError::Core(CoreError::Validation(err))
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;
