//! # Repository Module
//!
//! Database repository implementations for Kasir POS.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  HTTP handler                                                          │
//! │       │                                                                 │
//! │       │  state.db.sales().create(&user.id, input)                      │
//! │       ▼                                                                 │
//! │  SaleRepository                                                        │
//! │  ├── create(&self, user_id, input)   ← one unit of work               │
//! │  ├── get_detail(&self, id)                                             │
//! │  └── list(&self, filter, range, page)                                  │
//! │       │                                                                 │
//! │       │  SQL (sqlx::query_as / QueryBuilder)                           │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`UserRepository`] - Login lookups and account creation
//! - [`CategoryRepository`] / [`SupplierRepository`] - Reference data
//! - [`CustomerRepository`] - Customer CRUD and POS search
//! - [`ProductRepository`] - Catalogue CRUD, listing and POS search
//! - [`SaleRepository`] - Atomic checkout and transaction reads
//! - [`StockRepository`] - Manual stock adjustments and the movement ledger
//! - [`BarcodeRepository`] - Barcode lookups with scan logging
//! - [`ReportRepository`] - Report source rows and listing reports
//! - [`DashboardRepository`] - Dashboard counters

pub mod barcode;
pub mod category;
pub mod customer;
pub mod dashboard;
pub mod product;
pub mod report;
pub mod sale;
pub mod stock;
pub mod supplier;
pub mod user;

pub use barcode::BarcodeRepository;
pub use category::CategoryRepository;
pub use customer::CustomerRepository;
pub use dashboard::DashboardRepository;
pub use product::ProductRepository;
pub use report::ReportRepository;
pub use sale::SaleRepository;
pub use stock::StockRepository;
pub use supplier::SupplierRepository;
pub use user::UserRepository;

use kasir_core::input::non_empty;
use sqlx::SqliteConnection;
use uuid::Uuid;

use crate::error::{DbError, DbResult};

/// Generates a new primary key.
pub(crate) fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Fails with `NotFound` unless `table` holds an active row with `id`.
///
/// `table` is always a literal from this crate, never user input.
pub(crate) async fn ensure_active(
    conn: &mut SqliteConnection,
    table: &'static str,
    entity: &'static str,
    id: &str,
) -> DbResult<()> {
    let sql = format!("SELECT COUNT(*) FROM {table} WHERE id = ? AND is_active = 1");
    let found: i64 = sqlx::query_scalar(&sql)
        .bind(id)
        .fetch_one(&mut *conn)
        .await?;

    if found == 0 {
        return Err(DbError::not_found(entity, id));
    }
    Ok(())
}

/// Owned, trimmed optional text; blank becomes `None`.
pub(crate) fn optional_text(value: &Option<String>) -> Option<String> {
    non_empty(value).map(str::to_string)
}

/// Escapes `%`, `_` and `\` for a `LIKE ... ESCAPE '\'` pattern and wraps
/// the term in wildcards.
pub(crate) fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}
