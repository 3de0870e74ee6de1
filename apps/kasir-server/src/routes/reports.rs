//! # Reports and Exports
//!
//! Sales and transaction reports are served from the report cache when the
//! same query shape was answered within the cache TTL:
//!
//! ```text
//! GET /api/reports/sales?startDate=2026-10-01&endDate=2026-10-16
//!      │
//!      ▼
//! cache_key("sales", ["2026-10-01..2026-10-16"])
//!      │
//!      ├── hit  ──► cached JSON
//!      └── miss ──► ReportRepository ──► serialize ──► cache.set ──► JSON
//! ```
//!
//! Any sale, stock adjustment or master-data write clears the cache.

use std::future::Future;

use axum::extract::State;
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::extract::ApiQuery;
use crate::state::AppState;
use kasir_core::cache::cache_key;
use kasir_core::export::{self, ExportTable};
use kasir_core::input::{DateParams, InventoryFilter, Page, PageRequest, TransactionFilter};
use kasir_core::report::{CustomerReportRow, DateRange, InventoryReport};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/sales", get(sales_report))
        .route("/transactions", get(transactions_report))
        .route("/inventory", get(inventory_report))
        .route("/customers", get(customers_report))
        .route("/export", get(export_report))
}

fn date_range(dates: &DateParams) -> ApiResult<DateRange> {
    Ok(DateRange::from_dates(
        dates.start_date,
        dates.end_date,
        Utc::now().date_naive(),
    )?)
}

/// Serves `key` from the cache, or runs `load` and caches its JSON.
async fn cached<T, F, Fut>(state: &AppState, key: String, load: F) -> ApiResult<Json<Value>>
where
    T: Serialize,
    F: FnOnce() -> Fut,
    Fut: Future<Output = ApiResult<T>>,
{
    if let Some(hit) = state.cache.get(&key) {
        debug!(key = %key, "Report cache hit");
        return Ok(Json(hit));
    }

    let value = serde_json::to_value(load().await?).map_err(ApiError::internal)?;
    debug!(key = %key, "Report cache miss");
    state.cache.set(key, value.clone());
    Ok(Json(value))
}

// =============================================================================
// Reports
// =============================================================================

async fn sales_report(
    State(state): State<AppState>,
    _user: AuthUser,
    ApiQuery(dates): ApiQuery<DateParams>,
) -> ApiResult<Json<Value>> {
    let range = date_range(&dates)?;
    let key = cache_key("sales", &[&range.label()]);

    cached(&state, key, || async {
        Ok::<_, ApiError>(state.db.reports().sales_report(range).await?)
    })
    .await
}

async fn transactions_report(
    State(state): State<AppState>,
    _user: AuthUser,
    ApiQuery(dates): ApiQuery<DateParams>,
    ApiQuery(filter): ApiQuery<TransactionFilter>,
    ApiQuery(page): ApiQuery<PageRequest>,
) -> ApiResult<Json<Value>> {
    page.validate()?;
    let range = date_range(&dates)?;

    let key = cache_key(
        "transactions",
        &[
            &range.label(),
            filter.status.map(|s| s.as_str()).unwrap_or("all"),
            filter.payment_method.map(|m| m.as_str()).unwrap_or("all"),
            filter.user_id.as_deref().unwrap_or("all"),
            &format!("p{}", page.page),
            &format!("l{}", page.limit),
        ],
    );

    cached(&state, key, || async {
        Ok::<_, ApiError>(state.db.sales().list(&filter, &range, page).await?)
    })
    .await
}

async fn inventory_report(
    State(state): State<AppState>,
    _user: AuthUser,
    ApiQuery(filter): ApiQuery<InventoryFilter>,
    ApiQuery(page): ApiQuery<PageRequest>,
) -> ApiResult<Json<InventoryReport>> {
    page.validate()?;
    Ok(Json(state.db.reports().inventory(&filter, page).await?))
}

async fn customers_report(
    State(state): State<AppState>,
    _user: AuthUser,
    ApiQuery(dates): ApiQuery<DateParams>,
    ApiQuery(page): ApiQuery<PageRequest>,
) -> ApiResult<Json<Page<CustomerReportRow>>> {
    page.validate()?;
    let range = date_range(&dates)?;
    Ok(Json(state.db.reports().customers(&range, page).await?))
}

// =============================================================================
// Export
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExportKind {
    Sales,
    TopProducts,
    Transactions,
    Inventory,
    Customers,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    pub report: ExportKind,
    #[serde(default)]
    pub format: ExportFormat,
}

async fn export_table(
    state: &AppState,
    kind: ExportKind,
    range: DateRange,
    transactions: &TransactionFilter,
    inventory: &InventoryFilter,
) -> ApiResult<ExportTable> {
    let table = match kind {
        ExportKind::Sales => export::sales_table(&state.db.reports().sales_report(range).await?),
        ExportKind::TopProducts => {
            export::top_products_table(&state.db.reports().sales_report(range).await?)
        }
        ExportKind::Transactions => {
            let rows = state.db.sales().list_all(transactions, &range).await?;
            export::transactions_table(&range, &rows)
        }
        ExportKind::Inventory => {
            export::inventory_table(&state.db.reports().inventory_all(inventory).await?)
        }
        ExportKind::Customers => {
            let rows = state.db.reports().customers_all(&range).await?;
            export::customers_table(&range, &rows)
        }
    };
    Ok(table)
}

/// `GET /api/reports/export?report=sales&format=csv`
///
/// CSV is rendered here; `format=json` returns the shaped table for the
/// client to render as PDF or a spreadsheet.
async fn export_report(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(query): ApiQuery<ExportQuery>,
    ApiQuery(dates): ApiQuery<DateParams>,
    ApiQuery(transactions): ApiQuery<TransactionFilter>,
    ApiQuery(inventory): ApiQuery<InventoryFilter>,
) -> ApiResult<Response> {
    let range = date_range(&dates)?;
    let table = export_table(&state, query.report, range, &transactions, &inventory).await?;
    debug!(report = ?query.report, rows = table.rows.len(), user = %user.username, "Exporting report");

    let response = match query.format {
        ExportFormat::Json => Json(table).into_response(),
        ExportFormat::Csv => {
            let disposition = format!("attachment; filename=\"{}\"", table.file_name("csv"));
            (
                [
                    (CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
                    (CONTENT_DISPOSITION, disposition),
                ],
                table.to_csv(),
            )
                .into_response()
        }
    };
    Ok(response)
}
