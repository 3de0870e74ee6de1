//! Dashboard cards and the recent-transactions list.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::extract::ApiQuery;
use crate::state::AppState;
use kasir_core::dashboard::DashboardStats;
use kasir_core::{TransactionSummary, DEFAULT_RECENT_TRANSACTIONS, MAX_RECENT_TRANSACTIONS};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/stats", get(stats))
        .route("/recent-transactions", get(recent_transactions))
}

#[derive(Debug, Default, Deserialize)]
pub struct RecentQuery {
    pub limit: Option<i64>,
}

impl RecentQuery {
    /// Requested limit clamped to `1..=MAX_RECENT_TRANSACTIONS`.
    pub fn limit(&self) -> i64 {
        self.limit
            .unwrap_or(DEFAULT_RECENT_TRANSACTIONS)
            .clamp(1, MAX_RECENT_TRANSACTIONS)
    }
}

async fn stats(State(state): State<AppState>, _user: AuthUser) -> ApiResult<Json<DashboardStats>> {
    Ok(Json(state.db.dashboard().stats(Utc::now()).await?))
}

async fn recent_transactions(
    State(state): State<AppState>,
    _user: AuthUser,
    ApiQuery(query): ApiQuery<RecentQuery>,
) -> ApiResult<Json<Vec<TransactionSummary>>> {
    Ok(Json(state.db.sales().recent(query.limit()).await?))
}
