//! # HTTP Routes
//!
//! ```text
//! /health                          liveness + database ping
//! /api/auth/...                    login, logout, me
//! /api/sales/...                   checkout and POS lookups
//! /api/inventory/...               catalogue and stock
//! /api/customers/...               customer management
//! /api/reports/...                 reports and exports
//! /api/dashboard/...               dashboard cards
//! ```
//!
//! Every route except `/health` and `POST /api/auth/login` takes an
//! [`AuthUser`](crate::auth::AuthUser) and therefore requires a session.

pub mod auth;
pub mod customers;
pub mod dashboard;
pub mod inventory;
pub mod reports;
pub mod sales;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

use crate::state::AppState;

/// All routes, without middleware layers.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .nest("/api/auth", auth::routes())
        .nest("/api/sales", sales::routes())
        .nest("/api/inventory", inventory::routes())
        .nest("/api/customers", customers::routes())
        .nest("/api/reports", reports::routes())
        .nest("/api/dashboard", dashboard::routes())
}

async fn health(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    if state.db.health_check().await {
        (StatusCode::OK, Json(json!({ "status": "ok", "database": "ok" })))
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "degraded", "database": "unavailable" })),
        )
    }
}
