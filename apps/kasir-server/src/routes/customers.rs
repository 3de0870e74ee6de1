//! Customer management.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiQuery};
use crate::state::AppState;
use kasir_core::input::{CustomerInput, Page, PageRequest};
use kasir_core::Customer;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_customers).post(create_customer))
        .route(
            "/:id",
            get(get_customer).put(update_customer).delete(delete_customer),
        )
}

#[derive(Debug, Default, Deserialize)]
pub struct CustomerQuery {
    /// Matches name, email or phone.
    pub search: Option<String>,
}

async fn list_customers(
    State(state): State<AppState>,
    _user: AuthUser,
    ApiQuery(query): ApiQuery<CustomerQuery>,
    ApiQuery(page): ApiQuery<PageRequest>,
) -> ApiResult<Json<Page<Customer>>> {
    page.validate()?;
    let customers = state
        .db
        .customers()
        .list(query.search.as_deref(), page)
        .await?;
    Ok(Json(customers))
}

async fn create_customer(
    State(state): State<AppState>,
    _user: AuthUser,
    ApiJson(input): ApiJson<CustomerInput>,
) -> ApiResult<(StatusCode, Json<Customer>)> {
    let customer = state.db.customers().create(&input).await?;
    state.invalidate_reports();
    Ok((StatusCode::CREATED, Json(customer)))
}

async fn get_customer(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Customer>> {
    Ok(Json(state.db.customers().get(&id).await?))
}

async fn update_customer(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<CustomerInput>,
) -> ApiResult<Json<Customer>> {
    let customer = state.db.customers().update(&id, &input).await?;
    state.invalidate_reports();
    Ok(Json(customer))
}

async fn delete_customer(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.db.customers().soft_delete(&id).await?;
    state.invalidate_reports();
    Ok(StatusCode::NO_CONTENT)
}
