//! Checkout and the lookups behind the POS screen.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiQuery};
use crate::state::AppState;
use kasir_core::input::SaleInput;
use kasir_core::{Customer, ProductDetail, TransactionDetail, ValidationError, POS_SEARCH_LIMIT};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/transactions", post(create_transaction))
        .route("/transactions/:id", get(get_transaction))
        .route("/products/search", get(search_products))
        .route("/products/barcode", get(lookup_barcode))
        .route("/customers/search", get(search_customers))
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct BarcodeQuery {
    #[serde(default)]
    pub code: String,
}

async fn create_transaction(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(input): ApiJson<SaleInput>,
) -> ApiResult<(StatusCode, Json<TransactionDetail>)> {
    let detail = state.db.sales().create(&user.id, input).await?;
    state.invalidate_reports();
    Ok((StatusCode::CREATED, Json(detail)))
}

async fn get_transaction(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<TransactionDetail>> {
    Ok(Json(state.db.sales().get_detail(&id).await?))
}

async fn search_products(
    State(state): State<AppState>,
    _user: AuthUser,
    ApiQuery(query): ApiQuery<SearchQuery>,
) -> ApiResult<Json<Vec<ProductDetail>>> {
    let products = state.db.products().search(&query.q, POS_SEARCH_LIMIT).await?;
    Ok(Json(products))
}

async fn lookup_barcode(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(query): ApiQuery<BarcodeQuery>,
) -> ApiResult<Json<ProductDetail>> {
    if query.code.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "code".to_string(),
        }
        .into());
    }
    let product = state.db.barcodes().lookup(&query.code, &user.id).await?;
    Ok(Json(product))
}

async fn search_customers(
    State(state): State<AppState>,
    _user: AuthUser,
    ApiQuery(query): ApiQuery<SearchQuery>,
) -> ApiResult<Json<Vec<Customer>>> {
    let customers = state.db.customers().search(&query.q, POS_SEARCH_LIMIT).await?;
    Ok(Json(customers))
}
