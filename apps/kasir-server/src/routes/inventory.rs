//! Catalogue management and stock adjustments.
//!
//! Reads are open to every logged-in user; writes need ADMIN or MANAGER.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use tracing::info;

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiQuery};
use crate::state::AppState;
use kasir_core::input::{
    CategoryInput, NewProduct, Page, PageRequest, ProductFilter, ProductUpdate,
    StockAdjustmentInput, SupplierInput,
};
use kasir_core::{
    Category, CategoryWithCount, ProductDetail, StockAdjustment, StockMovementDetail, Supplier,
    SupplierWithCount,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/stock/adjust", post(adjust_stock))
        .route("/stock/movements", get(list_movements))
        .route("/products", get(list_products).post(create_product))
        .route(
            "/products/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
        .route("/categories", get(list_categories).post(create_category))
        .route("/categories/:id", put(update_category).delete(delete_category))
        .route("/suppliers", get(list_suppliers).post(create_supplier))
        .route("/suppliers/:id", put(update_supplier).delete(delete_supplier))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovementQuery {
    pub product_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    #[serde(default)]
    pub include_inactive: bool,
}

// =============================================================================
// Stock
// =============================================================================

async fn adjust_stock(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(input): ApiJson<StockAdjustmentInput>,
) -> ApiResult<Json<StockAdjustment>> {
    user.require_inventory_manager()?;
    let adjustment = state.db.stock().adjust(&user.id, input).await?;
    state.invalidate_reports();
    Ok(Json(adjustment))
}

async fn list_movements(
    State(state): State<AppState>,
    _user: AuthUser,
    ApiQuery(query): ApiQuery<MovementQuery>,
    ApiQuery(page): ApiQuery<PageRequest>,
) -> ApiResult<Json<Page<StockMovementDetail>>> {
    page.validate()?;
    let movements = state
        .db
        .stock()
        .movements(query.product_id.as_deref(), page)
        .await?;
    Ok(Json(movements))
}

// =============================================================================
// Products
// =============================================================================

async fn list_products(
    State(state): State<AppState>,
    _user: AuthUser,
    ApiQuery(filter): ApiQuery<ProductFilter>,
    ApiQuery(page): ApiQuery<PageRequest>,
) -> ApiResult<Json<Page<ProductDetail>>> {
    page.validate()?;
    Ok(Json(state.db.products().list(&filter, page).await?))
}

async fn create_product(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(input): ApiJson<NewProduct>,
) -> ApiResult<(StatusCode, Json<ProductDetail>)> {
    user.require_inventory_manager()?;
    let product = state.db.products().create(&user.id, input).await?;
    info!(product_id = %product.product.id, sku = %product.product.sku, user = %user.username, "Product created");
    state.invalidate_reports();
    Ok((StatusCode::CREATED, Json(product)))
}

async fn get_product(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<ProductDetail>> {
    Ok(Json(state.db.products().get_detail(&id).await?))
}

async fn update_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<ProductUpdate>,
) -> ApiResult<Json<ProductDetail>> {
    user.require_inventory_manager()?;
    let product = state.db.products().update(&id, input).await?;
    state.invalidate_reports();
    Ok(Json(product))
}

async fn delete_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    user.require_inventory_manager()?;
    state.db.products().soft_delete(&id).await?;
    info!(product_id = %id, user = %user.username, "Product deactivated");
    state.invalidate_reports();
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Categories
// =============================================================================

async fn list_categories(
    State(state): State<AppState>,
    _user: AuthUser,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> ApiResult<Json<Vec<CategoryWithCount>>> {
    Ok(Json(state.db.categories().list(query.include_inactive).await?))
}

async fn create_category(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(input): ApiJson<CategoryInput>,
) -> ApiResult<(StatusCode, Json<Category>)> {
    user.require_inventory_manager()?;
    let category = state.db.categories().create(&input).await?;
    state.invalidate_reports();
    Ok((StatusCode::CREATED, Json(category)))
}

async fn update_category(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<CategoryInput>,
) -> ApiResult<Json<Category>> {
    user.require_inventory_manager()?;
    let category = state.db.categories().update(&id, &input).await?;
    state.invalidate_reports();
    Ok(Json(category))
}

async fn delete_category(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    user.require_inventory_manager()?;
    state.db.categories().soft_delete(&id).await?;
    state.invalidate_reports();
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Suppliers
// =============================================================================

async fn list_suppliers(
    State(state): State<AppState>,
    _user: AuthUser,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> ApiResult<Json<Vec<SupplierWithCount>>> {
    Ok(Json(state.db.suppliers().list(query.include_inactive).await?))
}

async fn create_supplier(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(input): ApiJson<SupplierInput>,
) -> ApiResult<(StatusCode, Json<Supplier>)> {
    user.require_inventory_manager()?;
    let supplier = state.db.suppliers().create(&input).await?;
    state.invalidate_reports();
    Ok((StatusCode::CREATED, Json(supplier)))
}

async fn update_supplier(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<SupplierInput>,
) -> ApiResult<Json<Supplier>> {
    user.require_inventory_manager()?;
    let supplier = state.db.suppliers().update(&id, &input).await?;
    state.invalidate_reports();
    Ok(Json(supplier))
}

async fn delete_supplier(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    user.require_inventory_manager()?;
    state.db.suppliers().soft_delete(&id).await?;
    state.invalidate_reports();
    Ok(StatusCode::NO_CONTENT)
}
