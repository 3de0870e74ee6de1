//! # Product Repository
//!
//! Database operations for the product catalogue.
//!
//! ## Key Operations
//! - Paginated listing with dynamic filters (search, category, low stock)
//! - POS search and barcode lookup
//! - Create (with the opening-stock movement), partial update, soft delete
//!
//! ## Stock Is Not Edited Here
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Who Writes products.stock                            │
//! │                                                                         │
//! │  create()          → initial stock + IN movement "Stok awal"           │
//! │  SaleRepository    → guarded decrement + SALE movement                 │
//! │  StockRepository   → IN / OUT / ADJUSTMENT + movement                  │
//! │                                                                         │
//! │  update() never touches stock: every change has a ledger entry.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::stock::{new_movement, record_movement};
use crate::repository::{ensure_active, like_pattern, new_id, optional_text};
use crate::unit_of_work;
use kasir_core::input::{NewProduct, Page, PageRequest, ProductFilter, ProductUpdate};
use kasir_core::validation;
use kasir_core::{MovementType, NamedRef, Product, ProductDetail};

/// Reason recorded on the IN movement written for a new product's stock.
pub const OPENING_STOCK_REASON: &str = "Stok awal";

pub(crate) const PRODUCT_COLUMNS: &str = r#"
    p.id, p.sku, p.barcode, p.name, p.description, p.price, p.cost,
    p.stock, p.min_stock, p.max_stock, p.unit, p.category_id, p.supplier_id,
    p.is_active, p.created_at, p.updated_at"#;

/// Product joined with its category and supplier names. Filters are
/// appended after `WHERE 1 = 1`.
pub(crate) fn detail_select() -> String {
    format!(
        r#"
        SELECT {PRODUCT_COLUMNS},
            c.name AS category_name,
            s.name AS supplier_name
        FROM products p
        LEFT JOIN categories c ON c.id = p.category_id
        LEFT JOIN suppliers s ON s.id = p.supplier_id
        WHERE 1 = 1"#
    )
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ProductDetailRow {
    #[sqlx(flatten)]
    product: Product,
    category_name: Option<String>,
    supplier_name: Option<String>,
}

impl From<ProductDetailRow> for ProductDetail {
    fn from(row: ProductDetailRow) -> Self {
        let category = row.category_name.map(|name| NamedRef {
            id: row.product.category_id.clone(),
            name,
        });
        let supplier = row
            .product
            .supplier_id
            .clone()
            .zip(row.supplier_name)
            .map(|(id, name)| NamedRef { id, name });
        let stock_status = row.product.stock_status();

        ProductDetail {
            product: row.product,
            category,
            supplier,
            stock_status,
        }
    }
}

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = ProductRepository::new(pool);
///
/// // Checkout search box
/// let results = repo.search("indomie", 20).await?;
///
/// // Catalogue page
/// let page = repo.list(&ProductFilter::default(), PageRequest::default()).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Lists products with category and supplier, ordered by name.
    pub async fn list(&self, filter: &ProductFilter, page: PageRequest) -> DbResult<Page<ProductDetail>> {
        let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM products p WHERE 1 = 1");
        push_filters(&mut count, filter);
        let total = count.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

        let mut rows = QueryBuilder::<Sqlite>::new(detail_select());
        push_filters(&mut rows, filter);
        rows.push(" ORDER BY p.name LIMIT ")
            .push_bind(page.limit)
            .push(" OFFSET ")
            .push_bind(page.offset());

        let products: Vec<ProductDetail> = rows
            .build_query_as::<ProductDetailRow>()
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(ProductDetail::from)
            .collect();

        debug!(total, returned = products.len(), "Listed products");
        Ok(Page::new(products, page, total))
    }

    /// Gets a product (active or not) with its category and supplier.
    pub async fn get_detail(&self, id: &str) -> DbResult<ProductDetail> {
        let mut conn = self.pool.acquire().await?;
        fetch_detail(&mut conn, id).await
    }

    /// Searches active products by name, SKU or barcode for the checkout
    /// screen. Out-of-stock products are included so the cashier sees them.
    ///
    /// ## Arguments
    /// * `query` - Search term, matched anywhere in the field
    /// * `limit` - Maximum results to return
    pub async fn search(&self, query: &str, limit: i64) -> DbResult<Vec<ProductDetail>> {
        let filter = ProductFilter {
            search: Some(query.to_string()),
            ..ProductFilter::default()
        };

        let mut builder = QueryBuilder::<Sqlite>::new(detail_select());
        push_filters(&mut builder, &filter);
        builder.push(" ORDER BY p.name LIMIT ").push_bind(limit);

        let products: Vec<ProductDetail> = builder
            .build_query_as::<ProductDetailRow>()
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(ProductDetail::from)
            .collect();

        debug!(query = %query.trim(), count = products.len(), "Search returned products");
        Ok(products)
    }

    /// Finds the active product carrying `barcode`.
    pub async fn find_by_barcode(&self, barcode: &str) -> DbResult<Option<ProductDetail>> {
        let mut builder = QueryBuilder::<Sqlite>::new(detail_select());
        builder
            .push(" AND p.is_active = 1 AND p.barcode = ")
            .push_bind(barcode.trim().to_string());

        let product = builder
            .build_query_as::<ProductDetailRow>()
            .fetch_optional(&self.pool)
            .await?
            .map(ProductDetail::from);

        Ok(product)
    }

    /// Creates a product.
    ///
    /// ## What This Does
    /// 1. Validates the input
    /// 2. Checks the category (and supplier, if given) is active
    /// 3. Inserts the product
    /// 4. If the initial stock is above zero, records an IN movement
    ///    "Stok awal" in the same unit of work
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - SKU or barcode already exists
    /// * `Err(DbError::NotFound)` - category or supplier missing or inactive
    pub async fn create(&self, user_id: &str, input: NewProduct) -> DbResult<ProductDetail> {
        input.validate()?;
        debug!(sku = %input.sku, "Inserting product");

        let now = Utc::now();
        let product = Product {
            id: new_id(),
            sku: input.sku.trim().to_string(),
            barcode: optional_text(&input.barcode),
            name: input.name.trim().to_string(),
            description: optional_text(&input.description),
            price: input.price,
            cost: input.cost,
            stock: input.stock,
            min_stock: input.min_stock,
            max_stock: input.max_stock,
            unit: optional_text(&input.unit).unwrap_or_else(|| "pcs".to_string()),
            category_id: input.category_id.trim().to_string(),
            supplier_id: optional_text(&input.supplier_id),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        let sku = product.sku.clone();
        let barcode = product.barcode.clone().unwrap_or_default();
        let user_id = user_id.to_string();

        let detail = unit_of_work::run(&self.pool, |conn| {
            Box::pin(async move {
                ensure_active(conn, "categories", "Category", &product.category_id).await?;
                if let Some(supplier_id) = &product.supplier_id {
                    ensure_active(conn, "suppliers", "Supplier", supplier_id).await?;
                }

                insert_product(conn, &product).await?;

                if product.stock > 0 {
                    let movement = new_movement(
                        &product.id,
                        &user_id,
                        MovementType::In,
                        product.stock,
                        OPENING_STOCK_REASON,
                        None,
                    );
                    record_movement(conn, &movement).await?;
                }

                fetch_detail(conn, &product.id).await
            })
        })
        .await
        .map_err(|e: DbError| e.with_value("sku", &sku).with_value("barcode", &barcode))?;

        info!(id = %detail.product.id, sku = %detail.product.sku, "Product created");
        Ok(detail)
    }

    /// Applies a partial update. Stock is never changed here.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - product, new category or new supplier missing
    /// * `Err(DbError::UniqueViolation)` - new SKU or barcode taken
    pub async fn update(&self, id: &str, input: ProductUpdate) -> DbResult<ProductDetail> {
        input.validate()?;
        debug!(id = %id, "Updating product");

        let id = id.to_string();
        let sku = input.sku.clone().unwrap_or_default();
        let barcode = input.barcode.clone().unwrap_or_default();

        let detail = unit_of_work::run(&self.pool, |conn| {
            Box::pin(async move {
                let mut product = fetch_product(conn, &id).await?;

                if let Some(sku) = optional_text(&input.sku) {
                    product.sku = sku;
                }
                if input.barcode.is_some() {
                    product.barcode = optional_text(&input.barcode);
                }
                if let Some(name) = optional_text(&input.name) {
                    product.name = name;
                }
                if input.description.is_some() {
                    product.description = optional_text(&input.description);
                }
                if let Some(price) = input.price {
                    product.price = price;
                }
                if let Some(cost) = input.cost {
                    product.cost = cost;
                }
                if let Some(min_stock) = input.min_stock {
                    product.min_stock = min_stock;
                }
                if let Some(max_stock) = input.max_stock {
                    product.max_stock = Some(max_stock);
                }
                if let Some(unit) = optional_text(&input.unit) {
                    product.unit = unit;
                }
                if let Some(category_id) = optional_text(&input.category_id) {
                    if category_id != product.category_id {
                        ensure_active(conn, "categories", "Category", &category_id).await?;
                        product.category_id = category_id;
                    }
                }
                if input.supplier_id.is_some() {
                    let supplier_id = optional_text(&input.supplier_id);
                    if let Some(supplier_id) = &supplier_id {
                        if product.supplier_id.as_ref() != Some(supplier_id) {
                            ensure_active(conn, "suppliers", "Supplier", supplier_id).await?;
                        }
                    }
                    product.supplier_id = supplier_id;
                }
                if let Some(is_active) = input.is_active {
                    product.is_active = is_active;
                }
                validation::validate_stock_bounds(product.min_stock, product.max_stock)?;
                product.updated_at = Utc::now();

                update_product(conn, &product).await?;
                fetch_detail(conn, &product.id).await
            })
        })
        .await
        .map_err(|e: DbError| e.with_value("sku", &sku).with_value("barcode", &barcode))?;

        info!(id = %detail.product.id, "Product updated");
        Ok(detail)
    }

    /// Deactivates a product. History (sales, movements) keeps the row.
    pub async fn soft_delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE products SET is_active = 0, updated_at = ? WHERE id = ? AND is_active = 1",
        )
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        info!(id = %id, "Product deactivated");
        Ok(())
    }
}

// =============================================================================
// In-transaction helpers
// =============================================================================

/// Appends the `WHERE` conditions for a product filter (table alias `p`).
pub(crate) fn push_filters(builder: &mut QueryBuilder<'_, Sqlite>, filter: &ProductFilter) {
    if !filter.include_inactive {
        builder.push(" AND p.is_active = 1");
    }
    if let Some(term) = filter.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        let pattern = like_pattern(term);
        builder
            .push(" AND (p.name LIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\' OR p.sku LIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\' OR p.barcode LIKE ")
            .push_bind(pattern)
            .push(" ESCAPE '\\')");
    }
    if let Some(category_id) = filter.category_id.as_deref().filter(|id| !id.is_empty()) {
        builder
            .push(" AND p.category_id = ")
            .push_bind(category_id.to_string());
    }
    if filter.low_stock {
        builder.push(" AND p.stock <= p.min_stock");
    }
}

pub(crate) async fn fetch_product(conn: &mut SqliteConnection, id: &str) -> DbResult<Product> {
    let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products p WHERE p.id = ?");
    sqlx::query_as::<_, Product>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| DbError::not_found("Product", id))
}

pub(crate) async fn fetch_detail(conn: &mut SqliteConnection, id: &str) -> DbResult<ProductDetail> {
    let sql = format!("{} AND p.id = ?", detail_select());
    sqlx::query_as::<_, ProductDetailRow>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .map(ProductDetail::from)
        .ok_or_else(|| DbError::not_found("Product", id))
}

/// Loads the active products among `ids` with one `IN (...)` query.
/// Missing or inactive ids are simply absent from the result.
pub(crate) async fn fetch_active_by_ids(
    conn: &mut SqliteConnection,
    ids: &[String],
) -> DbResult<Vec<Product>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut builder = QueryBuilder::<Sqlite>::new(format!(
        "SELECT {PRODUCT_COLUMNS} FROM products p WHERE p.is_active = 1 AND p.id IN ("
    ));
    let mut separated = builder.separated(", ");
    for id in ids {
        separated.push_bind(id.clone());
    }
    separated.push_unseparated(")");

    let products = builder
        .build_query_as::<Product>()
        .fetch_all(&mut *conn)
        .await?;
    Ok(products)
}

async fn insert_product(conn: &mut SqliteConnection, product: &Product) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO products (
            id, sku, barcode, name, description, price, cost, stock, min_stock,
            max_stock, unit, category_id, supplier_id, is_active, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&product.id)
    .bind(&product.sku)
    .bind(&product.barcode)
    .bind(&product.name)
    .bind(&product.description)
    .bind(product.price)
    .bind(product.cost)
    .bind(product.stock)
    .bind(product.min_stock)
    .bind(product.max_stock)
    .bind(&product.unit)
    .bind(&product.category_id)
    .bind(&product.supplier_id)
    .bind(product.is_active)
    .bind(product.created_at)
    .bind(product.updated_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Writes every editable column. `stock` is left alone.
async fn update_product(conn: &mut SqliteConnection, product: &Product) -> DbResult<()> {
    sqlx::query(
        r#"
        UPDATE products SET
            sku = ?, barcode = ?, name = ?, description = ?, price = ?, cost = ?,
            min_stock = ?, max_stock = ?, unit = ?, category_id = ?, supplier_id = ?,
            is_active = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&product.sku)
    .bind(&product.barcode)
    .bind(&product.name)
    .bind(&product.description)
    .bind(product.price)
    .bind(product.cost)
    .bind(product.min_stock)
    .bind(product.max_stock)
    .bind(&product.unit)
    .bind(&product.category_id)
    .bind(&product.supplier_id)
    .bind(product.is_active)
    .bind(product.updated_at)
    .bind(&product.id)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
