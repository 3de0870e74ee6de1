//! # Stock Repository
//!
//! Manual stock adjustments and the append-only movement ledger.
//!
//! ## Adjustment Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  adjust(user, { productId, type, quantity, reason })                    │
//! │       │                                                                 │
//! │       ▼  BEGIN                                                          │
//! │  load product (must be active)                                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  new = resolve_adjustment(current, type, quantity)                      │
//! │        IN → current + q   OUT → current − q   ADJUSTMENT → q            │
//! │        new < 0 → NegativeStock (nothing written)                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  UPDATE products SET stock = new WHERE stock = current                  │
//! │  INSERT stock_movements (type, quantity = q, reason)                    │
//! │       │                                                                 │
//! │       ▼  COMMIT                                                         │
//! │  product detail + movement detail                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use crate::repository::new_id;
use crate::repository::product::{fetch_detail, fetch_product};
use crate::unit_of_work;
use kasir_core::input::{Page, PageRequest, StockAdjustmentInput};
use kasir_core::stock::resolve_adjustment;
use kasir_core::{
    MovementType, NamedRef, ProductRef, StockAdjustment, StockMovement, StockMovementDetail,
};

const MOVEMENT_SELECT: &str = r#"
    SELECT
        m.id, m.product_id, m.user_id, m.movement_type, m.quantity, m.reason,
        m.notes, m.created_at,
        u.name AS user_name,
        p.name AS product_name,
        p.sku AS product_sku
    FROM stock_movements m
    JOIN users u ON u.id = m.user_id
    JOIN products p ON p.id = m.product_id
    WHERE 1 = 1"#;

#[derive(Debug, sqlx::FromRow)]
struct MovementRow {
    #[sqlx(flatten)]
    movement: StockMovement,
    user_name: String,
    product_name: String,
    product_sku: String,
}

impl From<MovementRow> for StockMovementDetail {
    fn from(row: MovementRow) -> Self {
        StockMovementDetail {
            user: NamedRef {
                id: row.movement.user_id.clone(),
                name: row.user_name,
            },
            product: ProductRef {
                id: row.movement.product_id.clone(),
                name: row.product_name,
                sku: row.product_sku,
            },
            movement: row.movement,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StockRepository {
    pool: SqlitePool,
}

impl StockRepository {
    pub fn new(pool: SqlitePool) -> Self {
        StockRepository { pool }
    }

    /// Applies a manual IN / OUT / ADJUSTMENT and records its movement.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - product missing or inactive
    /// * `Err(DbError::Core(NegativeStock))` - result would be below zero
    /// * `Err(DbError::Conflict)` - stock changed by another request meanwhile
    pub async fn adjust(&self, user_id: &str, input: StockAdjustmentInput) -> DbResult<StockAdjustment> {
        input.validate()?;

        let user_id = user_id.to_string();
        let kind = MovementType::from(input.kind);
        debug!(product_id = %input.product_id, kind = kind.as_str(), quantity = input.quantity, "Adjusting stock");

        let result = unit_of_work::run(&self.pool, |conn| {
            Box::pin(async move {
                let product = fetch_product(conn, &input.product_id).await?;
                if !product.is_active {
                    return Err(DbError::not_found("Product", &product.id));
                }

                let new_stock = resolve_adjustment(product.stock, kind, input.quantity)?;

                let updated = sqlx::query(
                    "UPDATE products SET stock = ?, updated_at = ? WHERE id = ? AND stock = ?",
                )
                .bind(new_stock)
                .bind(Utc::now())
                .bind(&product.id)
                .bind(product.stock)
                .execute(&mut *conn)
                .await?;

                if updated.rows_affected() == 0 {
                    return Err(DbError::Conflict(format!(
                        "stock of product {} changed during adjustment",
                        product.id
                    )));
                }

                let movement = new_movement(
                    &product.id,
                    &user_id,
                    kind,
                    input.quantity,
                    input.reason.trim(),
                    input.notes.as_deref(),
                );
                record_movement(conn, &movement).await?;

                let product = fetch_detail(conn, &product.id).await?;
                let movement = fetch_movement(conn, &movement.id).await?;
                Ok(StockAdjustment { product, movement })
            })
        })
        .await;

        match &result {
            Ok(adjustment) => info!(
                product_id = %adjustment.product.product.id,
                stock = adjustment.product.product.stock,
                "Stock adjusted"
            ),
            Err(err) => warn!(error = %err, "Stock adjustment rejected"),
        }
        result
    }

    /// Movement ledger, newest first, optionally for one product.
    pub async fn movements(
        &self,
        product_id: Option<&str>,
        page: PageRequest,
    ) -> DbResult<Page<StockMovementDetail>> {
        let product_id = product_id.filter(|id| !id.is_empty());

        let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM stock_movements m WHERE 1 = 1");
        if let Some(id) = product_id {
            count.push(" AND m.product_id = ").push_bind(id.to_string());
        }
        let total = count.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

        let mut rows = QueryBuilder::<Sqlite>::new(MOVEMENT_SELECT);
        if let Some(id) = product_id {
            rows.push(" AND m.product_id = ").push_bind(id.to_string());
        }
        rows.push(" ORDER BY m.created_at DESC, m.rowid DESC LIMIT ")
            .push_bind(page.limit)
            .push(" OFFSET ")
            .push_bind(page.offset());

        let movements = rows
            .build_query_as::<MovementRow>()
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(StockMovementDetail::from)
            .collect();

        Ok(Page::new(movements, page, total))
    }
}

// =============================================================================
// Ledger helpers (used by product creation and checkout)
// =============================================================================

pub(crate) fn new_movement(
    product_id: &str,
    user_id: &str,
    movement_type: MovementType,
    quantity: i64,
    reason: &str,
    notes: Option<&str>,
) -> StockMovement {
    StockMovement {
        id: new_id(),
        product_id: product_id.to_string(),
        user_id: user_id.to_string(),
        movement_type,
        quantity,
        reason: reason.to_string(),
        notes: notes.map(str::trim).filter(|n| !n.is_empty()).map(str::to_string),
        created_at: Utc::now(),
    }
}

/// Appends a movement. Must run in the unit of work that changed the stock.
pub(crate) async fn record_movement(conn: &mut SqliteConnection, movement: &StockMovement) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO stock_movements (
            id, product_id, user_id, movement_type, quantity, reason, notes, created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&movement.id)
    .bind(&movement.product_id)
    .bind(&movement.user_id)
    .bind(movement.movement_type)
    .bind(movement.quantity)
    .bind(&movement.reason)
    .bind(&movement.notes)
    .bind(movement.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

async fn fetch_movement(conn: &mut SqliteConnection, id: &str) -> DbResult<StockMovementDetail> {
    let sql = format!("{MOVEMENT_SELECT} AND m.id = ?");
    sqlx::query_as::<_, MovementRow>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .map(StockMovementDetail::from)
        .ok_or_else(|| DbError::not_found("StockMovement", id))
}

// =============================================================================
// Unit Tests
// =============================================================================
