//! # Sale Repository
//!
//! Atomic checkout and transaction reads.
//!
//! ## Checkout as One Unit of Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    create(user, cart)                                   │
//! │                                                                         │
//! │  validate cart + verify totals             (no I/O, kasir-core)        │
//! │       │                                                                 │
//! │       ▼  BEGIN                                                          │
//! │  SELECT active products WHERE id IN (...)  one query for the cart      │
//! │       │  found ≠ requested → InvalidItems                               │
//! │       ▼                                                                 │
//! │  customer active?                          → NotFound                  │
//! │  Σ quantity per product ≤ stock?           → InsufficientStock         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  INSERT transactions (COMPLETED, PAID)                                  │
//! │  for each line:                                                         │
//! │     INSERT transaction_items (name/SKU snapshot)                        │
//! │     UPDATE products SET stock = stock - q WHERE id = ? AND stock >= q   │
//! │        0 rows → InsufficientStock                                       │
//! │     INSERT stock_movements (SALE, "Penjualan TRX...")                   │
//! │       │                                                                 │
//! │       ▼  COMMIT (any error above → ROLLBACK, nothing persists)         │
//! │  transaction + items + customer + cashier                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The guarded decrement makes the stock floor hold even when two checkouts
//! race for the last units: the loser's UPDATE matches zero rows and its
//! whole sale rolls back.

use std::collections::HashMap;

use chrono::Utc;
use rand::Rng;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use crate::repository::product::fetch_active_by_ids;
use crate::repository::stock::{new_movement, record_movement};
use crate::repository::{ensure_active, new_id, optional_text};
use crate::unit_of_work;
use kasir_core::input::{Page, PageRequest, SaleInput, TransactionFilter};
use kasir_core::report::DateRange;
use kasir_core::sale::{sale_movement_reason, transaction_number, verify_totals};
use kasir_core::{
    CoreError, MovementType, NamedRef, PaymentStatus, Transaction, TransactionDetail,
    TransactionItem, TransactionStatus, TransactionSummary,
};

const TRANSACTION_COLUMNS: &str = r#"
    t.id, t.transaction_number, t.status, t.payment_status, t.payment_method,
    t.subtotal, t.tax_amount, t.discount_amount, t.total, t.notes,
    t.customer_id, t.user_id, t.created_at, t.updated_at"#;

const ITEM_COLUMNS: &str = r#"
    id, transaction_id, product_id, product_name, product_sku, quantity,
    unit_price, discount, total_price, created_at"#;

fn summary_select() -> String {
    format!(
        r#"
        SELECT {TRANSACTION_COLUMNS},
            c.name AS customer_name,
            u.name AS cashier_name,
            (SELECT COUNT(*) FROM transaction_items i WHERE i.transaction_id = t.id) AS item_count
        FROM transactions t
        LEFT JOIN customers c ON c.id = t.customer_id
        JOIN users u ON u.id = t.user_id
        WHERE 1 = 1"#
    )
}

#[derive(Debug, sqlx::FromRow)]
struct SummaryRow {
    #[sqlx(flatten)]
    transaction: Transaction,
    customer_name: Option<String>,
    cashier_name: String,
    item_count: i64,
}

impl SummaryRow {
    fn customer(&self) -> Option<NamedRef> {
        self.transaction
            .customer_id
            .clone()
            .zip(self.customer_name.clone())
            .map(|(id, name)| NamedRef { id, name })
    }

    fn cashier(&self) -> NamedRef {
        NamedRef {
            id: self.transaction.user_id.clone(),
            name: self.cashier_name.clone(),
        }
    }
}

impl From<SummaryRow> for TransactionSummary {
    fn from(row: SummaryRow) -> Self {
        TransactionSummary {
            customer: row.customer(),
            cashier: row.cashier(),
            item_count: row.item_count,
            transaction: row.transaction,
        }
    }
}

/// Repository for sales.
///
/// ## Usage
/// ```rust,ignore
/// let detail = db.sales().create(&user.id, cart).await?;
/// println!("{} {}", detail.transaction.transaction_number, detail.transaction.total);
/// ```
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Records a completed sale and takes its items out of stock.
    ///
    /// ## Returns
    /// * `Err(DbError::Core(Validation))` - empty cart, bad quantity, too many lines
    /// * `Err(DbError::Core(InvalidTotals))` - subtotal/total disagree with lines
    /// * `Err(DbError::Core(InvalidItems))` - a product is missing or inactive
    /// * `Err(DbError::Core(InsufficientStock))` - not enough on hand
    /// * `Err(DbError::NotFound)` - customer missing or inactive
    pub async fn create(&self, user_id: &str, input: SaleInput) -> DbResult<TransactionDetail> {
        input.validate()?;
        verify_totals(&input)?;

        let now = Utc::now();
        let transaction = Transaction {
            id: new_id(),
            transaction_number: transaction_number(now, rand::thread_rng().gen_range(0..10_000)),
            status: TransactionStatus::Completed,
            payment_status: PaymentStatus::Paid,
            payment_method: input.payment_method,
            subtotal: input.subtotal,
            tax_amount: input.tax_amount,
            discount_amount: input.discount_amount,
            total: input.total,
            notes: optional_text(&input.notes),
            customer_id: optional_text(&input.customer_id),
            user_id: user_id.to_string(),
            created_at: now,
            updated_at: now,
        };
        debug!(
            number = %transaction.transaction_number,
            lines = input.items.len(),
            "Creating sale"
        );

        let result = unit_of_work::run(&self.pool, |conn| {
            Box::pin(async move {
                let product_ids = input.product_ids();
                let products = fetch_active_by_ids(conn, &product_ids).await?;
                if products.len() != product_ids.len() {
                    return Err(CoreError::InvalidItems {
                        requested: product_ids.len(),
                        found: products.len(),
                    }
                    .into());
                }

                if let Some(customer_id) = &transaction.customer_id {
                    ensure_active(conn, "customers", "Customer", customer_id).await?;
                }

                for product in &products {
                    let requested = input.requested_quantity(&product.id);
                    if !product.can_sell(requested) {
                        return Err(CoreError::InsufficientStock {
                            product_id: product.id.clone(),
                            name: product.name.clone(),
                            available: product.stock,
                            requested,
                        }
                        .into());
                    }
                }

                insert_transaction(conn, &transaction).await?;

                let by_id: HashMap<&str, _> =
                    products.iter().map(|p| (p.id.as_str(), p)).collect();
                let reason = sale_movement_reason(&transaction.transaction_number);

                for line in &input.items {
                    let Some(product) = by_id.get(line.product_id.as_str()) else {
                        return Err(CoreError::ProductNotFound(line.product_id.clone()).into());
                    };

                    let item = TransactionItem {
                        id: new_id(),
                        transaction_id: transaction.id.clone(),
                        product_id: product.id.clone(),
                        product_name: product.name.clone(),
                        product_sku: product.sku.clone(),
                        quantity: line.quantity,
                        unit_price: line.unit_price,
                        discount: line.discount,
                        total_price: line.line_total()?,
                        created_at: transaction.created_at,
                    };
                    insert_item(conn, &item).await?;

                    decrement_stock(conn, product.id.as_str(), &product.name, line.quantity).await?;

                    let movement = new_movement(
                        &product.id,
                        &transaction.user_id,
                        MovementType::Sale,
                        line.quantity,
                        &reason,
                        None,
                    );
                    record_movement(conn, &movement).await?;
                }

                fetch_detail(conn, &transaction.id).await
            })
        })
        .await;

        match &result {
            Ok(detail) => info!(
                number = %detail.transaction.transaction_number,
                total = %detail.transaction.total,
                items = detail.items.len(),
                "Sale completed"
            ),
            Err(err) => warn!(error = %err, "Sale rejected"),
        }
        result
    }

    /// Gets a transaction with items, customer and cashier.
    pub async fn get_detail(&self, id: &str) -> DbResult<TransactionDetail> {
        let mut conn = self.pool.acquire().await?;
        fetch_detail(&mut conn, id).await
    }

    /// Paginated transactions inside `range`, newest first.
    pub async fn list(
        &self,
        filter: &TransactionFilter,
        range: &DateRange,
        page: PageRequest,
    ) -> DbResult<Page<TransactionSummary>> {
        let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM transactions t WHERE 1 = 1");
        push_filters(&mut count, filter, range);
        let total = count.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

        let mut rows = QueryBuilder::<Sqlite>::new(summary_select());
        push_filters(&mut rows, filter, range);
        rows.push(" ORDER BY t.created_at DESC, t.rowid DESC LIMIT ")
            .push_bind(page.limit)
            .push(" OFFSET ")
            .push_bind(page.offset());

        let transactions = fetch_summaries(rows, &self.pool).await?;
        Ok(Page::new(transactions, page, total))
    }

    /// Every transaction inside `range` matching `filter`, newest first.
    /// Used by exports.
    pub async fn list_all(
        &self,
        filter: &TransactionFilter,
        range: &DateRange,
    ) -> DbResult<Vec<TransactionSummary>> {
        let mut rows = QueryBuilder::<Sqlite>::new(summary_select());
        push_filters(&mut rows, filter, range);
        rows.push(" ORDER BY t.created_at DESC, t.rowid DESC");

        fetch_summaries(rows, &self.pool).await
    }

    /// Latest `limit` transactions for the dashboard.
    pub async fn recent(&self, limit: i64) -> DbResult<Vec<TransactionSummary>> {
        let mut rows = QueryBuilder::<Sqlite>::new(summary_select());
        rows.push(" ORDER BY t.created_at DESC, t.rowid DESC LIMIT ")
            .push_bind(limit);

        fetch_summaries(rows, &self.pool).await
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn push_filters(builder: &mut QueryBuilder<'_, Sqlite>, filter: &TransactionFilter, range: &DateRange) {
    builder
        .push(" AND t.created_at >= ")
        .push_bind(range.start)
        .push(" AND t.created_at <= ")
        .push_bind(range.end);

    if let Some(status) = filter.status {
        builder.push(" AND t.status = ").push_bind(status);
    }
    if let Some(method) = filter.payment_method {
        builder.push(" AND t.payment_method = ").push_bind(method);
    }
    if let Some(user_id) = filter.user_id.as_deref().filter(|id| !id.is_empty()) {
        builder.push(" AND t.user_id = ").push_bind(user_id.to_string());
    }
}

async fn fetch_summaries(
    mut builder: QueryBuilder<'_, Sqlite>,
    pool: &SqlitePool,
) -> DbResult<Vec<TransactionSummary>> {
    let rows = builder.build_query_as::<SummaryRow>().fetch_all(pool).await?;
    Ok(rows.into_iter().map(TransactionSummary::from).collect())
}

async fn insert_transaction(conn: &mut SqliteConnection, transaction: &Transaction) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO transactions (
            id, transaction_number, status, payment_status, payment_method,
            subtotal, tax_amount, discount_amount, total, notes,
            customer_id, user_id, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&transaction.id)
    .bind(&transaction.transaction_number)
    .bind(transaction.status)
    .bind(transaction.payment_status)
    .bind(transaction.payment_method)
    .bind(transaction.subtotal)
    .bind(transaction.tax_amount)
    .bind(transaction.discount_amount)
    .bind(transaction.total)
    .bind(&transaction.notes)
    .bind(&transaction.customer_id)
    .bind(&transaction.user_id)
    .bind(transaction.created_at)
    .bind(transaction.updated_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

async fn insert_item(conn: &mut SqliteConnection, item: &TransactionItem) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO transaction_items (
            id, transaction_id, product_id, product_name, product_sku,
            quantity, unit_price, discount, total_price, created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&item.id)
    .bind(&item.transaction_id)
    .bind(&item.product_id)
    .bind(&item.product_name)
    .bind(&item.product_sku)
    .bind(item.quantity)
    .bind(item.unit_price)
    .bind(item.discount)
    .bind(item.total_price)
    .bind(item.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// `stock - quantity`, refused by the WHERE clause when it would go below zero.
async fn decrement_stock(
    conn: &mut SqliteConnection,
    product_id: &str,
    name: &str,
    quantity: i64,
) -> DbResult<()> {
    let result = sqlx::query(
        "UPDATE products SET stock = stock - ?, updated_at = ? WHERE id = ? AND stock >= ?",
    )
    .bind(quantity)
    .bind(Utc::now())
    .bind(product_id)
    .bind(quantity)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        let available: i64 = sqlx::query_scalar("SELECT stock FROM products WHERE id = ?")
            .bind(product_id)
            .fetch_one(&mut *conn)
            .await?;
        return Err(CoreError::InsufficientStock {
            product_id: product_id.to_string(),
            name: name.to_string(),
            available,
            requested: quantity,
        }
        .into());
    }

    Ok(())
}

async fn fetch_detail(conn: &mut SqliteConnection, id: &str) -> DbResult<TransactionDetail> {
    let sql = format!("{} AND t.id = ?", summary_select());
    let row = sqlx::query_as::<_, SummaryRow>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| DbError::not_found("Transaction", id))?;

    let sql = format!("SELECT {ITEM_COLUMNS} FROM transaction_items WHERE transaction_id = ? ORDER BY rowid");
    let items = sqlx::query_as::<_, TransactionItem>(&sql)
        .bind(id)
        .fetch_all(&mut *conn)
        .await?;

    Ok(TransactionDetail {
        customer: row.customer(),
        cashier: row.cashier(),
        transaction: row.transaction,
        items,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support;
    use kasir_core::input::{CustomerInput, SaleLineInput};
    use kasir_core::{Money, PaymentMethod};

    /// Cart with consistent totals and no tax.
    fn cart(lines: &[(&str, i64, i64)]) -> SaleInput {
        let items: Vec<SaleLineInput> = lines
            .iter()
            .map(|(id, quantity, price)| SaleLineInput {
                product_id: id.to_string(),
                quantity: *quantity,
                unit_price: Money::from_minor(*price),
                discount: Money::zero(),
            })
            .collect();
        let subtotal: Money = items.iter().map(|line| line.net_total().unwrap()).sum();

        SaleInput {
            items,
            customer_id: None,
            payment_method: PaymentMethod::Cash,
            subtotal,
            tax_amount: Money::zero(),
            discount_amount: Money::zero(),
            total: subtotal,
            notes: None,
        }
    }

    async fn transaction_count(db: &crate::Database) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM transactions")
            .fetch_one(db.pool())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_sale_decrements_stock_and_records_movement() {
        let db = test_support::database().await;
        let user = test_support::cashier(&db).await;
        let food = test_support::category(&db, "Makanan").await;
        let id = test_support::product(&db, &user, &food, "BRS-5KG", 25_000, 50).await;

        let detail = db.sales().create(&user.id, cart(&[(&id, 2, 25_000)])).await.unwrap();

        assert_eq!(test_support::stock_of(&db, &id).await, 48);
        assert_eq!(detail.items.len(), 1);
        assert_eq!(detail.items[0].total_price, Money::from_minor(50_000));
        assert_eq!(detail.items[0].product_sku, "BRS-5KG");
        assert_eq!(detail.transaction.total, Money::from_minor(50_000));
        assert_eq!(detail.transaction.status, TransactionStatus::Completed);
        assert_eq!(detail.transaction.payment_status, PaymentStatus::Paid);
        assert_eq!(detail.cashier.name, "Siti Kasir");
        assert!(detail.customer.is_none());

        let number = &detail.transaction.transaction_number;
        assert!(number.starts_with("TRX"));
        assert_eq!(number.len(), 21);

        let sale_movements: Vec<(i64, String)> = sqlx::query_as(
            "SELECT quantity, reason FROM stock_movements WHERE product_id = ? AND movement_type = 'SALE'",
        )
        .bind(&id)
        .fetch_all(db.pool())
        .await
        .unwrap();
        assert_eq!(sale_movements, vec![(2, format!("Penjualan {number}"))]);
    }

    #[tokio::test]
    async fn test_insufficient_stock_writes_nothing() {
        let db = test_support::database().await;
        let user = test_support::cashier(&db).await;
        let food = test_support::category(&db, "Makanan").await;
        let rice = test_support::product(&db, &user, &food, "BRS-5KG", 25_000, 50).await;
        let noodle = test_support::product(&db, &user, &food, "IDM-001", 3_500, 3).await;

        let err = db
            .sales()
            .create(&user.id, cart(&[(&rice, 2, 25_000), (&noodle, 5, 3_500)]))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DbError::Core(CoreError::InsufficientStock { available: 3, requested: 5, .. })
        ));
        assert_eq!(test_support::stock_of(&db, &rice).await, 50);
        assert_eq!(test_support::stock_of(&db, &noodle).await, 3);
        assert_eq!(transaction_count(&db).await, 0);
        assert_eq!(test_support::movement_count(&db, &rice).await, 1);
    }

    #[tokio::test]
    async fn test_repeated_product_lines_are_checked_together() {
        let db = test_support::database().await;
        let user = test_support::cashier(&db).await;
        let food = test_support::category(&db, "Makanan").await;
        let id = test_support::product(&db, &user, &food, "GLA-1KG", 15_000, 50).await;

        let err = db
            .sales()
            .create(&user.id, cart(&[(&id, 30, 15_000), (&id, 30, 15_000)]))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DbError::Core(CoreError::InsufficientStock { requested: 60, .. })
        ));
        assert_eq!(test_support::stock_of(&db, &id).await, 50);
    }

    #[tokio::test]
    async fn test_inactive_product_aborts_whole_sale() {
        let db = test_support::database().await;
        let user = test_support::cashier(&db).await;
        let food = test_support::category(&db, "Makanan").await;
        let active = test_support::product(&db, &user, &food, "AKT-001", 5_000, 10).await;
        let retired = test_support::product(&db, &user, &food, "OFF-001", 5_000, 10).await;
        db.products().soft_delete(&retired).await.unwrap();

        let err = db
            .sales()
            .create(&user.id, cart(&[(&active, 1, 5_000), (&retired, 1, 5_000)]))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DbError::Core(CoreError::InvalidItems { requested: 2, found: 1 })
        ));
        assert_eq!(test_support::stock_of(&db, &active).await, 10);
        assert_eq!(transaction_count(&db).await, 0);
    }

    #[tokio::test]
    async fn test_mismatched_totals_are_rejected() {
        let db = test_support::database().await;
        let user = test_support::cashier(&db).await;
        let food = test_support::category(&db, "Makanan").await;
        let id = test_support::product(&db, &user, &food, "TLR-10", 28_000, 10).await;

        let mut input = cart(&[(&id, 1, 28_000)]);
        input.total = Money::from_minor(1_000);

        let err = db.sales().create(&user.id, input).await.unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::InvalidTotals { .. })));
        assert_eq!(test_support::stock_of(&db, &id).await, 10);
    }

    #[tokio::test]
    async fn test_customer_must_be_active() {
        let db = test_support::database().await;
        let user = test_support::cashier(&db).await;
        let food = test_support::category(&db, "Makanan").await;
        let id = test_support::product(&db, &user, &food, "KPI-01", 12_000, 10).await;
        let customer = db
            .customers()
            .create(&CustomerInput {
                name: "Rina".to_string(),
                email: None,
                phone: None,
                address: None,
            })
            .await
            .unwrap();

        let mut input = cart(&[(&id, 1, 12_000)]);
        input.customer_id = Some(customer.id.clone());
        let detail = db.sales().create(&user.id, input.clone()).await.unwrap();
        assert_eq!(detail.customer.map(|c| c.name), Some("Rina".to_string()));

        db.customers().soft_delete(&customer.id).await.unwrap();
        let err = db.sales().create(&user.id, input).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { ref entity, .. } if entity == "Customer"));
        assert_eq!(test_support::stock_of(&db, &id).await, 9);
    }

    #[tokio::test]
    async fn test_empty_cart_is_invalid() {
        let db = test_support::database().await;
        let user = test_support::cashier(&db).await;

        let err = db.sales().create(&user.id, cart(&[])).await.unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::Validation(_))));
    }

    #[tokio::test]
    async fn test_list_and_recent() {
        let db = test_support::database().await;
        let user = test_support::cashier(&db).await;
        let food = test_support::category(&db, "Makanan").await;
        let id = test_support::product(&db, &user, &food, "MNY-2L", 38_000, 100).await;

        for method in [PaymentMethod::Cash, PaymentMethod::Qris, PaymentMethod::Cash] {
            let mut input = cart(&[(&id, 1, 38_000)]);
            input.payment_method = method;
            db.sales().create(&user.id, input).await.unwrap();
        }

        let today = DateRange::day(test_support::today());
        let all = db
            .sales()
            .list(&TransactionFilter::default(), &today, PageRequest::default())
            .await
            .unwrap();
        assert_eq!(all.pagination.total, 3);
        assert_eq!(all.data[0].item_count, 1);

        let qris = TransactionFilter {
            payment_method: Some(PaymentMethod::Qris),
            ..TransactionFilter::default()
        };
        assert_eq!(db.sales().list_all(&qris, &today).await.unwrap().len(), 1);

        let yesterday = DateRange::day(test_support::today() - chrono::Duration::days(1));
        assert!(db.sales().list_all(&TransactionFilter::default(), &yesterday).await.unwrap().is_empty());

        let recent = db.sales().recent(2).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].transaction.payment_method, PaymentMethod::Cash);
        assert!(recent[0].transaction.created_at >= recent[1].transaction.created_at);

        let detail = db.sales().get_detail(&recent[1].transaction.id).await.unwrap();
        assert_eq!(detail.items.len(), 1);
        assert!(matches!(
            db.sales().get_detail("missing").await,
            Err(DbError::NotFound { .. })
        ));
    }
}
