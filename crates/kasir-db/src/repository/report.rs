//! # Report Repository
//!
//! Loads the rows behind each report. Aggregation of the sales report is
//! done in memory by `kasir_core::report`; listing reports are paged in SQL.
//!
//! ## Sales Report Data Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  transactions (COMPLETED + PAID, in range) ─┐                           │
//! │  transaction_items ⋈ products ⋈ categories ─┴─► Vec<ReportTransaction>  │
//! │                                                  │                      │
//! │                                                  ▼                      │
//! │                                   SalesReport::build(range, &rows)      │
//! │                                   (summary, top products, categories,   │
//! │                                    daily trend, payment methods)        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use crate::repository::product::{detail_select, ProductDetailRow};
use kasir_core::input::{InventoryFilter, Page, PageMeta, PageRequest};
use kasir_core::report::{
    CustomerReportRow, DateRange, InventoryReport, InventorySummary, ReportLine, ReportTransaction,
    SalesReport,
};
use kasir_core::{Money, PaymentMethod, ProductDetail, StockStatus};

#[derive(Debug, sqlx::FromRow)]
struct TransactionRow {
    id: String,
    created_at: DateTime<Utc>,
    total: Money,
    payment_method: PaymentMethod,
}

#[derive(Debug, sqlx::FromRow)]
struct LineRow {
    transaction_id: String,
    product_id: String,
    product_name: String,
    product_sku: String,
    category_id: String,
    category_name: String,
    quantity: i64,
    total_price: Money,
}

const CUSTOMER_REPORT_SELECT: &str = r#"
    SELECT
        c.id, c.name, c.email, c.phone, c.address, c.is_active, c.created_at, c.updated_at,
        COUNT(t.id) AS transaction_count,
        COALESCE(SUM(t.total), 0) AS total_spent,
        MAX(t.created_at) AS last_purchase
    FROM customers c
    LEFT JOIN transactions t
        ON t.customer_id = c.id
        AND t.status = 'COMPLETED'
        AND t.created_at >= ?
        AND t.created_at <= ?
    WHERE c.is_active = 1
    GROUP BY c.id
    ORDER BY total_spent DESC, c.name"#;

#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository { pool }
    }

    /// Completed transactions inside `range`, oldest first, with their lines.
    pub async fn report_transactions(&self, range: &DateRange) -> DbResult<Vec<ReportTransaction>> {
        let transactions = sqlx::query_as::<_, TransactionRow>(
            r#"
            SELECT id, created_at, total, payment_method
            FROM transactions
            WHERE status = 'COMPLETED' AND payment_status = 'PAID'
              AND created_at >= ? AND created_at <= ?
            ORDER BY created_at, rowid
            "#,
        )
        .bind(range.start)
        .bind(range.end)
        .fetch_all(&self.pool)
        .await?;

        let lines = sqlx::query_as::<_, LineRow>(
            r#"
            SELECT
                i.transaction_id, i.product_id, i.product_name, i.product_sku,
                p.category_id,
                COALESCE(c.name, '') AS category_name,
                i.quantity, i.total_price
            FROM transaction_items i
            JOIN transactions t ON t.id = i.transaction_id
            JOIN products p ON p.id = i.product_id
            LEFT JOIN categories c ON c.id = p.category_id
            WHERE t.status = 'COMPLETED' AND t.payment_status = 'PAID'
              AND t.created_at >= ? AND t.created_at <= ?
            ORDER BY i.rowid
            "#,
        )
        .bind(range.start)
        .bind(range.end)
        .fetch_all(&self.pool)
        .await?;

        let mut items: HashMap<String, Vec<ReportLine>> = HashMap::new();
        for line in lines {
            items.entry(line.transaction_id).or_default().push(ReportLine {
                product_id: line.product_id,
                product_name: line.product_name,
                product_sku: line.product_sku,
                category_id: line.category_id,
                category_name: line.category_name,
                quantity: line.quantity,
                total_price: line.total_price,
            });
        }

        let report = transactions
            .into_iter()
            .map(|t| ReportTransaction {
                items: items.remove(&t.id).unwrap_or_default(),
                id: t.id,
                created_at: t.created_at,
                total: t.total,
                payment_method: t.payment_method,
            })
            .collect::<Vec<_>>();

        debug!(range = %range.label(), transactions = report.len(), "Loaded report transactions");
        Ok(report)
    }

    /// Aggregated sales report for `range`.
    pub async fn sales_report(&self, range: DateRange) -> DbResult<SalesReport> {
        let transactions = self.report_transactions(&range).await?;
        Ok(SalesReport::build(range, &transactions))
    }

    /// Active products with stock status, plus totals over every match.
    pub async fn inventory(&self, filter: &InventoryFilter, page: PageRequest) -> DbResult<InventoryReport> {
        let mut summary = QueryBuilder::<Sqlite>::new(
            r#"
            SELECT
                COUNT(*) AS total_products,
                COALESCE(SUM(p.stock * p.cost), 0) AS total_stock_value,
                COALESCE(SUM(CASE WHEN p.stock > 0 AND p.stock <= p.min_stock THEN 1 ELSE 0 END), 0)
                    AS low_stock_count,
                COALESCE(SUM(CASE WHEN p.stock <= 0 THEN 1 ELSE 0 END), 0) AS out_of_stock_count
            FROM products p
            WHERE 1 = 1"#,
        );
        push_inventory_filters(&mut summary, filter);
        let summary = summary
            .build_query_as::<InventorySummary>()
            .fetch_one(&self.pool)
            .await?;

        let data = self.inventory_rows(filter, Some(page)).await?;

        Ok(InventoryReport {
            data,
            pagination: PageMeta::new(page, summary.total_products),
            summary,
        })
    }

    /// Every product matching `filter`. Used by exports.
    pub async fn inventory_all(&self, filter: &InventoryFilter) -> DbResult<Vec<ProductDetail>> {
        self.inventory_rows(filter, None).await
    }

    async fn inventory_rows(
        &self,
        filter: &InventoryFilter,
        page: Option<PageRequest>,
    ) -> DbResult<Vec<ProductDetail>> {
        let mut rows = QueryBuilder::<Sqlite>::new(detail_select());
        push_inventory_filters(&mut rows, filter);
        rows.push(" ORDER BY p.name");
        if let Some(page) = page {
            rows.push(" LIMIT ")
                .push_bind(page.limit)
                .push(" OFFSET ")
                .push_bind(page.offset());
        }

        let products = rows
            .build_query_as::<ProductDetailRow>()
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(ProductDetail::from)
            .collect();
        Ok(products)
    }

    /// Active customers with their purchases inside `range`, biggest
    /// spenders first.
    pub async fn customers(&self, range: &DateRange, page: PageRequest) -> DbResult<Page<CustomerReportRow>> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM customers WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;

        let sql = format!("{CUSTOMER_REPORT_SELECT} LIMIT ? OFFSET ?");
        let rows = sqlx::query_as::<_, CustomerReportRow>(&sql)
            .bind(range.start)
            .bind(range.end)
            .bind(page.limit)
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok(Page::new(rows, page, total))
    }

    /// Every row of the customer report. Used by exports.
    pub async fn customers_all(&self, range: &DateRange) -> DbResult<Vec<CustomerReportRow>> {
        let rows = sqlx::query_as::<_, CustomerReportRow>(CUSTOMER_REPORT_SELECT)
            .bind(range.start)
            .bind(range.end)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }
}

fn push_inventory_filters(builder: &mut QueryBuilder<'_, Sqlite>, filter: &InventoryFilter) {
    builder.push(" AND p.is_active = 1");

    if let Some(category_id) = filter.category_id.as_deref().filter(|id| !id.is_empty()) {
        builder
            .push(" AND p.category_id = ")
            .push_bind(category_id.to_string());
    }
    match filter.stock_status {
        Some(StockStatus::OutOfStock) => {
            builder.push(" AND p.stock <= 0");
        }
        Some(StockStatus::LowStock) => {
            builder.push(" AND p.stock > 0 AND p.stock <= p.min_stock");
        }
        Some(StockStatus::InStock) => {
            builder.push(" AND p.stock > p.min_stock AND p.stock > 0");
        }
        None => {}
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
