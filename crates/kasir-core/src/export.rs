//! # Export Tables
//!
//! Shapes report data into `{ title, headers, rows }` tables.
//!
//! ```text
//! SalesReport ───────────┐
//! TransactionSummary[] ──┤                      ┌──► to_csv()  → text/csv
//! ProductDetail[] ───────┼──► ExportTable ──────┤
//! CustomerReportRow[] ───┘                      └──► JSON      → client renders
//!                                                               PDF / Excel
//! ```
//!
//! Cells are plain strings. Money is written as a bare integer so that
//! spreadsheets can sum it; dates as `YYYY-MM-DD HH:MM` UTC.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::report::{CustomerReportRow, DateRange, SalesReport};
use crate::types::{ProductDetail, TransactionSummary};

/// A rectangular table ready for CSV, PDF or spreadsheet rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ExportTable {
    pub title: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ExportTable {
    fn new(title: String, headers: &[&str]) -> Self {
        Self {
            title,
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// Renders the table as CSV: header line first, `\n` line endings,
    /// fields quoted when they hold a comma, quote or line break.
    pub fn to_csv(&self) -> String {
        let mut lines = Vec::with_capacity(self.rows.len() + 1);
        lines.push(join_row(&self.headers));
        for row in &self.rows {
            lines.push(join_row(row));
        }
        lines.join("\n")
    }

    /// File name for downloads, e.g. `laporan-penjualan-2026-10-01..2026-10-16.csv`.
    pub fn file_name(&self, extension: &str) -> String {
        let slug: String = self
            .title
            .to_lowercase()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '.' { c } else { '-' })
            .collect();
        format!("{}.{}", slug.trim_matches('-'), extension)
    }
}

fn join_row(fields: &[String]) -> String {
    fields
        .iter()
        .map(|field| escape_field(field))
        .collect::<Vec<_>>()
        .join(",")
}

fn escape_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') || value.contains('\r')
    {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn money(value: Money) -> String {
    value.minor().to_string()
}

fn timestamp(value: DateTime<Utc>) -> String {
    value.format("%Y-%m-%d %H:%M").to_string()
}

// =============================================================================
// Shaping
// =============================================================================

/// Daily sales for the range, one row per day with sales.
pub fn sales_table(report: &SalesReport) -> ExportTable {
    let mut table = ExportTable::new(
        format!("Laporan Penjualan {}", report.range.label()),
        &["Tanggal", "Jumlah Transaksi", "Unit Terjual", "Pendapatan"],
    );
    for point in &report.sales_trend {
        table.rows.push(vec![
            point.date.clone(),
            point.transaction_count.to_string(),
            point.sales.to_string(),
            money(point.revenue),
        ]);
    }
    table
}

/// Top products for the range.
pub fn top_products_table(report: &SalesReport) -> ExportTable {
    let mut table = ExportTable::new(
        format!("Produk Terlaris {}", report.range.label()),
        &["Peringkat", "SKU", "Produk", "Unit Terjual", "Pendapatan"],
    );
    for (rank, product) in report.top_products.iter().enumerate() {
        table.rows.push(vec![
            (rank + 1).to_string(),
            product.product_sku.clone(),
            product.product_name.clone(),
            product.quantity_sold.to_string(),
            money(product.revenue),
        ]);
    }
    table
}

pub fn transactions_table(range: &DateRange, transactions: &[TransactionSummary]) -> ExportTable {
    let mut table = ExportTable::new(
        format!("Laporan Transaksi {}", range.label()),
        &[
            "No. Transaksi",
            "Tanggal",
            "Pelanggan",
            "Kasir",
            "Metode Pembayaran",
            "Status",
            "Jumlah Item",
            "Subtotal",
            "Pajak",
            "Diskon",
            "Total",
        ],
    );
    for summary in transactions {
        let t = &summary.transaction;
        table.rows.push(vec![
            t.transaction_number.clone(),
            timestamp(t.created_at),
            summary
                .customer
                .as_ref()
                .map(|c| c.name.clone())
                .unwrap_or_else(|| "Umum".to_string()),
            summary.cashier.name.clone(),
            t.payment_method.label().to_string(),
            t.status.label().to_string(),
            summary.item_count.to_string(),
            money(t.subtotal),
            money(t.tax_amount),
            money(t.discount_amount),
            money(t.total),
        ]);
    }
    table
}

pub fn inventory_table(products: &[ProductDetail]) -> ExportTable {
    let mut table = ExportTable::new(
        "Laporan Inventaris".to_string(),
        &[
            "SKU",
            "Produk",
            "Kategori",
            "Pemasok",
            "Stok",
            "Stok Minimum",
            "Satuan",
            "Harga Beli",
            "Harga Jual",
            "Nilai Stok",
            "Status",
        ],
    );
    for detail in products {
        let p = &detail.product;
        table.rows.push(vec![
            p.sku.clone(),
            p.name.clone(),
            detail
                .category
                .as_ref()
                .map(|c| c.name.clone())
                .unwrap_or_default(),
            detail
                .supplier
                .as_ref()
                .map(|s| s.name.clone())
                .unwrap_or_default(),
            p.stock.to_string(),
            p.min_stock.to_string(),
            p.unit.clone(),
            money(p.cost),
            money(p.price),
            money(p.stock_value()),
            detail.stock_status.label().to_string(),
        ]);
    }
    table
}

pub fn customers_table(range: &DateRange, customers: &[CustomerReportRow]) -> ExportTable {
    let mut table = ExportTable::new(
        format!("Laporan Pelanggan {}", range.label()),
        &[
            "Nama",
            "Email",
            "Telepon",
            "Jumlah Transaksi",
            "Total Belanja",
            "Pembelian Terakhir",
        ],
    );
    for row in customers {
        table.rows.push(vec![
            row.customer.name.clone(),
            row.customer.email.clone().unwrap_or_default(),
            row.customer.phone.clone().unwrap_or_default(),
            row.transaction_count.to_string(),
            money(row.total_spent),
            row.last_purchase.map(timestamp).unwrap_or_default(),
        ]);
    }
    table
}

// =============================================================================
// Unit Tests
// =============================================================================
