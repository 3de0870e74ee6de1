//! # Report Aggregation
//!
//! Pure transforms that turn a flat list of completed sales into the sales
//! report: top products, category breakdown, daily trend, payment methods.
//!
//! ## Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  kasir-db: load COMPLETED + PAID sales in [start, end]                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Vec<ReportTransaction>  (items carry product + category snapshot)     │
//! │       │                                                                 │
//! │       ├──► top_products()        top 10 by quantity sold               │
//! │       ├──► category_sales()      by revenue, with % of grand total     │
//! │       ├──► sales_trend()         per UTC calendar day, ascending       │
//! │       ├──► payment_breakdown()   by amount, with % of grand total      │
//! │       └──► SalesSummary::from()  count, revenue, units, AOV            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SalesReport  (cached by the server for the date range)                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every function here is deterministic: the same input list always yields
//! the same output, and ties keep the order in which keys were first seen.

use std::collections::HashMap;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreResult, ValidationError};
use crate::input::PageMeta;
use crate::money::Money;
use crate::types::{Customer, PaymentMethod, ProductDetail};
use crate::{DEFAULT_REPORT_DAYS, TOP_PRODUCTS_LIMIT};

// =============================================================================
// Date Range
// =============================================================================

/// Inclusive UTC range `[start 00:00:00.000, end 23:59:59.999]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DateRange {
    #[ts(as = "String")]
    pub start: DateTime<Utc>,
    #[ts(as = "String")]
    pub end: DateTime<Utc>,
}

impl DateRange {
    /// Normalizes optional query dates into a full-day range.
    ///
    /// Missing bounds default to the [`DEFAULT_REPORT_DAYS`] days ending `today`.
    ///
    /// ## Errors
    /// `startDate` after `endDate`, or an `endDate` too early to have a
    /// default window before it.
    pub fn from_dates(
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        today: NaiveDate,
    ) -> CoreResult<Self> {
        let end_date = end.unwrap_or(today);
        let start_date = match start {
            Some(start) => start,
            None => end_date
                .checked_sub_signed(Duration::days(DEFAULT_REPORT_DAYS - 1))
                .ok_or_else(|| ValidationError::InvalidFormat {
                    field: "endDate".to_string(),
                    reason: "date out of range".to_string(),
                })?,
        };

        if start_date > end_date {
            return Err(ValidationError::InvalidFormat {
                field: "startDate".to_string(),
                reason: "must not be after endDate".to_string(),
            }
            .into());
        }

        Ok(Self {
            start: start_of_day(start_date),
            end: end_of_day(end_date),
        })
    }

    /// The single calendar day `date`.
    pub fn day(date: NaiveDate) -> Self {
        Self {
            start: start_of_day(date),
            end: end_of_day(date),
        }
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at <= self.end
    }

    /// `2026-10-01..2026-10-16`, used in cache keys and export titles.
    pub fn label(&self) -> String {
        format!(
            "{}..{}",
            self.start.date_naive().format("%Y-%m-%d"),
            self.end.date_naive().format("%Y-%m-%d")
        )
    }
}

pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

/// Last millisecond of `date`. Stays in range for `NaiveDate::MAX`.
pub fn end_of_day(date: NaiveDate) -> DateTime<Utc> {
    let last_milli = NaiveTime::MIN + (Duration::days(1) - Duration::milliseconds(1));
    Utc.from_utc_datetime(&date.and_time(last_milli))
}

// =============================================================================
// Input Rows
// =============================================================================

/// A completed sale as seen by the aggregators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportTransaction {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub total: Money,
    pub payment_method: PaymentMethod,
    pub items: Vec<ReportLine>,
}

/// One line item with its product and category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportLine {
    pub product_id: String,
    pub product_name: String,
    pub product_sku: String,
    pub category_id: String,
    pub category_name: String,
    pub quantity: i64,
    pub total_price: Money,
}

// =============================================================================
// Output Rows
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct TopProduct {
    pub product_id: String,
    pub product_name: String,
    pub product_sku: String,
    pub quantity_sold: i64,
    pub revenue: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CategorySales {
    pub category_id: String,
    pub category_name: String,
    /// Units sold.
    pub total_sales: i64,
    pub total_revenue: Money,
    /// Whole percent of the grand total revenue.
    pub percentage: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct TrendPoint {
    /// `YYYY-MM-DD`, UTC.
    pub date: String,
    /// Units sold.
    pub sales: i64,
    pub revenue: Money,
    pub transaction_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PaymentBreakdown {
    pub method: PaymentMethod,
    pub count: i64,
    pub amount: Money,
    pub percentage: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SalesSummary {
    pub total_transactions: i64,
    pub total_revenue: Money,
    /// Units sold across all lines.
    pub total_sales: i64,
    pub average_order_value: Money,
}

impl SalesSummary {
    pub fn from_transactions(transactions: &[ReportTransaction]) -> Self {
        let total_transactions = transactions.len() as i64;
        let total_revenue: Money = transactions.iter().map(|t| t.total).sum();
        let total_sales = transactions
            .iter()
            .flat_map(|t| t.items.iter())
            .map(|item| item.quantity)
            .sum();

        Self {
            total_transactions,
            total_revenue,
            total_sales,
            average_order_value: total_revenue.average_over(total_transactions),
        }
    }
}

/// The full sales report for one date range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SalesReport {
    pub range: DateRange,
    pub summary: SalesSummary,
    pub top_products: Vec<TopProduct>,
    pub category_sales: Vec<CategorySales>,
    pub sales_trend: Vec<TrendPoint>,
    pub payment_methods: Vec<PaymentBreakdown>,
}

impl SalesReport {
    pub fn build(range: DateRange, transactions: &[ReportTransaction]) -> Self {
        Self {
            range,
            summary: SalesSummary::from_transactions(transactions),
            top_products: top_products(transactions),
            category_sales: category_sales(transactions),
            sales_trend: sales_trend(transactions),
            payment_methods: payment_breakdown(transactions),
        }
    }
}

// =============================================================================
// Listing Reports
// =============================================================================

/// Customer with purchase figures inside a date range.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CustomerReportRow {
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    #[serde(flatten)]
    pub customer: Customer,
    pub transaction_count: i64,
    pub total_spent: Money,
    #[ts(as = "Option<String>")]
    pub last_purchase: Option<DateTime<Utc>>,
}

/// Totals over every product matching an inventory filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct InventorySummary {
    pub total_products: i64,
    /// Σ stock × cost.
    pub total_stock_value: Money,
    pub low_stock_count: i64,
    pub out_of_stock_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct InventoryReport {
    pub data: Vec<ProductDetail>,
    pub pagination: PageMeta,
    pub summary: InventorySummary,
}

// =============================================================================
// Aggregators
// =============================================================================

/// Accumulator keyed by string that remembers first-seen order.
struct Grouped<T> {
    index: HashMap<String, usize>,
    rows: Vec<T>,
}

impl<T> Grouped<T> {
    fn new() -> Self {
        Self {
            index: HashMap::new(),
            rows: Vec::new(),
        }
    }

    fn entry(&mut self, key: &str, init: impl FnOnce() -> T) -> &mut T {
        let position = match self.index.get(key) {
            Some(position) => *position,
            None => {
                self.rows.push(init());
                self.index.insert(key.to_string(), self.rows.len() - 1);
                self.rows.len() - 1
            }
        };
        &mut self.rows[position]
    }
}

/// Top 10 products by units sold, descending.
pub fn top_products(transactions: &[ReportTransaction]) -> Vec<TopProduct> {
    let mut grouped = Grouped::new();

    for item in transactions.iter().flat_map(|t| t.items.iter()) {
        let row = grouped.entry(&item.product_id, || TopProduct {
            product_id: item.product_id.clone(),
            product_name: item.product_name.clone(),
            product_sku: item.product_sku.clone(),
            quantity_sold: 0,
            revenue: Money::zero(),
        });
        row.quantity_sold += item.quantity;
        row.revenue += item.total_price;
    }

    let mut rows = grouped.rows;
    rows.sort_by(|a, b| b.quantity_sold.cmp(&a.quantity_sold));
    rows.truncate(TOP_PRODUCTS_LIMIT);
    rows
}

/// Revenue per category, descending, with each category's share.
///
/// ## Example
/// Two categories earning 15.000.000 and 5.000.000 get 75 and 25.
pub fn category_sales(transactions: &[ReportTransaction]) -> Vec<CategorySales> {
    let mut grouped = Grouped::new();

    for item in transactions.iter().flat_map(|t| t.items.iter()) {
        let row = grouped.entry(&item.category_id, || CategorySales {
            category_id: item.category_id.clone(),
            category_name: item.category_name.clone(),
            total_sales: 0,
            total_revenue: Money::zero(),
            percentage: 0,
        });
        row.total_sales += item.quantity;
        row.total_revenue += item.total_price;
    }

    let mut rows = grouped.rows;
    let grand_total: Money = rows.iter().map(|row| row.total_revenue).sum();
    for row in &mut rows {
        row.percentage = row.total_revenue.percentage_of(grand_total);
    }
    rows.sort_by(|a, b| b.total_revenue.cmp(&a.total_revenue));
    rows
}

/// Units, revenue and transaction count per UTC day, ascending by date.
pub fn sales_trend(transactions: &[ReportTransaction]) -> Vec<TrendPoint> {
    let mut grouped = Grouped::new();

    for transaction in transactions {
        let date = transaction.created_at.format("%Y-%m-%d").to_string();
        let row = grouped.entry(&date, || TrendPoint {
            date: date.clone(),
            sales: 0,
            revenue: Money::zero(),
            transaction_count: 0,
        });
        row.sales += transaction.items.iter().map(|item| item.quantity).sum::<i64>();
        row.revenue += transaction.total;
        row.transaction_count += 1;
    }

    let mut rows = grouped.rows;
    rows.sort_by(|a, b| a.date.cmp(&b.date));
    rows
}

/// Count and amount per payment method, descending by amount, with shares.
pub fn payment_breakdown(transactions: &[ReportTransaction]) -> Vec<PaymentBreakdown> {
    let mut grouped = Grouped::new();

    for transaction in transactions {
        let row = grouped.entry(transaction.payment_method.as_str(), || PaymentBreakdown {
            method: transaction.payment_method,
            count: 0,
            amount: Money::zero(),
            percentage: 0,
        });
        row.count += 1;
        row.amount += transaction.total;
    }

    let mut rows = grouped.rows;
    let grand_total: Money = rows.iter().map(|row| row.amount).sum();
    for row in &mut rows {
        row.percentage = row.amount.percentage_of(grand_total);
    }
    rows.sort_by(|a, b| b.amount.cmp(&a.amount));
    rows
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn at(date: &str, time: &str) -> DateTime<Utc> {
        format!("{}T{}Z", date, time).parse().unwrap()
    }

    fn line(product: &str, category: &str, quantity: i64, total: i64) -> ReportLine {
        ReportLine {
            product_id: product.to_string(),
            product_name: format!("Produk {}", product),
            product_sku: format!("SKU-{}", product),
            category_id: category.to_string(),
            category_name: format!("Kategori {}", category),
            quantity,
            total_price: Money::from_minor(total),
        }
    }

    fn sale(
        id: &str,
        created_at: DateTime<Utc>,
        method: PaymentMethod,
        items: Vec<ReportLine>,
    ) -> ReportTransaction {
        let total = items.iter().map(|item| item.total_price).sum();
        ReportTransaction {
            id: id.to_string(),
            created_at,
            total,
            payment_method: method,
            items,
        }
    }

    fn fixture() -> Vec<ReportTransaction> {
        vec![
            sale(
                "t1",
                at("2026-10-02", "09:00:00"),
                PaymentMethod::Cash,
                vec![line("a", "food", 3, 9_000), line("b", "drink", 1, 5_000)],
            ),
            sale(
                "t2",
                at("2026-10-01", "23:30:00"),
                PaymentMethod::Qris,
                vec![line("b", "drink", 4, 20_000)],
            ),
            sale(
                "t3",
                at("2026-10-02", "18:45:00"),
                PaymentMethod::Cash,
                vec![line("c", "food", 2, 30_000), line("a", "food", 1, 3_000)],
            ),
        ]
    }

    #[test]
    fn test_date_range_normalization() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        let start = NaiveDate::from_ymd_opt(2026, 10, 1).unwrap();

        let range = DateRange::from_dates(Some(start), Some(today), today).unwrap();
        assert_eq!(range.start, at("2026-10-01", "00:00:00"));
        assert_eq!(range.end, at("2026-10-16", "23:59:59.999"));
        assert_eq!(range.label(), "2026-10-01..2026-10-16");
    }

    #[test]
    fn test_date_range_defaults_to_thirty_days() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        let range = DateRange::from_dates(None, None, today).unwrap();
        assert_eq!(range.start, at("2026-09-17", "00:00:00"));
        assert!(range.contains(at("2026-10-16", "23:59:59")));
    }

    #[test]
    fn test_date_range_rejects_inverted() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        let start = NaiveDate::from_ymd_opt(2026, 10, 17).unwrap();
        assert!(DateRange::from_dates(Some(start), Some(today), today).is_err());
    }

    #[test]
    fn test_date_range_at_calendar_limits() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();

        let range = DateRange::from_dates(None, Some(NaiveDate::MAX), today).unwrap();
        assert_eq!(range.end.date_naive(), NaiveDate::MAX);
        assert_eq!(DateRange::day(NaiveDate::MAX).end.date_naive(), NaiveDate::MAX);

        let err = DateRange::from_dates(None, Some(NaiveDate::MIN), today).unwrap_err();
        assert!(matches!(
            err,
            crate::error::CoreError::Validation(ValidationError::InvalidFormat { ref field, .. })
                if field == "endDate"
        ));
        assert!(DateRange::from_dates(Some(NaiveDate::MIN), Some(NaiveDate::MIN), today).is_ok());
    }

    #[test]
    fn test_top_products() {
        let top = top_products(&fixture());
        assert_eq!(top[0].product_id, "b");
        assert_eq!(top[0].quantity_sold, 5);
        assert_eq!(top[0].revenue, Money::from_minor(25_000));
        // a: 3 + 1 units, c: 2 units
        assert_eq!(top[1].product_id, "a");
        assert_eq!(top[1].quantity_sold, 4);
        assert_eq!(top[2].product_id, "c");
    }

    #[test]
    fn test_top_products_capped_at_ten() {
        let items = (0..15)
            .map(|i| line(&format!("p{}", i), "food", i + 1, 1_000))
            .collect();
        let top = top_products(&[sale(
            "t",
            at("2026-10-01", "10:00:00"),
            PaymentMethod::Cash,
            items,
        )]);
        assert_eq!(top.len(), 10);
        assert_eq!(top[0].product_id, "p14");
    }

    #[test]
    fn test_category_percentages() {
        let transactions = vec![sale(
            "t",
            at("2026-10-01", "10:00:00"),
            PaymentMethod::Cash,
            vec![
                line("a", "small", 1, 5_000_000),
                line("b", "big", 1, 15_000_000),
            ],
        )];
        let categories = category_sales(&transactions);
        assert_eq!(categories[0].category_id, "big");
        assert_eq!(categories[0].percentage, 75);
        assert_eq!(categories[1].percentage, 25);
    }

    #[test]
    fn test_zero_revenue_percentages_are_zero() {
        let transactions = vec![sale(
            "t",
            at("2026-10-01", "10:00:00"),
            PaymentMethod::Cash,
            vec![line("a", "free", 2, 0)],
        )];
        assert_eq!(category_sales(&transactions)[0].percentage, 0);
        assert_eq!(payment_breakdown(&transactions)[0].percentage, 0);
    }

    #[test]
    fn test_ties_keep_first_seen_order() {
        let transactions = vec![sale(
            "t",
            at("2026-10-01", "10:00:00"),
            PaymentMethod::Cash,
            vec![line("x", "k1", 2, 1_000), line("y", "k2", 2, 1_000)],
        )];
        let top = top_products(&transactions);
        assert_eq!(top[0].product_id, "x");
        assert_eq!(top[1].product_id, "y");
        let categories = category_sales(&transactions);
        assert_eq!(categories[0].category_id, "k1");
    }

    #[test]
    fn test_sales_trend_by_utc_day() {
        let trend = sales_trend(&fixture());
        assert_eq!(trend.len(), 2);
        assert_eq!(trend[0].date, "2026-10-01");
        assert_eq!(trend[0].sales, 4);
        assert_eq!(trend[0].transaction_count, 1);
        assert_eq!(trend[1].date, "2026-10-02");
        assert_eq!(trend[1].sales, 7);
        assert_eq!(trend[1].revenue, Money::from_minor(47_000));
        assert_eq!(trend[1].transaction_count, 2);
    }

    #[test]
    fn test_payment_breakdown() {
        let methods = payment_breakdown(&fixture());
        assert_eq!(methods[0].method, PaymentMethod::Cash);
        assert_eq!(methods[0].count, 2);
        assert_eq!(methods[0].amount, Money::from_minor(47_000));
        assert_eq!(methods[1].method, PaymentMethod::Qris);
        // 47000 / 67000 = 70.1%, 20000 / 67000 = 29.9%
        assert_eq!(methods[0].percentage, 70);
        assert_eq!(methods[1].percentage, 30);
    }

    #[test]
    fn test_summary() {
        let summary = SalesSummary::from_transactions(&fixture());
        assert_eq!(summary.total_transactions, 3);
        assert_eq!(summary.total_revenue, Money::from_minor(67_000));
        assert_eq!(summary.total_sales, 11);
        assert_eq!(summary.average_order_value, Money::from_minor(22_333));

        let empty = SalesSummary::from_transactions(&[]);
        assert_eq!(empty.average_order_value, Money::zero());
        assert_eq!(empty.total_transactions, 0);
    }

    #[test]
    fn test_aggregation_is_idempotent() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        let range = DateRange::from_dates(None, None, today).unwrap();
        let transactions = fixture();

        let first = SalesReport::build(range, &transactions);
        let second = SalesReport::build(range, &transactions);
        assert_eq!(first, second);
    }
}
