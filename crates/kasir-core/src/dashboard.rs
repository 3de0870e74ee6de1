//! # Dashboard Stats
//!
//! Day-over-day comparison for the dashboard cards.
//!
//! ## Percentage Change
//! ```text
//! ┌──────────────────────┬────────────────────────────┬─────────────┐
//! │ today vs yesterday   │ change                     │ changeType  │
//! ├──────────────────────┼────────────────────────────┼─────────────┤
//! │ yesterday > 0        │ (today - yest) / yest × 100│ sign        │
//! │ yesterday = 0, t > 0 │ 100                        │ increase    │
//! │ both 0               │ 0                          │ neutral     │
//! └──────────────────────┴────────────────────────────┴─────────────┘
//! ```
//!
//! The database layer gathers the raw counts (`DashboardCounts`); this module
//! turns them into the card values.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::stock;

/// Direction of a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum ChangeType {
    Increase,
    Decrease,
    Neutral,
}

impl ChangeType {
    pub fn of(change: f64) -> Self {
        if change > 0.0 {
            ChangeType::Increase
        } else if change < 0.0 {
            ChangeType::Decrease
        } else {
            ChangeType::Neutral
        }
    }
}

/// Percentage change from `yesterday` to `today`.
///
/// ## Example
/// ```rust
/// use kasir_core::dashboard::percentage_change;
///
/// assert_eq!(percentage_change(0.0, 0.0), 0.0);
/// assert_eq!(percentage_change(5.0, 0.0), 100.0);
/// assert_eq!(percentage_change(80.0, 100.0), -20.0);
/// ```
pub fn percentage_change(today: f64, yesterday: f64) -> f64 {
    if yesterday > 0.0 {
        (today - yesterday) / yesterday * 100.0
    } else if today > 0.0 {
        100.0
    } else {
        0.0
    }
}

/// One dashboard card: the current value and its change versus yesterday.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct StatValue<T> {
    pub value: T,
    pub previous: T,
    /// Rounded to one decimal place.
    pub change: f64,
    pub change_type: ChangeType,
}

impl StatValue<i64> {
    pub fn count(today: i64, yesterday: i64) -> Self {
        Self::build(today, yesterday, today as f64, yesterday as f64)
    }
}

impl StatValue<Money> {
    pub fn money(today: Money, yesterday: Money) -> Self {
        Self::build(
            today,
            yesterday,
            today.minor() as f64,
            yesterday.minor() as f64,
        )
    }
}

impl<T> StatValue<T> {
    fn build(value: T, previous: T, today: f64, yesterday: f64) -> Self {
        let change = percentage_change(today, yesterday);
        Self {
            value,
            previous,
            change: (change * 10.0).round() / 10.0,
            change_type: ChangeType::of(change),
        }
    }
}

/// Raw figures gathered by the database layer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DashboardCounts {
    pub today_revenue: Money,
    pub yesterday_revenue: Money,
    pub today_transactions: i64,
    pub yesterday_transactions: i64,
    /// Distinct customers with a completed sale in the 30 days ending now.
    pub active_customers: i64,
    /// Same, for the 30 days ending 24 hours ago.
    pub previous_active_customers: i64,
    /// Sum of stock over active products.
    pub total_stock: i64,
    /// Signed sum of today's movements (see [`stock::net_delta`]).
    pub todays_stock_delta: i64,
    pub low_stock_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DashboardStats {
    pub today_sales: StatValue<Money>,
    pub today_transactions: StatValue<i64>,
    pub active_customers: StatValue<i64>,
    pub total_stock: StatValue<i64>,
    pub low_stock_count: i64,
}

impl From<DashboardCounts> for DashboardStats {
    fn from(counts: DashboardCounts) -> Self {
        let yesterday_stock = stock::previous_total(counts.total_stock, counts.todays_stock_delta);

        Self {
            today_sales: StatValue::money(counts.today_revenue, counts.yesterday_revenue),
            today_transactions: StatValue::count(
                counts.today_transactions,
                counts.yesterday_transactions,
            ),
            active_customers: StatValue::count(
                counts.active_customers,
                counts.previous_active_customers,
            ),
            total_stock: StatValue::count(counts.total_stock, yesterday_stock),
            low_stock_count: counts.low_stock_count,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
