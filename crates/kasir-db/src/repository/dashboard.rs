//! # Dashboard Repository
//!
//! Gathers the raw counters behind the dashboard cards. The comparison
//! against yesterday is computed by `kasir_core::dashboard`.
//!
//! ## Windows (UTC)
//! ```text
//! revenue / transactions   today's calendar day  vs  yesterday's
//! active customers         (now − 30d, now]      vs  (now − 31d, now − 1d]
//! total stock              Σ stock now           vs  Σ stock − today's net movements
//! ```

use chrono::{DateTime, Duration, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use kasir_core::dashboard::{DashboardCounts, DashboardStats};
use kasir_core::report::DateRange;
use kasir_core::stock::net_delta;
use kasir_core::{Money, MovementType};

#[derive(Debug, Clone)]
pub struct DashboardRepository {
    pool: SqlitePool,
}

impl DashboardRepository {
    pub fn new(pool: SqlitePool) -> Self {
        DashboardRepository { pool }
    }

    /// Dashboard cards as of `now`.
    pub async fn stats(&self, now: DateTime<Utc>) -> DbResult<DashboardStats> {
        Ok(self.counts(now).await?.into())
    }

    pub async fn counts(&self, now: DateTime<Utc>) -> DbResult<DashboardCounts> {
        let today = DateRange::day(now.date_naive());
        let yesterday = DateRange::day(now.date_naive() - Duration::days(1));

        let (today_transactions, today_revenue) = self.sales_in(&today).await?;
        let (yesterday_transactions, yesterday_revenue) = self.sales_in(&yesterday).await?;

        let active_customers = self
            .customers_between(now - Duration::days(30), now)
            .await?;
        let previous_active_customers = self
            .customers_between(now - Duration::days(31), now - Duration::days(1))
            .await?;

        let (total_stock, low_stock_count): (i64, i64) = sqlx::query_as(
            r#"
            SELECT
                COALESCE(SUM(stock), 0),
                COALESCE(SUM(CASE WHEN stock <= min_stock THEN 1 ELSE 0 END), 0)
            FROM products
            WHERE is_active = 1
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        let movements: Vec<(MovementType, i64)> = sqlx::query_as(
            r#"
            SELECT m.movement_type, m.quantity
            FROM stock_movements m
            JOIN products p ON p.id = m.product_id
            WHERE p.is_active = 1 AND m.created_at >= ? AND m.created_at <= ?
            "#,
        )
        .bind(today.start)
        .bind(today.end)
        .fetch_all(&self.pool)
        .await?;

        let counts = DashboardCounts {
            today_revenue,
            yesterday_revenue,
            today_transactions,
            yesterday_transactions,
            active_customers,
            previous_active_customers,
            total_stock,
            todays_stock_delta: net_delta(movements),
            low_stock_count,
        };
        debug!(?counts, "Dashboard counts");
        Ok(counts)
    }

    /// Completed transaction count and revenue inside `range`.
    async fn sales_in(&self, range: &DateRange) -> DbResult<(i64, Money)> {
        let row = sqlx::query_as(
            r#"
            SELECT COUNT(*), COALESCE(SUM(total), 0)
            FROM transactions
            WHERE status = 'COMPLETED' AND created_at >= ? AND created_at <= ?
            "#,
        )
        .bind(range.start)
        .bind(range.end)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    /// Distinct customers with a completed sale in `(from, to]`.
    async fn customers_between(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> DbResult<i64> {
        let count = sqlx::query_scalar(
            r#"
            SELECT COUNT(DISTINCT customer_id)
            FROM transactions
            WHERE status = 'COMPLETED'
              AND customer_id IS NOT NULL
              AND created_at > ? AND created_at <= ?
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support;
    use kasir_core::dashboard::ChangeType;
    use kasir_core::input::{CustomerInput, SaleInput, SaleLineInput};
    use kasir_core::PaymentMethod;

    fn sale(product_id: &str, quantity: i64, price: i64, customer_id: Option<String>) -> SaleInput {
        let total = Money::from_minor(quantity * price);
        SaleInput {
            items: vec![SaleLineInput {
                product_id: product_id.to_string(),
                quantity,
                unit_price: Money::from_minor(price),
                discount: Money::zero(),
            }],
            customer_id,
            payment_method: PaymentMethod::Cash,
            subtotal: total,
            tax_amount: Money::zero(),
            discount_amount: Money::zero(),
            total,
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_empty_database() {
        let db = test_support::database().await;
        let stats = db.dashboard().stats(Utc::now()).await.unwrap();

        assert_eq!(stats.today_sales.value, Money::zero());
        assert_eq!(stats.today_sales.change_type, ChangeType::Neutral);
        assert_eq!(stats.total_stock.value, 0);
        assert_eq!(stats.low_stock_count, 0);
    }

    #[tokio::test]
    async fn test_today_versus_yesterday() {
        let db = test_support::database().await;
        let user = test_support::cashier(&db).await;
        let food = test_support::category(&db, "Makanan").await;
        let id = test_support::product(&db, &user, &food, "DSH-1", 10_000, 50).await;
        let customer = db
            .customers()
            .create(&CustomerInput {
                name: "Dewi".to_string(),
                email: None,
                phone: None,
                address: None,
            })
            .await
            .unwrap();

        let old = db.sales().create(&user.id, sale(&id, 2, 10_000, None)).await.unwrap();
        db.sales()
            .create(&user.id, sale(&id, 3, 10_000, Some(customer.id.clone())))
            .await
            .unwrap();

        // Move the first sale to yesterday
        let now = Utc::now();
        sqlx::query("UPDATE transactions SET created_at = ? WHERE id = ?")
            .bind(now - Duration::days(1))
            .bind(&old.transaction.id)
            .execute(db.pool())
            .await
            .unwrap();

        let counts = db.dashboard().counts(now).await.unwrap();
        assert_eq!(counts.today_revenue, Money::from_minor(30_000));
        assert_eq!(counts.yesterday_revenue, Money::from_minor(20_000));
        assert_eq!(counts.today_transactions, 1);
        assert_eq!(counts.yesterday_transactions, 1);
        assert_eq!(counts.active_customers, 1);
        assert_eq!(counts.total_stock, 45);
        // IN 50 (opening stock), SALE 2, SALE 3 all recorded today
        assert_eq!(counts.todays_stock_delta, 45);

        let stats = DashboardStats::from(counts);
        assert_eq!(stats.today_sales.change, 50.0);
        assert_eq!(stats.today_sales.change_type, ChangeType::Increase);
        assert_eq!(stats.total_stock.previous, 0);
    }

    #[tokio::test]
    async fn test_low_stock_count() {
        let db = test_support::database().await;
        let user = test_support::cashier(&db).await;
        let food = test_support::category(&db, "Makanan").await;
        // min_stock is 5 in the fixture
        test_support::product(&db, &user, &food, "LOW-1", 1_000, 5).await;
        test_support::product(&db, &user, &food, "LOW-2", 1_000, 0).await;
        test_support::product(&db, &user, &food, "OK-1", 1_000, 6).await;

        let stats = db.dashboard().stats(Utc::now()).await.unwrap();
        assert_eq!(stats.low_stock_count, 2);
        assert_eq!(stats.total_stock.value, 11);
    }
}
