//! # Barcode Repository
//!
//! Scanner lookups at the point of sale. Every scan is logged, hit or miss,
//! so unknown barcodes can be added to the catalogue later.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, warn};

use crate::error::{DbError, DbResult};
use crate::repository::new_id;
use crate::repository::product::ProductRepository;
use kasir_core::{BarcodeLog, ProductDetail};

#[derive(Debug, Clone)]
pub struct BarcodeRepository {
    pool: SqlitePool,
}

impl BarcodeRepository {
    pub fn new(pool: SqlitePool) -> Self {
        BarcodeRepository { pool }
    }

    /// Resolves a scanned barcode to an active product and logs the scan.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - no active product carries the barcode
    ///   (the miss is still logged)
    pub async fn lookup(&self, barcode: &str, user_id: &str) -> DbResult<ProductDetail> {
        let barcode = barcode.trim();
        let product = ProductRepository::new(self.pool.clone())
            .find_by_barcode(barcode)
            .await?;

        let log = BarcodeLog {
            id: new_id(),
            barcode: barcode.to_string(),
            product_id: product.as_ref().map(|p| p.product.id.clone()),
            user_id: user_id.to_string(),
            found: product.is_some(),
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO barcode_logs (id, barcode, product_id, user_id, found, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&log.id)
        .bind(&log.barcode)
        .bind(&log.product_id)
        .bind(&log.user_id)
        .bind(log.found)
        .bind(log.created_at)
        .execute(&self.pool)
        .await?;

        match product {
            Some(product) => {
                debug!(barcode = %barcode, product_id = %product.product.id, "Barcode matched");
                Ok(product)
            }
            None => {
                warn!(barcode = %barcode, "Unknown barcode scanned");
                Err(DbError::not_found("Product", barcode))
            }
        }
    }
}
