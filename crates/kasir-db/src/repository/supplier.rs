//! # Supplier Repository

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::info;

use crate::error::{DbError, DbResult};
use crate::repository::{new_id, optional_text};
use kasir_core::input::SupplierInput;
use kasir_core::{Supplier, SupplierWithCount};

const SUPPLIER_COLUMNS: &str =
    "id, name, contact_person, phone, email, address, is_active, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct SupplierRepository {
    pool: SqlitePool,
}

impl SupplierRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SupplierRepository { pool }
    }

    /// Lists suppliers ordered by name with their active product counts.
    pub async fn list(&self, include_inactive: bool) -> DbResult<Vec<SupplierWithCount>> {
        let suppliers = sqlx::query_as::<_, SupplierWithCount>(
            r#"
            SELECT
                s.id, s.name, s.contact_person, s.phone, s.email, s.address,
                s.is_active, s.created_at, s.updated_at,
                (SELECT COUNT(*) FROM products p
                 WHERE p.supplier_id = s.id AND p.is_active = 1) AS product_count
            FROM suppliers s
            WHERE s.is_active = 1 OR ?
            ORDER BY s.name
            "#,
        )
        .bind(include_inactive)
        .fetch_all(&self.pool)
        .await?;

        Ok(suppliers)
    }

    pub async fn get(&self, id: &str) -> DbResult<Supplier> {
        let sql = format!("SELECT {SUPPLIER_COLUMNS} FROM suppliers WHERE id = ?");
        sqlx::query_as::<_, Supplier>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Supplier", id))
    }

    pub async fn create(&self, input: &SupplierInput) -> DbResult<Supplier> {
        input.validate()?;

        let now = Utc::now();
        let supplier = Supplier {
            id: new_id(),
            name: input.name.trim().to_string(),
            contact_person: optional_text(&input.contact_person),
            phone: optional_text(&input.phone),
            email: optional_text(&input.email),
            address: optional_text(&input.address),
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO suppliers (
                id, name, contact_person, phone, email, address,
                is_active, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, 1, ?, ?)
            "#,
        )
        .bind(&supplier.id)
        .bind(&supplier.name)
        .bind(&supplier.contact_person)
        .bind(&supplier.phone)
        .bind(&supplier.email)
        .bind(&supplier.address)
        .bind(supplier.created_at)
        .bind(supplier.updated_at)
        .execute(&self.pool)
        .await?;

        info!(id = %supplier.id, name = %supplier.name, "Supplier created");
        Ok(supplier)
    }

    /// Replaces every editable field.
    pub async fn update(&self, id: &str, input: &SupplierInput) -> DbResult<Supplier> {
        input.validate()?;

        let result = sqlx::query(
            r#"
            UPDATE suppliers SET
                name = ?, contact_person = ?, phone = ?, email = ?, address = ?,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(input.name.trim())
        .bind(optional_text(&input.contact_person))
        .bind(optional_text(&input.phone))
        .bind(optional_text(&input.email))
        .bind(optional_text(&input.address))
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Supplier", id));
        }

        self.get(id).await
    }

    /// Deactivates a supplier. Products keep their reference.
    pub async fn soft_delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE suppliers SET is_active = 0, updated_at = ? WHERE id = ? AND is_active = 1",
        )
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Supplier", id));
        }

        info!(id = %id, "Supplier deactivated");
        Ok(())
    }
}
