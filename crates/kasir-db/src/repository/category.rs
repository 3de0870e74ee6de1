//! # Category Repository
//!
//! Product categories. Listing includes the number of active products in
//! each category; a category still holding active products cannot be
//! deactivated.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::{new_id, optional_text};
use kasir_core::input::CategoryInput;
use kasir_core::{Category, CategoryWithCount};

const CATEGORY_COLUMNS: &str = "id, name, description, is_active, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct CategoryRepository {
    pool: SqlitePool,
}

impl CategoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CategoryRepository { pool }
    }

    /// Lists categories ordered by name with their active product counts.
    pub async fn list(&self, include_inactive: bool) -> DbResult<Vec<CategoryWithCount>> {
        let categories = sqlx::query_as::<_, CategoryWithCount>(
            r#"
            SELECT
                c.id, c.name, c.description, c.is_active, c.created_at, c.updated_at,
                (SELECT COUNT(*) FROM products p
                 WHERE p.category_id = c.id AND p.is_active = 1) AS product_count
            FROM categories c
            WHERE c.is_active = 1 OR ?
            ORDER BY c.name
            "#,
        )
        .bind(include_inactive)
        .fetch_all(&self.pool)
        .await?;

        debug!(count = categories.len(), "Listed categories");
        Ok(categories)
    }

    pub async fn get(&self, id: &str) -> DbResult<Category> {
        let sql = format!("SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = ?");
        sqlx::query_as::<_, Category>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Category", id))
    }

    /// Creates a category.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - name already used
    pub async fn create(&self, input: &CategoryInput) -> DbResult<Category> {
        input.validate()?;

        let now = Utc::now();
        let category = Category {
            id: new_id(),
            name: input.name.trim().to_string(),
            description: optional_text(&input.description),
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO categories (id, name, description, is_active, created_at, updated_at)
            VALUES (?, ?, ?, 1, ?, ?)
            "#,
        )
        .bind(&category.id)
        .bind(&category.name)
        .bind(&category.description)
        .bind(category.created_at)
        .bind(category.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from(e).with_value("name", &category.name))?;

        info!(id = %category.id, name = %category.name, "Category created");
        Ok(category)
    }

    /// Replaces name and description.
    pub async fn update(&self, id: &str, input: &CategoryInput) -> DbResult<Category> {
        input.validate()?;

        let name = input.name.trim().to_string();
        let result = sqlx::query(
            "UPDATE categories SET name = ?, description = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&name)
        .bind(optional_text(&input.description))
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from(e).with_value("name", &name))?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Category", id));
        }

        self.get(id).await
    }

    /// Deactivates a category.
    ///
    /// ## Returns
    /// * `Err(DbError::Conflict)` - active products still reference it
    pub async fn soft_delete(&self, id: &str) -> DbResult<()> {
        let active_products: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM products WHERE category_id = ? AND is_active = 1",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        if active_products > 0 {
            return Err(DbError::Conflict(format!(
                "category {id} still has {active_products} active products"
            )));
        }

        let result = sqlx::query(
            "UPDATE categories SET is_active = 0, updated_at = ? WHERE id = ? AND is_active = 1",
        )
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Category", id));
        }

        info!(id = %id, "Category deactivated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support;

    fn input(name: &str) -> CategoryInput {
        CategoryInput {
            name: name.to_string(),
            description: Some("Mie instan dan sejenisnya".to_string()),
        }
    }

    #[tokio::test]
    async fn test_list_counts_active_products() {
        let db = test_support::database().await;
        let user = test_support::cashier(&db).await;
        let food = test_support::category(&db, "Makanan").await;
        test_support::category(&db, "Minuman").await;

        test_support::product(&db, &user, &food, "MKN-001", 3_000, 10).await;
        let retired = test_support::product(&db, &user, &food, "MKN-002", 3_000, 10).await;
        db.products().soft_delete(&retired).await.unwrap();

        let categories = db.categories().list(false).await.unwrap();
        assert_eq!(categories.len(), 2);
        assert_eq!(categories[0].category.name, "Makanan");
        assert_eq!(categories[0].product_count, 1);
        assert_eq!(categories[1].product_count, 0);
    }

    #[tokio::test]
    async fn test_duplicate_name_is_rejected() {
        let db = test_support::database().await;
        db.categories().create(&input("Makanan")).await.unwrap();

        let err = db.categories().create(&input("Makanan")).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { ref field, .. } if field == "name"));
    }

    #[tokio::test]
    async fn test_update_and_soft_delete() {
        let db = test_support::database().await;
        let repo = db.categories();
        let created = repo.create(&input("Snack")).await.unwrap();

        let updated = repo
            .update(&created.id, &CategoryInput {
                name: "Makanan Ringan".to_string(),
                description: Some("".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(updated.name, "Makanan Ringan");
        assert_eq!(updated.description, None);

        repo.soft_delete(&created.id).await.unwrap();
        assert!(repo.list(false).await.unwrap().is_empty());
        assert_eq!(repo.list(true).await.unwrap().len(), 1);
        assert!(matches!(
            repo.soft_delete(&created.id).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_delete_with_active_products_conflicts() {
        let db = test_support::database().await;
        let user = test_support::cashier(&db).await;
        let food = test_support::category(&db, "Makanan").await;
        test_support::product(&db, &user, &food, "MKN-001", 3_000, 10).await;

        let err = db.categories().soft_delete(&food).await.unwrap_err();
        assert!(matches!(err, DbError::Conflict(_)));
        assert!(db.categories().get(&food).await.unwrap().is_active);
    }
}
