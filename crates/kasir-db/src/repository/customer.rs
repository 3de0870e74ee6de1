//! # Customer Repository
//!
//! Customer CRUD, paginated listing and the quick search used at the
//! point of sale. Email is unique when present.

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::{like_pattern, new_id, optional_text};
use kasir_core::input::{CustomerInput, Page, PageRequest};
use kasir_core::Customer;

const CUSTOMER_COLUMNS: &str =
    "id, name, email, phone, address, is_active, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    /// Lists active customers ordered by name, optionally filtered by a
    /// search term over name, email and phone.
    pub async fn list(&self, search: Option<&str>, page: PageRequest) -> DbResult<Page<Customer>> {
        let search = search.map(str::trim).filter(|term| !term.is_empty());

        let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM customers WHERE is_active = 1");
        push_search(&mut count, search);
        let total = count.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

        let mut rows = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE is_active = 1"
        ));
        push_search(&mut rows, search);
        rows.push(" ORDER BY name LIMIT ")
            .push_bind(page.limit)
            .push(" OFFSET ")
            .push_bind(page.offset());

        let customers = rows
            .build_query_as::<Customer>()
            .fetch_all(&self.pool)
            .await?;

        debug!(total, returned = customers.len(), "Listed customers");
        Ok(Page::new(customers, page, total))
    }

    /// Quick search for the checkout screen.
    pub async fn search(&self, query: &str, limit: i64) -> DbResult<Vec<Customer>> {
        let query = query.trim();
        let mut builder = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE is_active = 1"
        ));
        push_search(&mut builder, Some(query).filter(|q| !q.is_empty()));
        builder.push(" ORDER BY name LIMIT ").push_bind(limit);

        let customers = builder
            .build_query_as::<Customer>()
            .fetch_all(&self.pool)
            .await?;
        Ok(customers)
    }

    pub async fn get(&self, id: &str) -> DbResult<Customer> {
        let sql = format!("SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = ? AND is_active = 1");
        sqlx::query_as::<_, Customer>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Customer", id))
    }

    /// Creates a customer.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - email already registered
    pub async fn create(&self, input: &CustomerInput) -> DbResult<Customer> {
        input.validate()?;

        let now = Utc::now();
        let customer = Customer {
            id: new_id(),
            name: input.name.trim().to_string(),
            email: optional_text(&input.email),
            phone: optional_text(&input.phone),
            address: optional_text(&input.address),
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO customers (id, name, email, phone, address, is_active, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, 1, ?, ?)
            "#,
        )
        .bind(&customer.id)
        .bind(&customer.name)
        .bind(&customer.email)
        .bind(&customer.phone)
        .bind(&customer.address)
        .bind(customer.created_at)
        .bind(customer.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| duplicate_email(e, &customer.email))?;

        info!(id = %customer.id, "Customer created");
        Ok(customer)
    }

    /// Replaces every editable field.
    pub async fn update(&self, id: &str, input: &CustomerInput) -> DbResult<Customer> {
        input.validate()?;

        let email = optional_text(&input.email);
        let result = sqlx::query(
            r#"
            UPDATE customers SET name = ?, email = ?, phone = ?, address = ?, updated_at = ?
            WHERE id = ? AND is_active = 1
            "#,
        )
        .bind(input.name.trim())
        .bind(&email)
        .bind(optional_text(&input.phone))
        .bind(optional_text(&input.address))
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| duplicate_email(e, &email))?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", id));
        }

        self.get(id).await
    }

    /// Deactivates a customer. Past transactions keep the reference.
    pub async fn soft_delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE customers SET is_active = 0, updated_at = ? WHERE id = ? AND is_active = 1",
        )
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", id));
        }

        info!(id = %id, "Customer deactivated");
        Ok(())
    }
}

fn push_search<'a>(builder: &mut QueryBuilder<'a, Sqlite>, search: Option<&str>) {
    if let Some(term) = search {
        let pattern = like_pattern(term);
        builder
            .push(" AND (name LIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\' OR email LIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\' OR phone LIKE ")
            .push_bind(pattern)
            .push(" ESCAPE '\\')");
    }
}

fn duplicate_email(err: sqlx::Error, email: &Option<String>) -> DbError {
    DbError::from(err).with_value("email", email.as_deref().unwrap_or_default())
}
