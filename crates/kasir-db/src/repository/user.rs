//! # User Repository
//!
//! Account lookups for login and session resolution. Passwords arrive here
//! already hashed; hashing lives in the server's auth module.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::new_id;
use kasir_core::{Role, User};

const USER_COLUMNS: &str =
    "id, username, name, role, password_hash, is_active, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Finds an active user by username (case-sensitive).
    ///
    /// ## Returns
    /// * `Ok(None)` - unknown or deactivated account
    pub async fn find_by_username(&self, username: &str) -> DbResult<Option<User>> {
        debug!(username = %username, "Looking up user");

        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE username = ? AND is_active = 1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Gets an active user by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<User> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ? AND is_active = 1");
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("User", id))
    }

    /// Creates a user account.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - username taken
    pub async fn create(
        &self,
        username: &str,
        name: &str,
        role: Role,
        password_hash: &str,
    ) -> DbResult<User> {
        debug!(username = %username, role = role.as_str(), "Creating user");

        let now = Utc::now();
        let user = User {
            id: new_id(),
            username: username.trim().to_string(),
            name: name.trim().to_string(),
            role,
            password_hash: password_hash.to_string(),
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO users (id, username, name, role, password_hash, is_active, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, 1, ?, ?)
            "#,
        )
        .bind(&user.id)
        .bind(&user.username)
        .bind(&user.name)
        .bind(user.role)
        .bind(&user.password_hash)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from(e).with_value("username", &user.username))?;

        Ok(user)
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support;

    #[tokio::test]
    async fn test_create_and_find() {
        let db = test_support::database().await;
        let users = db.users();

        let created = users
            .create("admin", "Budi Admin", Role::Admin, "$argon2id$stub")
            .await
            .unwrap();

        let found = users.find_by_username("admin").await.unwrap().unwrap();
        assert_eq!(found.id, created.id);
        assert_eq!(found.role, Role::Admin);
        assert_eq!(found.password_hash, "$argon2id$stub");

        assert!(users.find_by_username("nobody").await.unwrap().is_none());
        assert_eq!(users.get_by_id(&created.id).await.unwrap().name, "Budi Admin");
        assert_eq!(users.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_username() {
        let db = test_support::database().await;
        let users = db.users();

        users.create("kasir", "A", Role::Cashier, "h").await.unwrap();
        let err = users.create("kasir", "B", Role::Cashier, "h").await.unwrap_err();

        assert!(
            matches!(err, DbError::UniqueViolation { ref field, ref value } if field == "username" && value == "kasir")
        );
    }
}
