//! # User Repository
//!
//! Staff accounts. Passwords arrive here already hashed; hashing and
//! verification belong to the API's auth module.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::generate_id;
use pharmapos_core::validation::validate_username;
use pharmapos_core::{CoreError, User, UserRole};

/// Repository for user database operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    pub async fn list(&self) -> DbResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY username")
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    pub async fn get(&self, id: &str) -> DbResult<User> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("User", id))
    }

    /// Looks up an account for login.
    pub async fn find_by_username(&self, username: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = ?1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// Creates an account.
    ///
    /// `UniqueViolation` when the username is taken.
    pub async fn create(&self, username: &str, password_hash: &str, role: UserRole) -> DbResult<User> {
        validate_username(username).map_err(CoreError::from)?;

        let user = User {
            id: generate_id(),
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            role,
            created_at: Utc::now(),
        };

        debug!(username = %user.username, role = %role.as_str(), "Inserting user");

        sqlx::query(
            r#"
            INSERT INTO users (id, username, password_hash, role, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&user.id)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.role)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate("username", username),
            other => other,
        })?;

        info!(id = %user.id, username = %user.username, "User created");
        Ok(user)
    }

    /// Updates whichever of username, password hash and role are given.
    pub async fn update(
        &self,
        id: &str,
        username: Option<&str>,
        password_hash: Option<&str>,
        role: Option<UserRole>,
    ) -> DbResult<User> {
        if let Some(name) = username {
            validate_username(name).map_err(CoreError::from)?;
        }

        let result = sqlx::query(
            r#"
            UPDATE users SET
                username = COALESCE(?2, username),
                password_hash = COALESCE(?3, password_hash),
                role = COALESCE(?4, role)
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(username)
        .bind(password_hash)
        .bind(role)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => {
                DbError::duplicate("username", username.unwrap_or_default())
            }
            other => other,
        })?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }
        self.get(id).await
    }

    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }
        info!(id = %id, "User deleted");
        Ok(())
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::db;

    #[tokio::test]
    async fn test_user_lifecycle() {
        let db = db().await;
        let repo = db.users();

        let user = repo.create("cashier", "hash-1", UserRole::Cashier).await.unwrap();
        assert_eq!(repo.count().await.unwrap(), 1);

        let found = repo.find_by_username("cashier").await.unwrap().unwrap();
        assert_eq!(found.password_hash, "hash-1");
        assert!(repo.find_by_username("nobody").await.unwrap().is_none());

        let promoted = repo
            .update(&user.id, None, Some("hash-2"), Some(UserRole::Pharmacist))
            .await
            .unwrap();
        assert_eq!(promoted.role, UserRole::Pharmacist);
        assert_eq!(promoted.password_hash, "hash-2");
        assert_eq!(promoted.username, "cashier");

        repo.delete(&user.id).await.unwrap();
        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_duplicate_username() {
        let db = db().await;
        let repo = db.users();
        repo.create("admin", "h", UserRole::Admin).await.unwrap();
        let err = repo.create("admin", "h", UserRole::Cashier).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { ref field, .. } if field == "username"));
    }
}
