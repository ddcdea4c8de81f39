//! User repository: credentials keyed by username.

use super::{DbError, is_unique_violation};
use crate::security::hash_password;
use sqlx::SqlitePool;

/// A stored user row.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub created_at: i64,
}

/// Repository for user operations.
pub struct UserRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Register a user. The password is hashed with Argon2 before insert.
    pub async fn create(&self, username: &str, password: &str) -> Result<i64, DbError> {
        let password_hash =
            hash_password(password).map_err(|e| DbError::PasswordHash(e.to_string()))?;
        let now = chrono::Utc::now().timestamp();

        let result = sqlx::query(
            r#"
            INSERT INTO users (username, password_hash, created_at)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(username)
        .bind(&password_hash)
        .bind(now)
        .execute(self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                return DbError::UserExists(username.to_string());
            }
            DbError::from(e)
        })?;

        Ok(result.last_insert_rowid())
    }

    /// Find a user by exact username.
    pub async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, DbError> {
        let row = sqlx::query_as::<_, (i64, String, String, i64)>(
            r#"
            SELECT id, username, password_hash, created_at
            FROM users
            WHERE username = ?
            "#,
        )
        .bind(username)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(|(id, username, password_hash, created_at)| UserRecord {
            id,
            username,
            password_hash,
            created_at,
        }))
    }

    /// Resolve a username to its row id.
    pub async fn id_of(&self, username: &str) -> Result<i64, DbError> {
        sqlx::query_scalar::<_, i64>("SELECT id FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| DbError::UserNotFound(username.to_string()))
    }
}
