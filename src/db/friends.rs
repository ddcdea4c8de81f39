//! Friend repository: the directed friend graph.
//!
//! A mutual friendship is two edges, one per direction. Nothing here
//! enforces symmetry.

use super::{DbError, UserRepository, is_unique_violation};
use sqlx::SqlitePool;

/// Repository for friend edge operations.
pub struct FriendRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> FriendRepository<'a> {
    /// Create a new friend repository.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Resolve both endpoints of an edge.
    async fn endpoints(&self, owner: &str, friend: &str) -> Result<(i64, i64), DbError> {
        let users = UserRepository::new(self.pool);
        Ok((users.id_of(owner).await?, users.id_of(friend).await?))
    }

    /// Usernames `username` has an edge to, sorted.
    pub async fn list(&self, username: &str) -> Result<Vec<String>, DbError> {
        let user_id = UserRepository::new(self.pool).id_of(username).await?;

        let friends = sqlx::query_scalar::<_, String>(
            r#"
            SELECT u.username
            FROM friends f
            JOIN users u ON u.id = f.friend_id
            WHERE f.user_id = ?
            ORDER BY u.username
            "#,
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(friends)
    }

    /// Insert the edge (`owner` -> `friend`).
    pub async fn add(&self, owner: &str, friend: &str) -> Result<(), DbError> {
        let (owner_id, friend_id) = self.endpoints(owner, friend).await?;
        let now = chrono::Utc::now().timestamp();

        sqlx::query(
            r#"
            INSERT INTO friends (user_id, friend_id, created_at)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(owner_id)
        .bind(friend_id)
        .bind(now)
        .execute(self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                return DbError::FriendExists(owner.to_string(), friend.to_string());
            }
            DbError::from(e)
        })?;

        Ok(())
    }

    /// Delete the edge (`owner` -> `friend`).
    ///
    /// Returns whether an edge was removed; a missing edge is not an error.
    pub async fn remove(&self, owner: &str, friend: &str) -> Result<bool, DbError> {
        let (owner_id, friend_id) = self.endpoints(owner, friend).await?;

        let result = sqlx::query("DELETE FROM friends WHERE user_id = ? AND friend_id = ?")
            .bind(owner_id)
            .bind(friend_id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
