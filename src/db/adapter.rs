//! [`Store`] implementation over SQLite.

use async_trait::async_trait;

use super::{Database, DbError};
use crate::store::{Store, StoreError, User};

impl From<DbError> for StoreError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::UserNotFound(u) => StoreError::NotFound(u),
            DbError::UserExists(u) => StoreError::AlreadyExists(u),
            DbError::FriendExists(a, b) => StoreError::AlreadyExists(format!("{a} -> {b}")),
            other => StoreError::Storage(other.to_string()),
        }
    }
}

#[async_trait]
impl Store for Database {
    async fn get_user(&self, username: &str) -> Result<User, StoreError> {
        self.users()
            .find_by_username(username)
            .await?
            .map(|r| User {
                id: r.id,
                username: r.username,
                password_hash: r.password_hash,
            })
            .ok_or_else(|| StoreError::NotFound(username.to_string()))
    }

    async fn create_user(&self, username: &str, password: &str) -> Result<(), StoreError> {
        self.users().create(username, password).await?;
        Ok(())
    }

    async fn list_friends(&self, username: &str) -> Result<Vec<String>, StoreError> {
        Ok(self.friends().list(username).await?)
    }

    async fn add_friend_edge(&self, owner: &str, friend: &str) -> Result<(), StoreError> {
        Ok(self.friends().add(owner, friend).await?)
    }

    async fn remove_friend_edge(&self, owner: &str, friend: &str) -> Result<(), StoreError> {
        self.friends().remove(owner, friend).await?;
        Ok(())
    }
}
