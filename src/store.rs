//! Store adapter: the persistence collaborator the hub depends on.
//!
//! The hub only ever talks to this trait. [`Database`](crate::db::Database)
//! is the production implementation; tests may substitute their own.

use async_trait::async_trait;
use thiserror::Error;

/// Errors surfaced by a [`Store`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("already exists: {0}")]
    AlreadyExists(String),
    #[error("storage error: {0}")]
    Storage(String),
}

impl StoreError {
    /// Static label for metrics.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::AlreadyExists(_) => "already_exists",
            Self::Storage(_) => "storage",
        }
    }
}

/// Identity record fetched at connection time.
///
/// A transient copy; the store stays authoritative.
#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
}

/// Credential and friend-graph persistence.
#[async_trait]
pub trait Store: Send + Sync {
    /// Look up a user by exact username.
    async fn get_user(&self, username: &str) -> Result<User, StoreError>;

    /// Create a user; the password is hashed before it is stored.
    async fn create_user(&self, username: &str, password: &str) -> Result<(), StoreError>;

    /// Usernames `username` has a directed edge to, sorted.
    async fn list_friends(&self, username: &str) -> Result<Vec<String>, StoreError>;

    /// Insert the directed edge (`owner` -> `friend`).
    async fn add_friend_edge(&self, owner: &str, friend: &str) -> Result<(), StoreError>;

    /// Delete the directed edge (`owner` -> `friend`). Absent edges are not an error.
    async fn remove_friend_edge(&self, owner: &str, friend: &str) -> Result<(), StoreError>;
}
