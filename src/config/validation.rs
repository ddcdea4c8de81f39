//! Configuration validation.
//!
//! Validates configuration at startup to catch common errors early.

use super::Config;
use std::path::Path;
use thiserror::Error;

/// Validation errors for configuration.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("limits.send_queue must be at least 1")]
    ZeroSendQueue,
    #[error("websocket.path must start with '/', got '{0}'")]
    InvalidWebSocketPath(String),
    #[error("websocket.address and http.address must differ: {0}")]
    ListenerCollision(std::net::SocketAddr),
    #[error("database.path parent directory does not exist: {0}")]
    DatabasePathInvalid(String),
}

/// Validate a configuration, returning all errors found.
pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.limits.send_queue == 0 {
        errors.push(ValidationError::ZeroSendQueue);
    }

    if !config.websocket.path.starts_with('/') {
        errors.push(ValidationError::InvalidWebSocketPath(
            config.websocket.path.clone(),
        ));
    }

    // Port 0 means "pick one", so two ephemeral listeners never collide.
    if let Some(ref http) = config.http
        && http.address == config.websocket.address
        && http.address.port() != 0
    {
        errors.push(ValidationError::ListenerCollision(http.address));
    }

    if let Some(ref db) = config.database
        && db.path != ":memory:"
    {
        let db_path = Path::new(&db.path);
        if let Some(parent) = db_path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            errors.push(ValidationError::DatabasePathInvalid(db.path.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
