//! Unified error handling for relayd.
//!
//! Session-scoped failures only: nothing here is fatal to the process.
//! Each enum exposes a static code for metrics labeling.

use relay_proto::DecodeError;
use thiserror::Error;

use crate::store::StoreError;

// ============================================================================
// Handler Errors (dispatch of one inbound frame)
// ============================================================================

/// Errors that can occur while handling one inbound frame.
///
/// All are recovered by the reader loop: the frame's effect is not
/// applied and the session continues.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("store: {0}")]
    Store(#[from] StoreError),
}

impl HandlerError {
    /// Get a static error code string for metrics labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Decode(e) => e.code(),
            Self::Store(e) => e.code(),
        }
    }
}

/// Result type for frame handlers.
pub type HandlerResult = Result<(), HandlerError>;

// ============================================================================
// Auth Errors (connection attempt)
// ============================================================================

/// Why a connection attempt was refused before a session existed.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("unknown user: {0}")]
    UnknownUser(String),

    #[error("bad password for {0}")]
    BadPassword(String),

    #[error("store: {0}")]
    Store(StoreError),
}

impl AuthError {
    /// Reason string carried in the close frame.
    ///
    /// Identical for every variant so a client cannot probe which
    /// usernames exist.
    pub fn close_reason(&self) -> &'static str {
        "Invalid username or password"
    }

    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownUser(_) => "unknown_user",
            Self::BadPassword(_) => "bad_password",
            Self::Store(_) => "store",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handler_error_codes() {
        let e: HandlerError = DecodeError::UnknownType("bogus".into()).into();
        assert_eq!(e.error_code(), "unknown_type");

        let e: HandlerError = StoreError::AlreadyExists("alice -> bob".into()).into();
        assert_eq!(e.error_code(), "already_exists");
    }

    #[test]
    fn test_auth_errors_share_close_reason() {
        let unknown = AuthError::UnknownUser("ghost".into());
        let bad = AuthError::BadPassword("alice".into());
        assert_eq!(unknown.close_reason(), bad.close_reason());
        assert_ne!(unknown.error_code(), bad.error_code());
    }
}
