//! Decode errors for inbound frames.

use thiserror::Error;

/// Why an inbound frame could not be turned into a [`ClientMessage`].
///
/// [`ClientMessage`]: crate::ClientMessage
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DecodeError {
    /// The frame is not a JSON object (bad JSON, bad UTF-8, wrong shape).
    #[error("malformed envelope: {0}")]
    Malformed(String),

    /// The envelope's `type` tag is not one the relay understands.
    #[error("unknown message type: {0}")]
    UnknownType(String),

    /// A field required by this message kind is absent or null.
    #[error("{kind}: missing field `{field}`")]
    MissingField {
        /// Wire tag of the message being decoded.
        kind: &'static str,
        /// Name of the absent field.
        field: &'static str,
    },

    /// A required field is present but has the wrong JSON type.
    #[error("{kind}: field `{field}` must be a {expected}")]
    InvalidField {
        /// Wire tag of the message being decoded.
        kind: &'static str,
        /// Name of the offending field.
        field: &'static str,
        /// Expected JSON type.
        expected: &'static str,
    },
}

impl DecodeError {
    /// Static label for metrics and logs.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Malformed(_) => "malformed",
            Self::UnknownType(_) => "unknown_type",
            Self::MissingField { .. } => "missing_field",
            Self::InvalidField { .. } => "invalid_field",
        }
    }
}

impl From<serde_json::Error> for DecodeError {
    fn from(err: serde_json::Error) -> Self {
        DecodeError::Malformed(err.to_string())
    }
}
