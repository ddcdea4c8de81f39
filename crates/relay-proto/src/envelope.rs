//! The raw `{type, data}` envelope carried by every frame.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::DecodeError;

/// Loosely-typed wire envelope.
///
/// This is the shape on the wire before any per-kind validation. Handlers
/// never see it; they work with [`ClientMessage`](crate::ClientMessage).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Message tag, e.g. `"add_friend"`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Payload fields. Absent `data` decodes as an empty object.
    #[serde(default)]
    pub data: Map<String, Value>,
}

impl Envelope {
    /// Create an envelope with an empty payload.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            data: Map::new(),
        }
    }

    /// Builder-style field insertion.
    pub fn with(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.data.insert(field.to_string(), value.into());
        self
    }

    /// Parse an envelope from the text of a frame.
    pub fn parse(text: &str) -> Result<Self, DecodeError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Parse an envelope from raw frame bytes, which must be UTF-8 JSON.
    pub fn parse_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| DecodeError::Malformed(format!("invalid UTF-8: {e}")))?;
        Self::parse(text)
    }

    /// Fetch a required string field.
    pub(crate) fn string(&self, kind: &'static str, field: &'static str) -> Result<String, DecodeError> {
        match self.data.get(field) {
            None | Some(Value::Null) => Err(DecodeError::MissingField { kind, field }),
            Some(Value::String(s)) => Ok(s.clone()),
            Some(_) => Err(DecodeError::InvalidField {
                kind,
                field,
                expected: "string",
            }),
        }
    }

    /// Fetch a required boolean field.
    pub(crate) fn boolean(&self, kind: &'static str, field: &'static str) -> Result<bool, DecodeError> {
        match self.data.get(field) {
            None | Some(Value::Null) => Err(DecodeError::MissingField { kind, field }),
            Some(Value::Bool(b)) => Ok(*b),
            Some(_) => Err(DecodeError::InvalidField {
                kind,
                field,
                expected: "boolean",
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_data_is_empty_object() {
        let env = Envelope::parse(r#"{"type":"remove_friend"}"#).unwrap();
        assert_eq!(env.kind, "remove_friend");
        assert!(env.data.is_empty());
    }

    #[test]
    fn rejects_non_object() {
        assert!(matches!(Envelope::parse("[1,2,3]"), Err(DecodeError::Malformed(_))));
        assert!(matches!(Envelope::parse("not json"), Err(DecodeError::Malformed(_))));
        assert!(matches!(Envelope::parse(r#"{"data":{}}"#), Err(DecodeError::Malformed(_))));
    }

    #[test]
    fn rejects_invalid_utf8() {
        let err = Envelope::parse_bytes(&[0xff, 0xfe, b'{']).unwrap_err();
        assert!(err.to_string().contains("invalid UTF-8"));
    }

    #[test]
    fn null_field_counts_as_missing() {
        let env = Envelope::new("message").with("username", Value::Null);
        assert!(matches!(
            env.string("message", "username"),
            Err(DecodeError::MissingField { field: "username", .. })
        ));
    }

    #[test]
    fn wrong_type_is_invalid() {
        let env = Envelope::new("friend_response").with("accepted", "yes");
        assert!(matches!(
            env.boolean("friend_response", "accepted"),
            Err(DecodeError::InvalidField { expected: "boolean", .. })
        ));
    }
}
