//! Typed inbound and outbound messages.

use serde::Serialize;

use crate::envelope::Envelope;
use crate::error::DecodeError;
use crate::kind;

/// A frame sent by a connected client, validated per kind.
///
/// Serializes back to the envelope form, which test clients use to build
/// frames.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Insert the friend edge (acting -> `username`) and notify the target.
    AddFriend {
        /// Target user.
        username: String,
    },
    /// Delete the friend edge (acting -> `username`).
    RemoveFriend {
        /// Target user.
        username: String,
    },
    /// Relay `content` to `username` if they are online.
    Message {
        /// Recipient.
        username: String,
        /// Message text, relayed verbatim.
        content: String,
    },
    /// Answer a friend request from `username`.
    FriendResponse {
        /// The requester.
        username: String,
        /// Whether the request was accepted.
        accepted: bool,
    },
}

impl ClientMessage {
    /// Decode a text frame.
    pub fn decode(text: &str) -> Result<Self, DecodeError> {
        Envelope::parse(text)?.try_into()
    }

    /// Decode a binary frame holding UTF-8 JSON.
    pub fn decode_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        Envelope::parse_bytes(bytes)?.try_into()
    }

    /// The wire tag for this message.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AddFriend { .. } => kind::ADD_FRIEND,
            Self::RemoveFriend { .. } => kind::REMOVE_FRIEND,
            Self::Message { .. } => kind::MESSAGE,
            Self::FriendResponse { .. } => kind::FRIEND_RESPONSE,
        }
    }

    /// The other party named by this message.
    pub fn target(&self) -> &str {
        match self {
            Self::AddFriend { username }
            | Self::RemoveFriend { username }
            | Self::Message { username, .. }
            | Self::FriendResponse { username, .. } => username,
        }
    }

    /// Encode to the JSON text of one frame.
    pub fn encode(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

impl TryFrom<Envelope> for ClientMessage {
    type Error = DecodeError;

    fn try_from(env: Envelope) -> Result<Self, Self::Error> {
        match env.kind.as_str() {
            kind::ADD_FRIEND => Ok(Self::AddFriend {
                username: env.string(kind::ADD_FRIEND, "username")?,
            }),
            kind::REMOVE_FRIEND => Ok(Self::RemoveFriend {
                username: env.string(kind::REMOVE_FRIEND, "username")?,
            }),
            kind::MESSAGE => Ok(Self::Message {
                username: env.string(kind::MESSAGE, "username")?,
                content: env.string(kind::MESSAGE, "content")?,
            }),
            kind::FRIEND_RESPONSE => Ok(Self::FriendResponse {
                username: env.string(kind::FRIEND_RESPONSE, "username")?,
                accepted: env.boolean(kind::FRIEND_RESPONSE, "accepted")?,
            }),
            _ => Err(DecodeError::UnknownType(env.kind)),
        }
    }
}

/// A notification the server pushes to a connected user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ServerMessage {
    /// `username` sent the recipient a friend request.
    FriendRequest {
        /// The requester.
        username: String,
    },
    /// Chat text from `username`.
    Message {
        /// The sender.
        username: String,
        /// Message text.
        content: String,
    },
}

impl ServerMessage {
    /// The wire tag for this message.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::FriendRequest { .. } => kind::FRIEND_REQUEST,
            Self::Message { .. } => kind::MESSAGE,
        }
    }

    /// Encode to the JSON text of one frame.
    ///
    /// Field order is fixed: `type` then `data`, and within `data`
    /// `username` precedes `content`.
    pub fn encode(&self) -> String {
        // Only string fields: serialization cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }
}
