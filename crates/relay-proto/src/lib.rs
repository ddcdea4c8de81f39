//! # relay-proto
//!
//! Wire format for the relayd real-time relay.
//!
//! Every frame on the transport carries one JSON envelope:
//!
//! ```text
//! {"type": "<tag>", "data": {<field>: <value>, ...}}
//! ```
//!
//! Inbound envelopes are decoded into the closed [`ClientMessage`] union,
//! so unknown tags and missing fields are rejected here rather than at the
//! point a handler reads a field. Outbound notifications are built as
//! [`ServerMessage`] values and encoded with a stable field order.
//!
//! ```rust
//! use relay_proto::{ClientMessage, ServerMessage};
//!
//! let msg = ClientMessage::decode(r#"{"type":"add_friend","data":{"username":"bob"}}"#).unwrap();
//! assert_eq!(msg, ClientMessage::AddFriend { username: "bob".into() });
//!
//! let out = ServerMessage::FriendRequest { username: "alice".into() };
//! assert_eq!(out.encode(), r#"{"type":"friend_request","data":{"username":"alice"}}"#);
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod envelope;
pub mod error;
pub mod message;

pub use envelope::Envelope;
pub use error::DecodeError;
pub use message::{ClientMessage, ServerMessage};

/// Wire tags understood by the relay.
pub mod kind {
    /// Client asks to befriend another user.
    pub const ADD_FRIEND: &str = "add_friend";
    /// Client drops a friend edge.
    pub const REMOVE_FRIEND: &str = "remove_friend";
    /// Direct chat message, in both directions.
    pub const MESSAGE: &str = "message";
    /// Client answers a friend request.
    pub const FRIEND_RESPONSE: &str = "friend_response";
    /// Server notifies a user of an incoming friend request.
    pub const FRIEND_REQUEST: &str = "friend_request";
}
