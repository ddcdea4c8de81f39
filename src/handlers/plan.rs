//! Pure decision step: what to persist and whom to notify.
//!
//! [`plan`] has no access to the store, the registry or any transport.
//! Given the acting user and a decoded message it returns the effects;
//! the [`Dispatcher`](super::Dispatcher) applies them in order.

use relay_proto::{ClientMessage, ServerMessage};

/// One friend-graph change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    /// Insert the directed edge (`owner` -> `friend`).
    AddEdge { owner: String, friend: String },
    /// Delete the directed edge (`owner` -> `friend`).
    RemoveEdge { owner: String, friend: String },
}

/// A notification to queue for one recipient, if they are online.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notify {
    pub recipient: String,
    pub message: ServerMessage,
}

/// Effects of one inbound message.
///
/// The mutation, if any, is applied first; the notification is sent only
/// once the mutation has succeeded.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Plan {
    pub mutation: Option<Mutation>,
    pub notify: Option<Notify>,
}

/// Decide the effects of `message` sent by `acting`.
pub fn plan(acting: &str, message: ClientMessage) -> Plan {
    match message {
        ClientMessage::AddFriend { username } => Plan {
            mutation: Some(Mutation::AddEdge {
                owner: acting.to_string(),
                friend: username.clone(),
            }),
            notify: Some(Notify {
                recipient: username,
                message: ServerMessage::FriendRequest {
                    username: acting.to_string(),
                },
            }),
        },
        ClientMessage::RemoveFriend { username } => Plan {
            mutation: Some(Mutation::RemoveEdge {
                owner: acting.to_string(),
                friend: username,
            }),
            notify: None,
        },
        ClientMessage::Message { username, content } => Plan {
            mutation: None,
            notify: Some(Notify {
                recipient: username,
                message: ServerMessage::Message {
                    username: acting.to_string(),
                    content,
                },
            }),
        },
        ClientMessage::FriendResponse { username, accepted } => {
            let owner = acting.to_string();
            let mutation = if accepted {
                Mutation::AddEdge { owner, friend: username }
            } else {
                Mutation::RemoveEdge { owner, friend: username }
            };
            Plan {
                mutation: Some(mutation),
                notify: None,
            }
        }
    }
}
