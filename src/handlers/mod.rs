//! Inbound message handling.
//!
//! Split in two halves:
//! - [`plan`](plan::plan) is the pure decision: given the acting user and a
//!   decoded [`ClientMessage`](relay_proto::ClientMessage), which friend edge
//!   to insert or delete and which notification to send to whom.
//! - [`Dispatcher`] applies a plan against the store and the session
//!   registry, and records metrics and spans.
//!
//! | type              | mutation                          | notification               |
//! |-------------------|-----------------------------------|----------------------------|
//! | `add_friend`      | insert (acting -> target)         | `friend_request` to target |
//! | `remove_friend`   | delete (acting -> target)         | none                       |
//! | `message`         | none                              | `message` to recipient     |
//! | `friend_response` | insert or delete (acting -> req.) | none                       |

mod dispatcher;
mod plan;

pub use dispatcher::Dispatcher;
pub use plan::{Mutation, Notify, Plan, plan};
