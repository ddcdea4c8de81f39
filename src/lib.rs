//! relayd - real-time friend/chat relay.
//!
//! Clients hold a WebSocket to the relay; the relay routes friend requests
//! and chat messages between users who are online and persists credentials
//! and the friend graph in SQLite.
//!
//! The core is the session hub:
//! - [`state::SessionRegistry`] maps usernames to live sessions
//! - [`network::Connection`] runs one session: authenticate, register,
//!   read and dispatch, tear down
//! - [`handlers::Dispatcher`] turns each inbound message into a store
//!   mutation and at most one notification
//! - every session has a bounded outbound queue drained by its own pump task

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod http;
pub mod metrics;
pub mod network;
pub mod security;
pub mod server;
pub mod state;
pub mod store;
pub mod telemetry;

pub use server::Server;
