//! Integration test common infrastructure.
//!
//! Provides an in-process relay on ephemeral ports and a WebSocket test
//! client that speaks the relay's JSON envelopes.

#![allow(dead_code)]

pub mod client;
pub mod server;

#[allow(unused_imports)]
pub use client::TestClient;
#[allow(unused_imports)]
pub use server::TestServer;
