//! Network module.
//!
//! Contains the Gateway (WebSocket listener), the per-client Connection
//! supervisor and the frame transport abstraction it runs over.

mod connection;
mod gateway;
pub mod transport;

pub use connection::{Connection, Credentials, PumpExit, ReadExit, SessionEnd};
pub use gateway::{Gateway, credentials_from_query};
pub use transport::{Frame, FrameSink, FrameSource, TransportError};
