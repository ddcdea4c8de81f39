//! Configuration loading and management.
//!
//! This module is split into logical submodules:
//! - [`types`]: Core config struct definitions (Config, ServerConfig, DatabaseConfig)
//! - [`listen`]: Listener configuration (WebSocketConfig, HttpConfig)
//! - [`limits`]: Per-session resource limits (LimitsConfig)
//! - [`validation`]: Startup sanity checks

mod limits;
mod listen;
mod types;
mod validation;

pub use limits::LimitsConfig;
pub use listen::{HttpConfig, WebSocketConfig};
pub use types::{Config, ConfigError, DatabaseConfig, LogFormat, ServerConfig};
pub use validation::{ValidationError, validate};
