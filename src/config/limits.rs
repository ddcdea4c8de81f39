//! Per-session resource limits.

use serde::Deserialize;

/// Session limits configuration.
///
/// Bounds how much undelivered output a slow or stalled client can pin in
/// server memory.
#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    /// Outbound queue capacity per session, in messages (default: 256).
    /// When a recipient's queue is full, further messages to it are dropped.
    #[serde(default = "default_send_queue")]
    pub send_queue: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            send_queue: default_send_queue(),
        }
    }
}

fn default_send_queue() -> usize {
    256
}
