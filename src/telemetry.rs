//! Telemetry utilities: dispatch timing and span constructors.

use std::time::Instant;

/// Guard for timing one dispatch and recording its latency.
///
/// Records when dropped, so early returns are timed too.
pub struct DispatchTimer {
    kind: &'static str,
    start: Instant,
}

impl DispatchTimer {
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            start: Instant::now(),
        }
    }
}

impl Drop for DispatchTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        crate::metrics::record_dispatch(self.kind, duration);
    }
}

/// Standardized span constructors.
pub mod spans {
    use tracing::{Span, info_span};

    /// Span covering one accepted transport, before authentication.
    pub fn connection(addr: &str) -> Span {
        info_span!("connection", addr = %addr)
    }

    /// Span covering one authenticated session.
    pub fn session(username: &str, session: &str) -> Span {
        info_span!("session", username = %username, session = %session)
    }
}
