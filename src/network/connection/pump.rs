//! Outbound pump: drains one session's queue onto its transport.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::network::transport::{CLOSE_GOING_AWAY, CLOSE_NORMAL, CLOSE_POLICY, FrameSink};
use crate::state::{Hub, SessionHandle, ShutdownReason};

/// Why the pump stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpExit {
    /// The session was shut down (or its queue closed) and the close frame went out.
    Closed,
    /// A transport write failed; the pump tore the session down itself.
    WriteFailed,
}

/// Upper bound on the closing handshake write; a stalled peer gets dropped instead.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

/// Close frame the peer sees for a given shutdown reason.
fn close_frame(reason: Option<ShutdownReason>) -> (u16, &'static str) {
    match reason {
        Some(ShutdownReason::Displaced) => (CLOSE_POLICY, "Logged in from another location"),
        Some(ShutdownReason::ServerShutdown) => (CLOSE_GOING_AWAY, "Server shutting down"),
        _ => (CLOSE_NORMAL, ""),
    }
}

/// Write queued frames in FIFO order until shutdown or a write failure.
///
/// Shutdown also interrupts a write in flight, so a peer that stops
/// reading cannot pin the session open.
pub async fn run<S: FrameSink>(
    hub: Arc<Hub>,
    handle: SessionHandle,
    mut queue: mpsc::Receiver<String>,
    mut sink: S,
) -> PumpExit {
    loop {
        let frame = tokio::select! {
            biased;
            _ = handle.cancelled() => break,
            frame = queue.recv() => frame,
        };

        let Some(text) = frame else {
            debug!(username = %handle.username(), "Outbound queue closed");
            break;
        };

        let written = tokio::select! {
            biased;
            _ = handle.cancelled() => {
                debug!(username = %handle.username(), "Shutdown interrupted a pending write");
                break;
            }
            written = sink.send_text(text) => written,
        };

        if let Err(e) = written {
            warn!(
                username = %handle.username(),
                session = %handle.id(),
                error = %e,
                "Write failed, closing session"
            );
            hub.registry.remove_session(handle.username(), handle.id());
            handle.shutdown(ShutdownReason::WriteFailed);
            let _ = tokio::time::timeout(CLOSE_TIMEOUT, sink.close(CLOSE_NORMAL, "")).await;
            return PumpExit::WriteFailed;
        }
        crate::metrics::record_sent();
    }

    let (code, reason) = close_frame(handle.shutdown_reason());
    match tokio::time::timeout(CLOSE_TIMEOUT, sink.close(code, reason)).await {
        Ok(Ok(())) => {}
        // Usually the peer already closed.
        Ok(Err(e)) => debug!(username = %handle.username(), error = %e, "Close frame not sent"),
        Err(_) => warn!(username = %handle.username(), "Close frame timed out"),
    }
    PumpExit::Closed
}
