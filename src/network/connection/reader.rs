//! Inbound reader: frames in, dispatch out, until the peer goes away.

use tracing::debug;

use crate::handlers::Dispatcher;
use crate::network::transport::FrameSource;
use crate::state::SessionHandle;

/// Why the reader loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadExit {
    /// Clean close from the peer.
    PeerClosed,
    /// The transport failed while reading.
    ReadError,
    /// The session was shut down from elsewhere (displacement, pump failure, server stop).
    Cancelled,
}

/// Read and dispatch frames for `handle` until the session ends.
///
/// Undecodable frames and dispatch failures are logged and skipped.
pub async fn run<S: FrameSource>(
    dispatcher: &Dispatcher,
    handle: &SessionHandle,
    source: &mut S,
) -> ReadExit {
    loop {
        let next = tokio::select! {
            _ = handle.cancelled() => return ReadExit::Cancelled,
            next = source.next_frame() => next,
        };

        match next {
            None => return ReadExit::PeerClosed,
            Some(Err(e)) => {
                debug!(username = %handle.username(), error = %e, "Read failed");
                return ReadExit::ReadError;
            }
            Some(Ok(frame)) => {
                if let Err(e) = dispatcher.handle_frame(handle.username(), &frame).await {
                    debug!(
                        username = %handle.username(),
                        error = %e,
                        code = e.error_code(),
                        "Frame discarded"
                    );
                }
            }
        }
    }
}
