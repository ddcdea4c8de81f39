//! Live session types.
//!
//! A [`Session`] is created by the connection supervisor once a client has
//! authenticated. The supervisor owns it; the registry and other sessions'
//! dispatch only ever hold a cheap [`SessionHandle`] clone.
//!
//! ```text
//!  dispatch (any task) ──try_send──▶ [bounded queue] ──recv──▶ pump ──▶ transport
//!                                         ▲
//!  supervisor / displacement ──shutdown───┘ (CancellationToken)
//! ```

use std::fmt;
use std::sync::{Arc, OnceLock};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Unique id of one session (one authenticated connection).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Generate a fresh random session id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Why a session was asked to stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    /// The peer closed, or the inbound side failed.
    ReaderEnded,
    /// A transport write failed.
    WriteFailed,
    /// A newer login for the same username took over the registry slot.
    Displaced,
    /// The server is shutting down.
    ServerShutdown,
}

/// Failure to place a frame on a recipient's queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DeliveryError {
    #[error("send queue full")]
    QueueFull,
    #[error("session closed")]
    Closed,
}

impl DeliveryError {
    /// Static label for metrics.
    pub fn code(&self) -> &'static str {
        match self {
            Self::QueueFull => "queue_full",
            Self::Closed => "closed",
        }
    }
}

#[derive(Debug)]
struct Shutdown {
    token: CancellationToken,
    reason: OnceLock<ShutdownReason>,
}

/// Cloneable reference to a live session.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    id: SessionId,
    username: Arc<str>,
    outbound: mpsc::Sender<String>,
    shutdown: Arc<Shutdown>,
}

impl SessionHandle {
    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Queue one encoded frame without waiting.
    ///
    /// Never blocks the caller: a full queue is reported, not waited on.
    pub fn enqueue(&self, frame: String) -> Result<(), DeliveryError> {
        if self.shutdown.token.is_cancelled() {
            return Err(DeliveryError::Closed);
        }
        self.outbound.try_send(frame).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => DeliveryError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => DeliveryError::Closed,
        })
    }

    /// Ask the session to stop. The first reason recorded wins.
    pub fn shutdown(&self, reason: ShutdownReason) {
        let _ = self.shutdown.reason.set(reason);
        self.shutdown.token.cancel();
    }

    /// Reason passed to the first [`shutdown`](Self::shutdown) call, if any.
    pub fn shutdown_reason(&self) -> Option<ShutdownReason> {
        self.shutdown.reason.get().copied()
    }

    pub fn is_shut_down(&self) -> bool {
        self.shutdown.token.is_cancelled()
    }

    /// Resolves once [`shutdown`](Self::shutdown) has been called.
    pub async fn cancelled(&self) {
        self.shutdown.token.cancelled().await
    }

    /// Configured capacity of the outbound queue.
    pub fn queue_capacity(&self) -> usize {
        self.outbound.max_capacity()
    }

    /// Frames currently waiting in the outbound queue.
    pub fn queued(&self) -> usize {
        self.outbound.max_capacity() - self.outbound.capacity()
    }
}

/// One authenticated user's session, owned by its connection supervisor.
pub struct Session {
    handle: SessionHandle,
    outbound: mpsc::Receiver<String>,
}

impl Session {
    /// Create a session with a bounded outbound queue.
    ///
    /// A `queue_capacity` of zero is raised to one.
    pub fn new(username: &str, queue_capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(queue_capacity.max(1));
        Self {
            handle: SessionHandle {
                id: SessionId::new(),
                username: Arc::from(username),
                outbound: tx,
                shutdown: Arc::new(Shutdown {
                    token: CancellationToken::new(),
                    reason: OnceLock::new(),
                }),
            },
            outbound: rx,
        }
    }

    pub fn handle(&self) -> &SessionHandle {
        &self.handle
    }

    /// Split into the shareable handle and the queue's receiving end.
    pub fn into_parts(self) -> (SessionHandle, mpsc::Receiver<String>) {
        (self.handle, self.outbound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_queue_drops_instead_of_blocking() {
        let session = Session::new("alice", 2);
        let handle = session.handle().clone();
        assert_eq!(handle.enqueue("1".into()), Ok(()));
        assert_eq!(handle.enqueue("2".into()), Ok(()));
        assert_eq!(handle.enqueue("3".into()), Err(DeliveryError::QueueFull));
        assert_eq!(handle.queued(), 2);
        assert_eq!(handle.queue_capacity(), 2);
    }

    #[test]
    fn zero_capacity_is_raised_to_one() {
        let (handle, _rx) = Session::new("alice", 0).into_parts();
        assert_eq!(handle.queue_capacity(), 1);
        assert_eq!(handle.enqueue("1".into()), Ok(()));
        assert_eq!(handle.enqueue("2".into()), Err(DeliveryError::QueueFull));
    }

    #[tokio::test]
    async fn queue_is_fifo() {
        let (handle, mut rx) = Session::new("alice", 8).into_parts();
        for i in 0..5 {
            handle.enqueue(format!("m{i}")).unwrap();
        }
        for i in 0..5 {
            assert_eq!(rx.recv().await.unwrap(), format!("m{i}"));
        }
    }

    #[test]
    fn dropped_receiver_reports_closed() {
        let (handle, rx) = Session::new("alice", 4).into_parts();
        drop(rx);
        assert_eq!(handle.enqueue("x".into()), Err(DeliveryError::Closed));
    }

    #[test]
    fn shutdown_rejects_further_frames() {
        let (handle, _rx) = Session::new("alice", 4).into_parts();
        handle.shutdown(ShutdownReason::ReaderEnded);
        assert!(handle.is_shut_down());
        assert_eq!(handle.enqueue("x".into()), Err(DeliveryError::Closed));
    }

    #[test]
    fn first_shutdown_reason_wins() {
        let (handle, _rx) = Session::new("alice", 4).into_parts();
        let other = handle.clone();
        other.shutdown(ShutdownReason::Displaced);
        handle.shutdown(ShutdownReason::ReaderEnded);
        assert_eq!(handle.shutdown_reason(), Some(ShutdownReason::Displaced));
    }

    #[test]
    fn session_ids_are_unique() {
        let a = Session::new("alice", 1);
        let b = Session::new("alice", 1);
        assert_ne!(a.handle().id(), b.handle().id());
    }
}
