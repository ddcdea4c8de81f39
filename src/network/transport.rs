//! Frame-level transport abstraction.
//!
//! The session core never touches a socket directly. It reads through a
//! [`FrameSource`] and writes through a [`FrameSink`]; the WebSocket
//! split halves implement both, and so does the in-memory [`memory`]
//! transport used by tests.

use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use std::borrow::Cow;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;

/// Close code for a normal shutdown.
pub const CLOSE_NORMAL: u16 = 1000;
/// Close code sent when the server is going away.
pub const CLOSE_GOING_AWAY: u16 = 1001;
/// Close code for policy violations (failed login, displaced session).
pub const CLOSE_POLICY: u16 = 1008;

/// One inbound data frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    Binary(Vec<u8>),
}

/// Transport failures. Always scoped to one connection.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("websocket: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("transport closed")]
    Closed,
}

/// Read half: yields data frames until the peer goes away.
#[async_trait]
pub trait FrameSource: Send {
    /// Next data frame. `None` on clean close.
    ///
    /// Must be cancel-safe: the reader races it against session shutdown.
    async fn next_frame(&mut self) -> Option<Result<Frame, TransportError>>;
}

/// Write half.
#[async_trait]
pub trait FrameSink: Send {
    /// Write one text frame.
    async fn send_text(&mut self, text: String) -> Result<(), TransportError>;

    /// Send a close frame with `code` and `reason`, then stop writing.
    async fn close(&mut self, code: u16, reason: &str) -> Result<(), TransportError>;
}

// ============================================================================
// WebSocket
// ============================================================================

/// Read half of a split [`WebSocketStream`].
pub struct WsSource<S> {
    inner: SplitStream<WebSocketStream<S>>,
}

/// Write half of a split [`WebSocketStream`].
pub struct WsSink<S> {
    inner: SplitSink<WebSocketStream<S>, WsMessage>,
}

/// Split an upgraded stream into its sink and source halves.
pub fn split_websocket<S>(stream: WebSocketStream<S>) -> (WsSink<S>, WsSource<S>)
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (sink, source) = stream.split();
    (WsSink { inner: sink }, WsSource { inner: source })
}

#[async_trait]
impl<S> FrameSource for WsSource<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn next_frame(&mut self) -> Option<Result<Frame, TransportError>> {
        loop {
            match self.inner.next().await {
                Some(Ok(WsMessage::Text(text))) => return Some(Ok(Frame::Text(text))),
                Some(Ok(WsMessage::Binary(bytes))) => return Some(Ok(Frame::Binary(bytes))),
                Some(Ok(WsMessage::Close(_))) | None => return None,
                // Pings are answered by tungstenite itself.
                Some(Ok(WsMessage::Ping(_) | WsMessage::Pong(_) | WsMessage::Frame(_))) => continue,
                Some(Err(e)) => return Some(Err(e.into())),
            }
        }
    }
}

#[async_trait]
impl<S> FrameSink for WsSink<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn send_text(&mut self, text: String) -> Result<(), TransportError> {
        self.inner.send(WsMessage::Text(text)).await?;
        Ok(())
    }

    async fn close(&mut self, code: u16, reason: &str) -> Result<(), TransportError> {
        let frame = CloseFrame {
            code: CloseCode::from(code),
            reason: Cow::Owned(reason.to_string()),
        };
        self.inner.send(WsMessage::Close(Some(frame))).await?;
        Ok(())
    }
}

// ============================================================================
// In-memory
// ============================================================================

/// Channel-backed transport for exercising the session core without
/// sockets.
pub mod memory {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tokio::sync::mpsc;

    /// What the server wrote, as seen by the peer.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Written {
        Text(String),
        Close { code: u16, reason: String },
    }

    pub struct MemorySource {
        rx: mpsc::UnboundedReceiver<Frame>,
    }

    pub struct MemorySink {
        tx: mpsc::UnboundedSender<Written>,
        broken: Arc<AtomicBool>,
        stalled: Arc<AtomicBool>,
    }

    /// The client's end of an in-memory connection.
    pub struct MemoryPeer {
        tx: Option<mpsc::UnboundedSender<Frame>>,
        rx: mpsc::UnboundedReceiver<Written>,
        broken: Arc<AtomicBool>,
        stalled: Arc<AtomicBool>,
    }

    /// Create a connected (server source, server sink, peer) triple.
    pub fn pair() -> (MemorySource, MemorySink, MemoryPeer) {
        let (in_tx, in_rx) = mpsc::unbounded_channel();
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let broken = Arc::new(AtomicBool::new(false));
        let stalled = Arc::new(AtomicBool::new(false));
        (
            MemorySource { rx: in_rx },
            MemorySink {
                tx: out_tx,
                broken: Arc::clone(&broken),
                stalled: Arc::clone(&stalled),
            },
            MemoryPeer {
                tx: Some(in_tx),
                rx: out_rx,
                broken,
                stalled,
            },
        )
    }

    impl MemoryPeer {
        /// Send a text frame to the server.
        pub fn send_text(&self, text: impl Into<String>) {
            if let Some(tx) = &self.tx {
                let _ = tx.send(Frame::Text(text.into()));
            }
        }

        /// Send a binary frame to the server.
        pub fn send_binary(&self, bytes: impl Into<Vec<u8>>) {
            if let Some(tx) = &self.tx {
                let _ = tx.send(Frame::Binary(bytes.into()));
            }
        }

        /// Close the inbound direction, as a peer hanging up would.
        pub fn hang_up(&mut self) {
            self.tx = None;
        }

        /// Make every further server write fail.
        pub fn break_writes(&self) {
            self.broken.store(true, Ordering::SeqCst);
        }

        /// Stop draining: further text writes never complete, like a peer
        /// whose TCP window is full. Close frames still go through.
        pub fn stall_writes(&self) {
            self.stalled.store(true, Ordering::SeqCst);
        }

        /// Next thing the server wrote, or `None` once the sink is dropped.
        pub async fn recv(&mut self) -> Option<Written> {
            self.rx.recv().await
        }

        /// A write that is already buffered, without waiting.
        pub fn try_recv(&mut self) -> Option<Written> {
            self.rx.try_recv().ok()
        }
    }

    #[async_trait]
    impl FrameSource for MemorySource {
        async fn next_frame(&mut self) -> Option<Result<Frame, TransportError>> {
            self.rx.recv().await.map(Ok)
        }
    }

    #[async_trait]
    impl FrameSink for MemorySink {
        async fn send_text(&mut self, text: String) -> Result<(), TransportError> {
            if self.broken.load(Ordering::SeqCst) {
                return Err(TransportError::Closed);
            }
            if self.stalled.load(Ordering::SeqCst) {
                return std::future::pending::<Result<(), TransportError>>().await;
            }
            self.tx
                .send(Written::Text(text))
                .map_err(|_| TransportError::Closed)
        }

        async fn close(&mut self, code: u16, reason: &str) -> Result<(), TransportError> {
            if self.broken.load(Ordering::SeqCst) {
                return Err(TransportError::Closed);
            }
            self.tx
                .send(Written::Close {
                    code,
                    reason: reason.to_string(),
                })
                .map_err(|_| TransportError::Closed)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::memory::{Written, pair};
    use super::*;

    #[tokio::test]
    async fn memory_transport_round_trip() {
        let (mut source, mut sink, mut peer) = pair();

        peer.send_text("hello");
        assert_eq!(source.next_frame().await.unwrap().unwrap(), Frame::Text("hello".into()));

        sink.send_text("world".into()).await.unwrap();
        assert_eq!(peer.recv().await, Some(Written::Text("world".into())));

        peer.hang_up();
        assert!(source.next_frame().await.is_none());
    }

    #[tokio::test]
    async fn broken_sink_fails_writes() {
        let (_source, mut sink, peer) = pair();
        peer.break_writes();
        assert!(matches!(sink.send_text("x".into()).await, Err(TransportError::Closed)));
        assert!(sink.close(CLOSE_NORMAL, "").await.is_err());
    }
}
