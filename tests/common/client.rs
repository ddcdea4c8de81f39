//! Test WebSocket client.
//!
//! Sends relay envelopes and asserts on what the server pushes back.

use futures_util::{SinkExt, StreamExt};
use relay_proto::ClientMessage;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

/// What the server sent next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Received {
    Text(String),
    Close { code: u16, reason: String },
    /// The stream ended without a close frame.
    Ended,
}

/// A test relay client.
pub struct TestClient {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl TestClient {
    /// Connect to `url` and complete the WebSocket handshake.
    pub async fn connect(url: &str) -> anyhow::Result<Self> {
        let (ws, _response) = connect_async(url).await?;
        Ok(Self { ws })
    }

    /// Send a typed message.
    pub async fn send(&mut self, msg: &ClientMessage) -> anyhow::Result<()> {
        self.send_raw(&msg.encode()).await
    }

    /// Send a raw text frame.
    pub async fn send_raw(&mut self, text: &str) -> anyhow::Result<()> {
        self.ws.send(Message::Text(text.to_string())).await?;
        Ok(())
    }

    /// Send a raw binary frame.
    pub async fn send_binary(&mut self, bytes: &[u8]) -> anyhow::Result<()> {
        self.ws.send(Message::Binary(bytes.to_vec())).await?;
        Ok(())
    }

    /// Send a chat message.
    pub async fn message(&mut self, to: &str, content: &str) -> anyhow::Result<()> {
        self.send(&ClientMessage::Message {
            username: to.to_string(),
            content: content.to_string(),
        })
        .await
    }

    /// Next server frame, skipping control frames.
    pub async fn recv(&mut self) -> anyhow::Result<Received> {
        self.recv_timeout(Duration::from_secs(5)).await
    }

    pub async fn recv_timeout(&mut self, dur: Duration) -> anyhow::Result<Received> {
        loop {
            let next = timeout(dur, self.ws.next()).await?;
            return Ok(match next {
                Some(Ok(Message::Text(text))) => Received::Text(text),
                Some(Ok(Message::Close(frame))) => match frame {
                    Some(frame) => Received::Close {
                        code: u16::from(frame.code),
                        reason: frame.reason.into_owned(),
                    },
                    None => Received::Close {
                        code: 1005,
                        reason: String::new(),
                    },
                },
                Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_))) => continue,
                Some(Ok(Message::Binary(bytes))) => {
                    Received::Text(String::from_utf8_lossy(&bytes).into_owned())
                }
                Some(Err(_)) | None => Received::Ended,
            });
        }
    }

    /// Next text frame; fails on anything else.
    pub async fn recv_text(&mut self) -> anyhow::Result<String> {
        match self.recv().await? {
            Received::Text(text) => Ok(text),
            other => anyhow::bail!("expected a text frame, got {other:?}"),
        }
    }

    /// Assert nothing arrives within `dur`.
    pub async fn expect_silence(&mut self, dur: Duration) -> anyhow::Result<()> {
        match self.recv_timeout(dur).await {
            Err(_) => Ok(()),
            Ok(received) => anyhow::bail!("expected silence, got {received:?}"),
        }
    }

    /// Start a clean close.
    pub async fn close(&mut self) -> anyhow::Result<()> {
        self.ws.close(None).await?;
        Ok(())
    }
}
