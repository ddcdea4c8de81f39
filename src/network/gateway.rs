//! Gateway - WebSocket listener that accepts incoming connections.
//!
//! The Gateway binds the client listener, performs the WebSocket upgrade
//! and spawns a [`Connection`] task per client. The upgrade callback checks
//! the request path and origin and captures the query-string credentials.

use crate::config::WebSocketConfig;
use crate::network::connection::{Connection, Credentials};
use crate::network::transport::split_websocket;
use crate::state::{Hub, ShutdownReason};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::accept_hdr_async;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, error, info, instrument, warn};

/// The Gateway accepts incoming WebSocket connections and spawns handlers.
pub struct Gateway {
    listener: TcpListener,
    config: Arc<WebSocketConfig>,
    hub: Arc<Hub>,
}

impl Gateway {
    /// Bind the gateway to the configured address.
    pub async fn bind(config: WebSocketConfig, hub: Arc<Hub>) -> anyhow::Result<Self> {
        let listener = TcpListener::bind(config.address).await?;
        info!(address = %listener.local_addr()?, path = %config.path, "WebSocket listener bound");
        Ok(Self {
            listener,
            config: Arc::new(config),
            hub,
        })
    }

    /// Address actually bound (useful when the configured port is 0).
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept connections until `shutdown` is cancelled.
    ///
    /// On shutdown every live session is asked to close.
    #[instrument(skip_all, name = "gateway")]
    pub async fn run(self, shutdown: CancellationToken) -> anyhow::Result<()> {
        loop {
            let accepted = tokio::select! {
                _ = shutdown.cancelled() => break,
                accepted = self.listener.accept() => accepted,
            };

            match accepted {
                Ok((stream, addr)) => {
                    let hub = Arc::clone(&self.hub);
                    let config = Arc::clone(&self.config);
                    let span = crate::telemetry::spans::connection(&addr.to_string());
                    tokio::spawn(
                        async move {
                            info!("WebSocket connection attempt");
                            handle_stream(stream, hub, config).await;
                        }
                        .instrument(span),
                    );
                }
                Err(e) => {
                    error!(error = %e, "Failed to accept WebSocket connection");
                }
            }
        }

        info!(sessions = self.hub.registry.len(), "Gateway stopping");
        self.hub.registry.shutdown_all(ShutdownReason::ServerShutdown);
        Ok(())
    }
}

/// Upgrade one TCP stream and run its session.
async fn handle_stream(stream: TcpStream, hub: Arc<Hub>, config: Arc<WebSocketConfig>) {
    let mut credentials = Credentials::default();
    let callback = |req: &Request, response: Response| {
        let checked = check_handshake(&config, req)?;
        credentials = checked;
        Ok(response)
    };

    let ws_stream = match accept_hdr_async(stream, callback).await {
        Ok(ws) => ws,
        Err(e) => {
            warn!(error = %e, "WebSocket handshake failed");
            return;
        }
    };

    info!(username = %credentials.username, "WebSocket handshake successful");
    let (sink, source) = split_websocket(ws_stream);
    match Connection::new(hub, credentials).run(source, sink).await {
        Ok(_) => info!("WebSocket connection closed"),
        Err(_) => info!("WebSocket connection refused"),
    }
}

/// Validate the upgrade request and extract credentials.
fn check_handshake(config: &WebSocketConfig, req: &Request) -> Result<Credentials, ErrorResponse> {
    if req.uri().path() != config.path {
        return Err(reject(http::StatusCode::NOT_FOUND, "Not found"));
    }

    let origin = req.headers().get("Origin").and_then(|o| o.to_str().ok());
    if !config.origin_allowed(origin) {
        warn!(origin = ?origin, "WebSocket CORS rejected");
        return Err(reject(http::StatusCode::FORBIDDEN, "CORS origin not allowed"));
    }

    Ok(credentials_from_query(req.uri().query()))
}

/// Percent-decoded `username` / `password`; missing values are empty.
pub fn credentials_from_query(query: Option<&str>) -> Credentials {
    let mut credentials = Credentials::default();
    for (key, value) in url::form_urlencoded::parse(query.unwrap_or("").as_bytes()) {
        match key.as_ref() {
            "username" => credentials.username = value.into_owned(),
            "password" => credentials.password = value.into_owned(),
            _ => {}
        }
    }
    credentials
}

fn reject(status: http::StatusCode, body: &str) -> ErrorResponse {
    let mut response = ErrorResponse::new(Some(body.to_string()));
    *response.status_mut() = status;
    response
}
