//! Process wiring: store, hub, gateway and HTTP surface.

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::Config;
use crate::db::Database;
use crate::network::Gateway;
use crate::state::Hub;
use crate::store::Store;

/// A bound but not yet running relay.
pub struct Server {
    hub: Arc<Hub>,
    gateway: Gateway,
    http: Option<TcpListener>,
}

impl Server {
    /// Open the database and bind every configured listener.
    pub async fn bind(config: Config) -> anyhow::Result<Self> {
        let db = Database::new(config.database_path()).await?;
        let store: Arc<dyn Store> = Arc::new(db);
        Self::bind_with_store(config, store).await
    }

    /// Bind listeners around an existing store.
    pub async fn bind_with_store(config: Config, store: Arc<dyn Store>) -> anyhow::Result<Self> {
        let hub = Arc::new(Hub::new(store, config.limits.clone()));
        info!(send_queue = config.limits.send_queue, "Hub ready");

        let http = match &config.http {
            Some(http) => Some(TcpListener::bind(http.address).await?),
            None => {
                info!("HTTP surface disabled");
                None
            }
        };

        let gateway = Gateway::bind(config.websocket, Arc::clone(&hub)).await?;

        Ok(Self { hub, gateway, http })
    }

    pub fn hub(&self) -> &Arc<Hub> {
        &self.hub
    }

    /// Bound WebSocket address.
    pub fn websocket_addr(&self) -> std::io::Result<SocketAddr> {
        self.gateway.local_addr()
    }

    /// Bound HTTP address, if the HTTP surface is enabled.
    pub fn http_addr(&self) -> Option<SocketAddr> {
        self.http.as_ref().and_then(|l| l.local_addr().ok())
    }

    /// Serve until `shutdown` is cancelled.
    pub async fn run(self, shutdown: CancellationToken) -> anyhow::Result<()> {
        if let Some(listener) = self.http {
            let store = Arc::clone(&self.hub.store);
            tokio::spawn(crate::http::serve(listener, store, shutdown.clone()));
        }

        self.gateway.run(shutdown).await
    }
}
