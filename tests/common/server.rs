//! Test server management.
//!
//! Runs a relayd instance inside the test process with an in-memory
//! database and OS-assigned ports.

use relayd::Server;
use relayd::config::Config;
use relayd::state::Hub;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use super::client::TestClient;

/// A test server instance. Shuts down when dropped.
pub struct TestServer {
    ws_addr: SocketAddr,
    http_addr: SocketAddr,
    hub: Arc<Hub>,
    shutdown: CancellationToken,
}

impl TestServer {
    /// Start a server with default limits.
    pub async fn spawn() -> anyhow::Result<Self> {
        Self::spawn_with("").await
    }

    /// Start a server, appending `extra` TOML (e.g. a `[limits]` table).
    pub async fn spawn_with(extra: &str) -> anyhow::Result<Self> {
        let config_content = format!(
            r#"
[server]
name = "test.relay"

[websocket]
address = "127.0.0.1:0"

[http]
address = "127.0.0.1:0"

[database]
path = ":memory:"

{extra}
"#
        );
        let config = Config::parse(&config_content)?;
        if let Err(errors) = config.validate() {
            anyhow::bail!("invalid test config: {errors:?}");
        }

        let server = Server::bind(config).await?;
        let ws_addr = server.websocket_addr()?;
        let http_addr = server
            .http_addr()
            .ok_or_else(|| anyhow::anyhow!("HTTP listener not bound"))?;
        let hub = Arc::clone(server.hub());

        let shutdown = CancellationToken::new();
        tokio::spawn(server.run(shutdown.clone()));

        Ok(Self {
            ws_addr,
            http_addr,
            hub,
            shutdown,
        })
    }

    pub fn hub(&self) -> &Arc<Hub> {
        &self.hub
    }

    /// WebSocket URL for `path` with the given query string.
    pub fn ws_url(&self, path: &str, query: &str) -> String {
        format!("ws://{}{}?{}", self.ws_addr, path, query)
    }

    pub fn http_url(&self, path: &str) -> String {
        format!("http://{}{}", self.http_addr, path)
    }

    /// Register an account over HTTP, returning status and body.
    pub async fn register(&self, username: &str, password: &str) -> anyhow::Result<(u16, String)> {
        let response = reqwest::Client::new()
            .get(self.http_url("/register"))
            .query(&[("username", username), ("password", password)])
            .send()
            .await?;
        let status = response.status().as_u16();
        Ok((status, response.text().await?))
    }

    /// Register an account and fail unless it was created.
    pub async fn create_user(&self, username: &str, password: &str) -> anyhow::Result<()> {
        let (status, body) = self.register(username, password).await?;
        if status != 200 {
            anyhow::bail!("registration of {username} failed: {status} {body}");
        }
        Ok(())
    }

    /// Open a WebSocket as `username` without waiting for registration.
    pub async fn connect(&self, username: &str, password: &str) -> anyhow::Result<TestClient> {
        let query = format!("username={username}&password={password}");
        TestClient::connect(&self.ws_url("/ws", &query)).await
    }

    /// Connect and wait until the hub has registered the session.
    pub async fn login(&self, username: &str, password: &str) -> anyhow::Result<TestClient> {
        let client = self.connect(username, password).await?;
        self.wait_online(username).await?;
        Ok(client)
    }

    /// Wait until `username` has a live session.
    pub async fn wait_online(&self, username: &str) -> anyhow::Result<()> {
        self.wait_for(|| self.hub.registry.contains(username), username).await
    }

    /// Wait until `username` has no live session.
    pub async fn wait_offline(&self, username: &str) -> anyhow::Result<()> {
        self.wait_for(|| !self.hub.registry.contains(username), username).await
    }

    async fn wait_for(&self, cond: impl Fn() -> bool, what: &str) -> anyhow::Result<()> {
        for _ in 0..100 {
            if cond() {
                return Ok(());
            }
            sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("timed out waiting on session state for {what}")
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
