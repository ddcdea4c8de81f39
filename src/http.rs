//! HTTP surface: account registration, health checks and Prometheus metrics.
//!
//! Runs on its own listener, separate from the WebSocket gateway.
//!
//! - `GET /register?username=..&password=..` creates an account
//! - `GET /health` returns `ok`
//! - `GET /metrics` serves Prometheus text format

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::{Router, routing::get};
use serde::Deserialize;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::store::{Store, StoreError};

#[derive(Debug, Deserialize)]
pub struct RegisterParams {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

/// Handler for GET /register.
pub async fn register(
    State(store): State<Arc<dyn Store>>,
    Query(params): Query<RegisterParams>,
) -> (StatusCode, &'static str) {
    if params.username.is_empty() || params.password.is_empty() {
        return (StatusCode::BAD_REQUEST, "Username and password are required");
    }

    info!(username = %params.username, "Registering user");

    match store.get_user(&params.username).await {
        Ok(_) => return (StatusCode::CONFLICT, "Username already exists"),
        Err(StoreError::NotFound(_)) => {}
        Err(e) => {
            error!(username = %params.username, error = %e, "User lookup failed");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Failed to create user");
        }
    }

    match store.create_user(&params.username, &params.password).await {
        Ok(()) => (StatusCode::OK, "User created successfully"),
        // Lost a race with a concurrent registration.
        Err(StoreError::AlreadyExists(_)) => (StatusCode::CONFLICT, "Username already exists"),
        Err(e) => {
            error!(username = %params.username, error = %e, "Failed to create user");
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to create user")
        }
    }
}

/// Handler for GET /metrics - returns Prometheus metrics in text format.
async fn metrics_handler() -> String {
    crate::metrics::gather_metrics()
}

async fn health_handler() -> &'static str {
    "ok"
}

/// Build the HTTP router.
pub fn router(store: Arc<dyn Store>) -> Router {
    Router::new()
        .route("/register", get(register))
        .route("/metrics", get(metrics_handler))
        .route("/health", get(health_handler))
        .with_state(store)
}

/// Serve the HTTP surface on `listener` until `shutdown` is cancelled.
pub async fn serve(listener: TcpListener, store: Arc<dyn Store>, shutdown: CancellationToken) {
    match listener.local_addr() {
        Ok(addr) => info!(%addr, "HTTP server listening"),
        Err(e) => warn!(error = %e, "HTTP listener has no local address"),
    }

    let app = router(store);
    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
    {
        error!(error = %e, "HTTP server error");
    }
}
