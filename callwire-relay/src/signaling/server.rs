use crate::signaling::{RelayService, ws_handler};
use anyhow::{Context, Result};
use axum::Router;
use axum::routing::get;
use std::future::Future;
use std::net::SocketAddr;
use tracing::info;

#[derive(Clone, Debug)]
pub struct RelayConfig {
    pub bind: SocketAddr,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 8787)),
        }
    }
}

pub fn router(service: RelayService) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/ws/{participant}", get(ws_handler))
        .with_state(service)
}

/// Runs the relay until `shutdown` resolves.
pub async fn serve<F>(config: RelayConfig, service: RelayService, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind relay to {}", config.bind))?;

    info!("Signal relay listening on {}", listener.local_addr()?);

    axum::serve(listener, router(service))
        .with_graceful_shutdown(shutdown)
        .await
        .context("Relay server stopped unexpectedly")?;

    info!("Signal relay shut down");
    Ok(())
}
