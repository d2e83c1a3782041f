//! HTTP handlers and server helpers shared by the relay and resolver.

use std::net::SocketAddr;

use axum::Router;
use tokio::sync::watch;
use tower_http::trace::{DefaultOnFailure, DefaultOnResponse, TraceLayer};
use tower_http::LatencyUnit;

mod handlers;
pub mod health;

pub use handlers::not_found_handler;

pub const STATUS_PREFIX: &str = "/_status";

/// Serve `router` on `listen_addr` until the shutdown watch fires
pub async fn serve(
    listen_addr: SocketAddr,
    router: Router,
    log_level: tracing::Level,
    mut shutdown_rx: watch::Receiver<()>,
) -> Result<(), HttpServerError> {
    let trace_layer = TraceLayer::new_for_http()
        .on_response(
            DefaultOnResponse::new()
                .include_headers(false)
                .level(log_level)
                .latency_unit(LatencyUnit::Micros),
        )
        .on_failure(DefaultOnFailure::new().latency_unit(LatencyUnit::Micros));

    let router = router
        .fallback(handlers::not_found_handler)
        .layer(trace_layer);

    let listener = tokio::net::TcpListener::bind(listen_addr).await?;
    tracing::info!(addr = ?listener.local_addr()?, "HTTP server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.changed().await;
        })
        .await?;

    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum HttpServerError {
    #[error("an error occurred running the HTTP server: {0}")]
    ServingFailed(#[from] std::io::Error),
    #[error("the HTTP server task failed: {0}")]
    TaskFailed(#[from] tokio::task::JoinError),
}
