//! Hooksink server - signed webhook receiver.
//!
//! This binary provides a small web server that:
//! - Accepts webhook registrations (id + shared secret)
//! - Receives signed deliveries on a single inbound endpoint
//! - Verifies HMAC-SHA256 signatures before recording events
//! - Serves read endpoints for registered webhooks and their event history

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::{net::TcpListener, signal};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use hooksink::web::{router, AppState};
use hooksink::{Config, Registry};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize structured JSON logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true))
        .init();

    info!("receiver_starting");

    // Load configuration
    let config = Config::from_env();
    info!(port = config.port, "config_loaded");

    // Create the process-lifetime registry and application state
    let registry = Arc::new(Registry::new());
    let state = AppState::new(registry);

    // Build the router
    let app = router(state).layer(TraceLayer::new_for_http());

    // Bind to address
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!(address = %addr, "receiver_listening");

    // Run server with graceful shutdown; in-flight deliveries complete
    // before exit, and the in-memory registry needs no flush.
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("receiver_shutdown_complete");

    Ok(())
}

/// Create a future that completes when a shutdown signal is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }

    info!("receiver_shutting_down");
}
