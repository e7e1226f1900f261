//! `lingogate serve`: runs the HTTP gateway until Ctrl+C.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::info;

use lingogate_core::config::{try_load_config, FileConfigStore};
use lingogate_gateway::{router, Gateway};

use crate::helpers;

/// Bind the listener and serve until interrupted.
pub async fn run(config_path: PathBuf, host: Option<String>, port: Option<u16>) -> Result<()> {
    // Also creates the file with defaults on first run.
    let config = try_load_config(&config_path)
        .with_context(|| format!("failed to load config {}", config_path.display()))?;
    let host = host.unwrap_or(config.server.host);
    let port = port.unwrap_or(config.server.port);

    let store = Arc::new(FileConfigStore::new(config_path.clone()));
    let gateway = Arc::new(Gateway::new(store));
    let app = router(gateway);

    let addr = format!("{host}:{port}");
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;

    helpers::print_banner();
    println!("  Config:    {}", config_path.display());
    println!("  Listening: http://{addr}");
    println!();
    info!(%addr, "gateway listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    println!("  Gateway stopped. Goodbye!");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for Ctrl+C");
        return;
    }
    println!();
    println!("  Shutting down...");
    info!("received Ctrl+C, shutting down");
}
