//! Route planning server: hazard feed, one-shot planning and debounced sessions.

use anyhow::{Context, Result};
use detour_core::HazardZone;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use detour_server::config::Config;
use detour_server::loops;
use detour_server::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env();

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive("detour_server=debug".parse()?);
    if config.log_json {
        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer().json())
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer())
            .with(filter)
            .init();
    }

    tracing::info!("Starting route planning server...");

    config
        .rules
        .validate()
        .context("invalid planner rules in environment")?;
    let port = config.server_port;
    let feed_path = config.hazard_feed_path.clone();
    let state = Arc::new(AppState::new(config).context("failed to build route provider")?);

    if let Some(path) = feed_path {
        let raw = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("failed to read hazard feed {}", path))?;
        let hazards: Vec<HazardZone> = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse hazard feed {}", path))?;
        state
            .replace_hazards(hazards)
            .with_context(|| format!("invalid hazard feed {}", path))?;
        tracing::info!("Loaded hazard feed from {}", path);
    }

    let (shutdown_tx, _) = broadcast::channel::<()>(1);
    tokio::spawn(loops::session_expiry_loop::run_session_expiry_loop(
        state.clone(),
        shutdown_tx.subscribe(),
    ));

    let app = detour_server::app(state);

    // Run server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    let _ = shutdown_tx.send(());

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
