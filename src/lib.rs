//! Asset Insights -- read-only energy analytics over building assets.
//!
//! This crate provides KPI aggregation, filtered asset listings, and
//! peer-group anomaly detection on energy usage, served over HTTP.

pub mod api;
pub mod config;
pub mod detect;
pub mod model;
pub mod storage;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use crate::config::{Config, LogFormat, LoggingConfig};

/// Install the global tracing subscriber. `RUST_LOG` overrides the configured level.
pub fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match logging.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

/// Start the HTTP service: open storage, build the router, serve until ctrl-c.
pub async fn serve(config: &Config) -> Result<()> {
    // 1. Initialize Storage
    let db_path = &config.database.path;
    tracing::info!(db_path = %db_path.display(), "Initializing database");
    let pool = storage::open_pool(db_path, config.database.max_connections)?;

    // 2. Start API Server
    let addr: std::net::SocketAddr = config
        .server
        .bind
        .parse()
        .with_context(|| format!("invalid bind address {}", config.server.bind))?;
    let state = api::state::AppState::new(pool, config.insights.default_threshold);
    let app = api::router(state, &config.server.cors_origins);

    tracing::info!(%addr, "Asset insights listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested");
}
