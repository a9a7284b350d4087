//! sentishift-api - read-only series and shift query service
//!
//! Endpoints:
//! - `GET /health`
//! - `GET /series/:platform`
//! - `GET /shifts/:platform`

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use sentishift_api::{build_router, AppState};
use sentishift_common::config::TomlConfig;
use tokio::signal;
use tracing::{error, info};

/// Command-line arguments for sentishift-api
#[derive(Parser, Debug)]
#[command(name = "sentishift-api")]
#[command(about = "Read-only sentiment series and shift query service")]
#[command(version)]
struct Args {
    /// TOML config file
    #[arg(short, long, env = "SENTISHIFT_CONFIG")]
    config: Option<PathBuf>,

    /// SQLite database file
    #[arg(short, long, env = "SENTISHIFT_DB_PATH")]
    db_path: Option<PathBuf>,

    /// Listen address, e.g. 127.0.0.1:8000
    #[arg(short, long, env = "SENTISHIFT_API_BIND")]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = TomlConfig::load_or_default(args.config.as_deref())
        .context("Failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.clone().into()),
        )
        .init();

    info!("Starting sentishift-api v{}", env!("CARGO_PKG_VERSION"));

    let db_path = config.resolve_database_path(args.db_path);
    info!("Database path: {}", db_path.display());

    let pool = match sentishift_api::db::connect_readonly(&db_path, config.database.busy_timeout_ms).await {
        Ok(pool) => {
            info!("Connected to database (read-only)");
            pool
        }
        Err(e) => {
            error!("Failed to connect to database: {}", e);
            return Err(e);
        }
    };

    let app = build_router(AppState::new(pool));

    let bind = args.bind.unwrap_or(config.api.bind);
    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("Failed to bind to {}", bind))?;
    info!("sentishift-api listening on http://{}", bind);
    info!("Health check: http://{}/health", bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown on Ctrl+C
async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl+C, shutting down"),
        Err(e) => {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    }
}
