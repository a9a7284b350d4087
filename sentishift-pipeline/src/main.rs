//! sentishift-pipeline - periodic enrichment and shift detection job
//!
//! One-shot by default (for an external scheduler); `--interval-secs N` runs
//! the pipeline every N seconds until Ctrl+C / SIGTERM.
//!
//! Exit codes (one-shot): 0 clean or skipped, 2 partial failure, 1 fatal.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use sentishift_common::config::{resolve_config_path, TomlConfig};
use sentishift_common::db::PoolSettings;
use sentishift_pipeline::scoring::HttpScorer;
use sentishift_pipeline::store::SqliteStore;
use sentishift_pipeline::workflow::{Pipeline, PipelineConfig, RunStatus};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for sentishift-pipeline
#[derive(Parser, Debug)]
#[command(name = "sentishift-pipeline")]
#[command(about = "Sentiment enrichment and regime-shift detection job")]
#[command(version)]
struct Args {
    /// TOML config file
    #[arg(short, long, env = "SENTISHIFT_CONFIG")]
    config: Option<PathBuf>,

    /// SQLite database file
    #[arg(short, long, env = "SENTISHIFT_DB_PATH")]
    db_path: Option<PathBuf>,

    /// Base URL of the scoring service
    #[arg(short, long, env = "SENTISHIFT_SCORING_URL")]
    scoring_url: Option<String>,

    /// Run every N seconds instead of once
    #[arg(short, long)]
    interval_secs: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    let mut config = TomlConfig::load_or_default(args.config.as_deref())
        .context("Failed to load configuration")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting sentishift-pipeline");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    match resolve_config_path(args.config.as_deref()) {
        Some(path) if path.exists() => info!("Config: {}", path.display()),
        _ => warn!("No config file found, using compiled defaults"),
    }

    if let Some(url) = args.scoring_url {
        config.scoring.base_url = url;
    }

    let db_path = config.resolve_database_path(args.db_path);
    info!("Database: {}", db_path.display());

    let pool = sentishift_common::db::init_database(
        &db_path,
        &PoolSettings {
            max_connections: config.database.max_connections,
            busy_timeout_ms: config.database.busy_timeout_ms,
            acquire_timeout_ms: config.database.acquire_timeout_ms,
        },
    )
    .await
    .context("Failed to open database")?;

    let store = Arc::new(SqliteStore::new(pool, config.lock.name.clone()));
    let scorer = Arc::new(
        HttpScorer::new(&config.scoring.base_url, config.scoring.timeout_ms)
            .context("Failed to create scoring client")?,
    );
    info!("Scoring service: {}", scorer.endpoint());

    let pipeline = Pipeline::new(store, scorer, PipelineConfig::from_toml(&config));

    match args.interval_secs {
        None => run_once(&pipeline).await,
        Some(secs) => {
            run_periodically(&pipeline, Duration::from_secs(secs.max(1))).await;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Single run mapped to an exit code
async fn run_once(pipeline: &Pipeline) -> Result<ExitCode> {
    let report = pipeline.run_once().await.context("Pipeline run failed")?;

    Ok(match report.status {
        RunStatus::Clean | RunStatus::Skipped => ExitCode::SUCCESS,
        RunStatus::PartialFailure => ExitCode::from(2),
    })
}

/// Run on a fixed interval until shutdown; failed runs are retried next tick
async fn run_periodically(pipeline: &Pipeline, interval: Duration) {
    info!(interval_secs = interval.as_secs(), "Periodic mode");

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            _ = ticker.tick() => {
                if let Err(e) = pipeline.run_once().await {
                    error!(error = %e, "Run failed, will retry on next tick");
                }
            }
        }
    }

    info!("Shutdown complete");
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
