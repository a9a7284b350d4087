//! Database initialization
//!
//! Creates the SQLite database on first run and brings the schema up to date.
//! Every statement is idempotent, so calling this on every start is safe.

use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous};
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Connection settings for the shared database
#[derive(Debug, Clone)]
pub struct PoolSettings {
    /// Maximum pool connections
    pub max_connections: u32,
    /// SQLite busy_timeout per connection
    pub busy_timeout_ms: u64,
    /// Time to wait for a free pool connection
    pub acquire_timeout_ms: u64,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 5,
            busy_timeout_ms: 250,
            acquire_timeout_ms: 5000,
        }
    }
}

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path, settings: &PoolSettings) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .busy_timeout(Duration::from_millis(settings.busy_timeout_ms))
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal);

    let pool = SqlitePoolOptions::new()
        .max_connections(settings.max_connections)
        .acquire_timeout(Duration::from_millis(settings.acquire_timeout_ms))
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    create_schema(&pool).await?;

    Ok(pool)
}

/// Create every SentiShift table and index
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_posts_raw_table(pool).await?;
    create_posts_enriched_table(pool).await?;
    create_shifts_table(pool).await?;
    create_pipeline_lock_table(pool).await?;
    Ok(())
}

/// Raw posts, written by the ingestion connectors
async fn create_posts_raw_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS posts_raw (
            post_id TEXT PRIMARY KEY,
            platform TEXT NOT NULL,
            author_id TEXT NOT NULL DEFAULT '',
            created_at INTEGER NOT NULL,
            text TEXT NOT NULL,
            meta_json TEXT NOT NULL DEFAULT '{}'
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_posts_raw_created_at ON posts_raw(created_at)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Enriched posts; the primary key makes double-enrichment impossible
async fn create_posts_enriched_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS posts_enriched (
            post_id TEXT PRIMARY KEY,
            platform TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            lang TEXT NOT NULL,
            sentiment REAL NOT NULL,
            emotions_json TEXT NOT NULL DEFAULT '{}',
            toxicity REAL NOT NULL,
            sarcasm REAL NOT NULL DEFAULT 0.0,
            topic_id INTEGER NOT NULL DEFAULT -1,
            quality_score REAL NOT NULL DEFAULT 1.0
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_posts_enriched_platform_created ON posts_enriched(platform, created_at)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Detected shifts; one row per (platform, ts, metric)
async fn create_shifts_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS shifts (
            shift_id TEXT PRIMARY KEY,
            ts INTEGER NOT NULL,
            platform TEXT NOT NULL,
            scope TEXT NOT NULL,
            metric TEXT NOT NULL,
            score REAL NOT NULL,
            direction INTEGER NOT NULL CHECK (direction IN (-1, 1)),
            window_before INTEGER NOT NULL,
            window_after INTEGER NOT NULL,
            explanation TEXT NOT NULL,
            detected_at INTEGER NOT NULL DEFAULT (CAST(strftime('%s', 'now') AS INTEGER))
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_shifts_platform_ts_metric ON shifts(platform, ts, metric)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Run-level lease lock so overlapping scheduler runs do not interleave
async fn create_pipeline_lock_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS pipeline_lock (
            name TEXT PRIMARY KEY,
            owner TEXT NOT NULL,
            acquired_at INTEGER NOT NULL,
            expires_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
