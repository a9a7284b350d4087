//! Database Test Utilities
//!
//! Temporary SQLite stores, seeded posts and a store wrapper that fails on
//! demand.

use sentishift_common::config::DetectionConfig;
use sentishift_common::db::{
    init_database, EnrichedRecord, PoolSettings, RawRecord, SeriesPoint, ShiftEvent,
};
use sentishift_common::time::from_unix;
use sentishift_common::{Error, Result};
use sentishift_pipeline::store::{SentimentStore, SqliteStore};
use sentishift_pipeline::utils::RetryPolicy;
use sentishift_pipeline::PipelineConfig;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::TempDir;

/// Hour-aligned start of every seeded series
pub const BASE_HOUR: i64 = 1_709_294_400;

/// Create temporary test store
///
/// Returns (TempDir, SqliteStore) - TempDir must be kept alive for duration of test
pub async fn create_test_store() -> (TempDir, SqliteStore) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("sentishift-test.db");
    let pool = init_database(&db_path, &PoolSettings::default())
        .await
        .expect("Database initialization failed");
    (temp_dir, SqliteStore::new(pool, "test-run-lock"))
}

/// One post per hour for `platform`; text is the sentiment value
pub fn hourly_posts(platform: &str, values: &[f64]) -> Vec<RawRecord> {
    values
        .iter()
        .enumerate()
        .map(|(i, v)| RawRecord {
            id: format!("{}-{}", platform, i),
            platform: platform.to_string(),
            author: "tester".to_string(),
            created_at: from_unix(BASE_HOUR + i as i64 * 3600 + 60),
            text: v.to_string(),
            meta_json: serde_json::json!({}),
        })
        .collect()
}

/// Pipeline config with millisecond backoff and a moderate penalty
pub fn fast_config(platforms: &[&str]) -> PipelineConfig {
    PipelineConfig {
        platforms: platforms.iter().map(|p| p.to_string()).collect(),
        batch_size: 500,
        flush_chunk_size: 25,
        retry: RetryPolicy {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(2),
        },
        detection: DetectionConfig {
            penalty: 2.0,
            ..DetectionConfig::default()
        },
        lock_ttl_secs: 60,
    }
}

/// Delegates to a real store, failing selected operations
pub struct FailingStore {
    inner: SqliteStore,
    /// `insert_enriched` calls allowed before every later call fails
    enriched_calls_allowed: Option<usize>,
    enriched_calls: AtomicUsize,
    /// Platform whose series query always fails
    series_fails_for: Option<String>,
    /// Lock calls that succeed before another owner appears to hold the lock
    lock_calls_allowed: Option<usize>,
    lock_calls: AtomicUsize,
}

#[allow(dead_code)]
impl FailingStore {
    pub fn new(inner: SqliteStore) -> Self {
        Self {
            inner,
            enriched_calls_allowed: None,
            enriched_calls: AtomicUsize::new(0),
            series_fails_for: None,
            lock_calls_allowed: None,
            lock_calls: AtomicUsize::new(0),
        }
    }

    pub fn fail_enriched_after(mut self, calls: usize) -> Self {
        self.enriched_calls_allowed = Some(calls);
        self
    }

    pub fn fail_series_for(mut self, platform: &str) -> Self {
        self.series_fails_for = Some(platform.to_string());
        self
    }

    pub fn lose_lock_after(mut self, calls: usize) -> Self {
        self.lock_calls_allowed = Some(calls);
        self
    }

    /// `try_acquire_run_lock` calls so far (acquire plus renewals)
    pub fn lock_calls(&self) -> usize {
        self.lock_calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl SentimentStore for FailingStore {
    async fn fetch_unscored(&self, limit: u32) -> Result<Vec<RawRecord>> {
        self.inner.fetch_unscored(limit).await
    }

    async fn insert_enriched(&self, rows: &[EnrichedRecord]) -> Result<u64> {
        let call = self.enriched_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(allowed) = self.enriched_calls_allowed {
            if call >= allowed {
                return Err(Error::Internal("disk full".to_string()));
            }
        }
        self.inner.insert_enriched(rows).await
    }

    async fn query_hourly_series(&self, platform: &str) -> Result<Vec<SeriesPoint>> {
        if self.series_fails_for.as_deref() == Some(platform) {
            return Err(Error::Internal(format!("series for {} unavailable", platform)));
        }
        self.inner.query_hourly_series(platform).await
    }

    async fn insert_shift(&self, event: &ShiftEvent) -> Result<bool> {
        self.inner.insert_shift(event).await
    }

    async fn insert_raw(&self, records: &[RawRecord]) -> Result<u64> {
        self.inner.insert_raw(records).await
    }

    async fn list_shifts(&self, platform: &str) -> Result<Vec<ShiftEvent>> {
        self.inner.list_shifts(platform).await
    }

    async fn try_acquire_run_lock(&self, owner: &str, ttl_secs: i64) -> Result<bool> {
        let call = self.lock_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(allowed) = self.lock_calls_allowed {
            if call >= allowed {
                return Ok(false);
            }
        }
        self.inner.try_acquire_run_lock(owner, ttl_secs).await
    }

    async fn release_run_lock(&self, owner: &str) -> Result<bool> {
        self.inner.release_run_lock(owner).await
    }
}
