//! SQLite-backed store

use super::SentimentStore;
use sentishift_common::db::{self, EnrichedRecord, RawRecord, SeriesPoint, ShiftEvent};
use sentishift_common::{time, Result};
use sqlx::SqlitePool;

/// `SentimentStore` over the shared SQLite database
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
    lock_name: String,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool, lock_name: impl Into<String>) -> Self {
        Self {
            pool,
            lock_name: lock_name.into(),
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait::async_trait]
impl SentimentStore for SqliteStore {
    async fn fetch_unscored(&self, limit: u32) -> Result<Vec<RawRecord>> {
        db::records::fetch_unscored(&self.pool, limit).await
    }

    async fn insert_enriched(&self, rows: &[EnrichedRecord]) -> Result<u64> {
        db::records::insert_enriched(&self.pool, rows).await
    }

    async fn query_hourly_series(&self, platform: &str) -> Result<Vec<SeriesPoint>> {
        db::series::query_hourly_series(&self.pool, platform).await
    }

    async fn insert_shift(&self, event: &ShiftEvent) -> Result<bool> {
        db::shifts::insert_shift(&self.pool, event).await
    }

    async fn insert_raw(&self, records: &[RawRecord]) -> Result<u64> {
        db::records::insert_raw(&self.pool, records).await
    }

    async fn list_shifts(&self, platform: &str) -> Result<Vec<ShiftEvent>> {
        db::shifts::list_shifts(&self.pool, platform).await
    }

    async fn try_acquire_run_lock(&self, owner: &str, ttl_secs: i64) -> Result<bool> {
        let now = time::now().timestamp();
        db::lock::try_acquire(&self.pool, &self.lock_name, owner, now, ttl_secs).await
    }

    async fn release_run_lock(&self, owner: &str) -> Result<bool> {
        db::lock::release(&self.pool, &self.lock_name, owner).await
    }
}
