//! Abstract sentiment store
//!
//! The pipeline only talks to storage through `SentimentStore`. The handle is
//! constructed by the caller and passed in, so tests can substitute a double.

pub mod sqlite;

pub use sqlite::SqliteStore;

use sentishift_common::db::{EnrichedRecord, RawRecord, SeriesPoint, ShiftEvent};
use sentishift_common::Result;

#[async_trait::async_trait]
pub trait SentimentStore: Send + Sync {
    /// Oldest-first raw records with no enriched counterpart, at most `limit`
    async fn fetch_unscored(&self, limit: u32) -> Result<Vec<RawRecord>>;

    /// Insert enriched rows; ids already present are ignored.
    /// Returns the number of rows actually written.
    async fn insert_enriched(&self, rows: &[EnrichedRecord]) -> Result<u64>;

    /// Hourly mean sentiment buckets for `platform`, ascending
    async fn query_hourly_series(&self, platform: &str) -> Result<Vec<SeriesPoint>>;

    /// Insert a shift; returns `false` when an identical shift already exists
    async fn insert_shift(&self, event: &ShiftEvent) -> Result<bool>;

    /// Insert raw records for ingestion; duplicate ids are ignored
    async fn insert_raw(&self, records: &[RawRecord]) -> Result<u64>;

    /// Recorded shifts for `platform`, ascending by timestamp
    async fn list_shifts(&self, platform: &str) -> Result<Vec<ShiftEvent>>;

    /// Take or renew the run lock for `owner`; `false` if another owner holds it
    async fn try_acquire_run_lock(&self, owner: &str, ttl_secs: i64) -> Result<bool>;

    /// Release the run lock if `owner` holds it
    async fn release_run_lock(&self, owner: &str) -> Result<bool>;
}
