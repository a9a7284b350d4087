//! Hourly series aggregation
//!
//! The full per-platform history is recomputed every run. Detection may then
//! look at only the trailing `max_points` buckets.

use crate::store::SentimentStore;
use crate::utils::{retry_with_backoff, RetryPolicy};
use sentishift_common::db::SeriesPoint;
use sentishift_common::{Error, Result};
use std::sync::Arc;

pub struct SeriesAggregator {
    store: Arc<dyn SentimentStore>,
    retry: RetryPolicy,
}

impl SeriesAggregator {
    pub fn new(store: Arc<dyn SentimentStore>, retry: RetryPolicy) -> Self {
        Self { store, retry }
    }

    /// Hour-aligned buckets for `platform`, ascending by bucket start
    pub async fn hourly_series(&self, platform: &str) -> Result<Vec<SeriesPoint>> {
        let points = retry_with_backoff(
            "query_hourly_series",
            &self.retry,
            Error::is_transient,
            || self.store.query_hourly_series(platform),
        )
        .await?;

        tracing::debug!(
            platform = %platform,
            buckets = points.len(),
            "Aggregated hourly series"
        );
        Ok(points)
    }
}

/// The last `max_points` buckets (all of them when `None`)
pub fn trailing_window(points: &[SeriesPoint], max_points: Option<usize>) -> &[SeriesPoint] {
    match max_points {
        Some(max) if points.len() > max => &points[points.len() - max..],
        _ => points,
    }
}

/// Mean sentiment per bucket, in order
pub fn sentiment_signal(points: &[SeriesPoint]) -> Vec<f64> {
    points.iter().map(|p| p.mean_sentiment).collect()
}
