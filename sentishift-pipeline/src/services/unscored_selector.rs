//! Unscored record selection
//!
//! Oldest-first raw records that have no enriched counterpart. Pure read;
//! a failure here aborts the run before anything is written.

use crate::store::SentimentStore;
use crate::utils::{retry_with_backoff, RetryPolicy};
use sentishift_common::db::RawRecord;
use sentishift_common::{Error, Result};
use std::sync::Arc;

pub struct UnscoredSelector {
    store: Arc<dyn SentimentStore>,
    retry: RetryPolicy,
}

impl UnscoredSelector {
    pub fn new(store: Arc<dyn SentimentStore>, retry: RetryPolicy) -> Self {
        Self { store, retry }
    }

    /// Up to `limit` unscored records, oldest first
    pub async fn select(&self, limit: u32) -> Result<Vec<RawRecord>> {
        let batch = retry_with_backoff("fetch_unscored", &self.retry, Error::is_transient, || {
            self.store.fetch_unscored(limit)
        })
        .await?;

        tracing::info!(selected = batch.len(), limit, "Selected unscored records");
        Ok(batch)
    }
}
