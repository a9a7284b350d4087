//! Enrichment coordination
//!
//! Scores each selected record in order and writes the results in chunks.
//!
//! **Failure handling:**
//! - A record whose scoring still fails after retries is skipped and reported.
//!   Nothing marks it, so the next run selects it again.
//! - Scored rows are flushed every `flush_chunk_size` rows and once at the
//!   end, so a late failure cannot discard earlier work.
//! - A store failure while flushing ends the run; chunks already written stay
//!   written.
//! - With a run lease attached, the lease is kept alive between records. Once
//!   another run has taken the lock over, the remaining records are deferred
//!   to it.

use crate::error::{PipelineError, PipelineResult};
use crate::scoring::{ScoringError, SentimentScorer};
use crate::store::SentimentStore;
use crate::utils::{retry_with_backoff, RetryPolicy};
use crate::workflow::RunLease;
use sentishift_common::db::{EnrichedRecord, RawRecord};
use sentishift_common::Error;
use serde::Serialize;
use std::sync::Arc;

/// One record that could not be scored this run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichmentFailure {
    pub record_id: String,
    pub reason: String,
}

/// Outcome of one enrichment pass
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EnrichmentReport {
    /// Records handed to the coordinator
    pub selected: usize,
    /// Records the scorer accepted
    pub scored: usize,
    /// Rows the store actually wrote
    pub inserted: u64,
    /// Scored rows whose id was already enriched (concurrent run)
    pub already_present: u64,
    pub failures: Vec<EnrichmentFailure>,
    /// Records left unscored because the run lock was lost
    pub deferred: usize,
}

impl EnrichmentReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && self.deferred == 0
    }
}

pub struct EnrichmentCoordinator {
    store: Arc<dyn SentimentStore>,
    scorer: Arc<dyn SentimentScorer>,
    retry: RetryPolicy,
    flush_chunk_size: usize,
    lease: Option<Arc<RunLease>>,
}

impl EnrichmentCoordinator {
    pub fn new(
        store: Arc<dyn SentimentStore>,
        scorer: Arc<dyn SentimentScorer>,
        retry: RetryPolicy,
        flush_chunk_size: usize,
    ) -> Self {
        Self {
            store,
            scorer,
            retry,
            flush_chunk_size: flush_chunk_size.max(1),
            lease: None,
        }
    }

    /// Keep `lease` alive while enriching
    pub fn with_lease(mut self, lease: Arc<RunLease>) -> Self {
        self.lease = Some(lease);
        self
    }

    /// Score and persist `batch` in order
    pub async fn enrich(&self, batch: &[RawRecord]) -> PipelineResult<EnrichmentReport> {
        let mut report = EnrichmentReport {
            selected: batch.len(),
            ..Default::default()
        };

        if batch.is_empty() {
            tracing::debug!("Nothing to enrich");
            return Ok(report);
        }

        tracing::info!(
            records = batch.len(),
            scorer = self.scorer.name(),
            chunk_size = self.flush_chunk_size,
            "Enrichment started"
        );

        let mut pending: Vec<EnrichedRecord> = Vec::with_capacity(self.flush_chunk_size);

        for (index, record) in batch.iter().enumerate() {
            if let Some(lease) = &self.lease {
                lease.keep_alive().await;
                if lease.is_lost() {
                    report.deferred = batch.len() - index;
                    tracing::warn!(deferred = report.deferred, "Run lock lost, enrichment stopped");
                    break;
                }
            }

            match self.score_with_retry(&record.text).await {
                Ok(scores) => {
                    report.scored += 1;
                    pending.push(EnrichedRecord::from_scored(record, scores));
                }
                Err(err) => {
                    tracing::warn!(
                        record_id = %record.id,
                        platform = %record.platform,
                        error = %err,
                        "Scoring failed, record left for next run"
                    );
                    report.failures.push(EnrichmentFailure {
                        record_id: record.id.clone(),
                        reason: err.to_string(),
                    });
                }
            }

            if pending.len() >= self.flush_chunk_size {
                self.flush(&mut pending, &mut report).await?;
            }
        }

        self.flush(&mut pending, &mut report).await?;

        tracing::info!(
            selected = report.selected,
            scored = report.scored,
            inserted = report.inserted,
            already_present = report.already_present,
            failed = report.failures.len(),
            deferred = report.deferred,
            "Enrichment complete"
        );

        Ok(report)
    }

    async fn score_with_retry(
        &self,
        text: &str,
    ) -> Result<sentishift_common::db::SentimentScores, ScoringError> {
        retry_with_backoff("score", &self.retry, ScoringError::is_transient, || {
            self.scorer.score(text)
        })
        .await
    }

    async fn flush(
        &self,
        pending: &mut Vec<EnrichedRecord>,
        report: &mut EnrichmentReport,
    ) -> PipelineResult<()> {
        if pending.is_empty() {
            return Ok(());
        }

        let chunk: &[EnrichedRecord] = pending.as_slice();
        let rows = chunk.len() as u64;
        let inserted = retry_with_backoff("insert_enriched", &self.retry, Error::is_transient, || {
            self.store.insert_enriched(chunk)
        })
        .await
        .map_err(|err| {
            tracing::error!(
                rows,
                committed = report.inserted,
                error = %err,
                "Enriched flush failed"
            );
            PipelineError::Store(err)
        })?;

        report.inserted += inserted;
        report.already_present += rows.saturating_sub(inserted);
        tracing::debug!(rows, inserted, "Flushed enriched chunk");

        pending.clear();
        Ok(())
    }
}
