//! Pipeline orchestrator
//!
//! One run: take the run lock, select unscored records, enrich them, then for
//! each platform aggregate the hourly series, detect change points and record
//! shifts. The lock is released whether the run succeeds or not, and is
//! renewed during the run so it does not expire under a long batch.
//!
//! # Error Handling
//! - Selection or enrichment store failure: fatal, `Err` is returned
//! - Per-record scoring failure: partial, the record is retried next run
//! - Per-platform aggregation or detection failure: partial, other platforms
//!   still run
//!
//! # Example
//! ```rust,ignore
//! let pipeline = Pipeline::new(store, scorer, PipelineConfig::from_toml(&toml));
//! let report = pipeline.run_once().await?;
//! ```

use crate::error::{PipelineError, PipelineResult};
use crate::scoring::SentimentScorer;
use crate::services::series_aggregator::{sentiment_signal, trailing_window};
use crate::services::{
    ChangePointDetector, EnrichmentCoordinator, EnrichmentReport, SeriesAggregator, ShiftRecorder,
    UnscoredSelector,
};
use crate::store::SentimentStore;
use crate::utils::{retry_with_backoff, RetryPolicy};
use chrono::{DateTime, Utc};
use sentishift_common::config::{DetectionConfig, TomlConfig};
use sentishift_common::Error;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::RunLease;

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Platforms analysed each run, in order
    pub platforms: Vec<String>,
    /// Unscored records selected per run
    pub batch_size: u32,
    /// Enriched rows per insert
    pub flush_chunk_size: usize,
    pub retry: RetryPolicy,
    pub detection: DetectionConfig,
    /// Run lock lease lifetime
    pub lock_ttl_secs: i64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::from_toml(&TomlConfig::default())
    }
}

impl PipelineConfig {
    pub fn from_toml(config: &TomlConfig) -> Self {
        Self {
            platforms: config.platforms.clone(),
            batch_size: config.enrichment.batch_size,
            flush_chunk_size: config.enrichment.flush_chunk_size,
            retry: RetryPolicy::from(&config.retry),
            detection: config.detection.clone(),
            lock_ttl_secs: config.lock.ttl_secs,
        }
    }
}

/// Overall outcome of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Every stage succeeded
    Clean,
    /// Some records or platforms failed; everything else was committed
    PartialFailure,
    /// Another live run holds the lock
    Skipped,
}

/// Detection outcome for one platform
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlatformReport {
    pub platform: String,
    /// Buckets in the full history
    pub buckets: usize,
    /// Buckets handed to the detector
    pub analysed: usize,
    /// Detection did not run for lack of data
    pub insufficient_data: bool,
    pub change_points: usize,
    pub recorded: usize,
    pub duplicates: usize,
    pub error: Option<String>,
}

/// Result of `Pipeline::run_once`
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub status: RunStatus,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub enrichment: EnrichmentReport,
    pub platforms: Vec<PlatformReport>,
    /// Another run took the lock over before this one finished
    pub lock_lost: bool,
}

impl RunReport {
    fn new(run_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            run_id,
            status: RunStatus::Clean,
            started_at: now,
            finished_at: now,
            enrichment: EnrichmentReport::default(),
            platforms: Vec::new(),
            lock_lost: false,
        }
    }

    fn settle(&mut self) {
        let platform_failed = self.platforms.iter().any(|p| p.error.is_some());
        self.status = if !self.enrichment.is_clean() || platform_failed || self.lock_lost {
            RunStatus::PartialFailure
        } else {
            RunStatus::Clean
        };
        self.finished_at = Utc::now();
    }

    pub fn shifts_recorded(&self) -> usize {
        self.platforms.iter().map(|p| p.recorded).sum()
    }
}

/// Pipeline orchestrator
pub struct Pipeline {
    store: Arc<dyn SentimentStore>,
    scorer: Arc<dyn SentimentScorer>,
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a pipeline over an explicitly constructed store and scorer
    pub fn new(
        store: Arc<dyn SentimentStore>,
        scorer: Arc<dyn SentimentScorer>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            store,
            scorer,
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Execute one complete run
    ///
    /// # Returns
    /// * `Ok(report)` with status Clean, PartialFailure or Skipped
    /// * `Err` on a fatal store failure; committed data is left intact
    pub async fn run_once(&self) -> PipelineResult<RunReport> {
        let run_id = Uuid::new_v4();
        let owner = run_id.to_string();
        let mut report = RunReport::new(run_id);

        let acquired = retry_with_backoff(
            "try_acquire_run_lock",
            &self.config.retry,
            Error::is_transient,
            || self.store.try_acquire_run_lock(&owner, self.config.lock_ttl_secs),
        )
        .await?;

        if !acquired {
            info!(run_id = %run_id, "Another run holds the lock, skipping");
            report.status = RunStatus::Skipped;
            report.finished_at = Utc::now();
            return Ok(report);
        }

        info!(run_id = %run_id, platforms = ?self.config.platforms, "Pipeline run started");

        let lease = Arc::new(RunLease::new(
            self.store.clone(),
            owner.as_str(),
            self.config.lock_ttl_secs,
        ));
        let outcome = self.run_locked(&lease, &mut report).await;
        report.lock_lost = lease.is_lost();

        match self.store.release_run_lock(&owner).await {
            Ok(true) => debug!(run_id = %run_id, "Run lock released"),
            Ok(false) => warn!(run_id = %run_id, "Run lock was no longer held at release"),
            Err(e) => warn!(run_id = %run_id, error = %e, "Failed to release run lock; it will expire"),
        }

        match outcome {
            Ok(()) => {
                report.settle();
                info!(
                    run_id = %run_id,
                    status = ?report.status,
                    enriched = report.enrichment.inserted,
                    scoring_failures = report.enrichment.failures.len(),
                    shifts_recorded = report.shifts_recorded(),
                    elapsed_ms = (report.finished_at - report.started_at).num_milliseconds(),
                    "Pipeline run complete"
                );
                Ok(report)
            }
            Err(e) => {
                error!(run_id = %run_id, error = %e, "Pipeline run failed");
                Err(e)
            }
        }
    }

    async fn run_locked(&self, lease: &Arc<RunLease>, report: &mut RunReport) -> PipelineResult<()> {
        // Phase 1: select
        let selector = UnscoredSelector::new(self.store.clone(), self.config.retry.clone());
        let batch = selector.select(self.config.batch_size).await?;

        // Phase 2: enrich
        let coordinator = EnrichmentCoordinator::new(
            self.store.clone(),
            self.scorer.clone(),
            self.config.retry.clone(),
            self.config.flush_chunk_size,
        )
        .with_lease(lease.clone());
        report.enrichment = coordinator.enrich(&batch).await?;

        // Phase 3: per-platform detection
        for platform in &self.config.platforms {
            lease.keep_alive().await;
            if lease.is_lost() {
                info!(platform = %platform, "Run lock lost, detection left to the current holder");
                break;
            }

            let platform_report = match self.detect_platform(platform).await {
                Ok(r) => r,
                Err(e) => {
                    warn!(platform = %platform, error = %e, "Platform detection failed");
                    PlatformReport {
                        platform: platform.clone(),
                        error: Some(e.to_string()),
                        ..Default::default()
                    }
                }
            };
            report.platforms.push(platform_report);
        }

        Ok(())
    }

    async fn detect_platform(&self, platform: &str) -> PipelineResult<PlatformReport> {
        let mut report = PlatformReport {
            platform: platform.to_string(),
            ..Default::default()
        };

        let aggregator = SeriesAggregator::new(self.store.clone(), self.config.retry.clone());
        let series = aggregator.hourly_series(platform).await?;
        report.buckets = series.len();

        let window = trailing_window(&series, self.config.detection.max_points);
        report.analysed = window.len();

        let detector = ChangePointDetector::from_config(&self.config.detection, platform);
        if window.len() < detector.min_points {
            info!(
                platform = %platform,
                buckets = window.len(),
                min_points = detector.min_points,
                "Insufficient data, detection skipped"
            );
            report.insufficient_data = true;
            return Ok(report);
        }

        let change_points = detector
            .detect(&sentiment_signal(window))
            .map_err(|e| PipelineError::Detection(e.to_string()))?;
        report.change_points = change_points.len();

        let recorder = ShiftRecorder::new(
            self.store.clone(),
            self.config.retry.clone(),
            self.config.detection.window_metadata.clone(),
        );
        let recorded = recorder.record(platform, window, &change_points).await?;
        report.recorded = recorded.recorded;
        report.duplicates = recorded.duplicates;

        info!(
            platform = %platform,
            buckets = report.buckets,
            analysed = report.analysed,
            change_points = report.change_points,
            recorded = report.recorded,
            duplicates = report.duplicates,
            "Platform detection complete"
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_toml_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.platforms, vec!["reddit", "x"]);
        assert_eq!(config.batch_size, 200);
        assert_eq!(config.flush_chunk_size, 25);
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.lock_ttl_secs, 900);
    }

    #[test]
    fn test_report_status_settles_on_failures() {
        let mut report = RunReport::new(Uuid::new_v4());
        report.platforms.push(PlatformReport {
            platform: "x".into(),
            ..Default::default()
        });
        report.settle();
        assert_eq!(report.status, RunStatus::Clean);

        report.platforms.push(PlatformReport {
            platform: "reddit".into(),
            error: Some("boom".into()),
            ..Default::default()
        });
        report.settle();
        assert_eq!(report.status, RunStatus::PartialFailure);
    }

    #[test]
    fn test_run_status_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&RunStatus::PartialFailure).unwrap(),
            "\"partial_failure\""
        );
    }
}
