//! Shift recording
//!
//! Turns change points into `ShiftEvent`s and persists them in detection
//! order. Shift ids are fingerprints of (platform, bucket, metric), so
//! recording the same change twice is a no-op.

use crate::store::SentimentStore;
use crate::utils::{retry_with_backoff, RetryPolicy};
use sentishift_common::config::WindowMetadata;
use sentishift_common::db::{SeriesPoint, ShiftEvent};
use sentishift_common::{Error, Result};
use serde::Serialize;
use std::sync::Arc;

/// Outcome of recording one platform's change points
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RecordReport {
    /// New shift rows written
    pub recorded: usize,
    /// Shifts already present from an earlier run
    pub duplicates: usize,
}

/// Build shift events for `change_points` over `points`
///
/// For each `cp` (ascending): before = mean of the slice since the previous
/// change point, after = mean of the whole remaining tail. The event is
/// stamped with the bucket at `cp - 1`.
pub fn build_shifts(
    platform: &str,
    points: &[SeriesPoint],
    change_points: &[usize],
    window: &WindowMetadata,
) -> Vec<ShiftEvent> {
    let n = points.len();
    let mut events = Vec::with_capacity(change_points.len());
    let mut prev = 0;

    for &cp in change_points {
        if cp <= prev || cp >= n {
            tracing::warn!(platform = %platform, cp, prev, n, "Ignoring out-of-range change point");
            continue;
        }

        let before_mean = mean(&points[prev..cp]);
        let after_mean = mean(&points[cp..]);
        let (window_before, window_after) = match window {
            WindowMetadata::SliceLengths => ((cp - prev) as i64, (n - cp) as i64),
            WindowMetadata::Fixed { before, after } => {
                tracing::debug!(
                    platform = %platform,
                    cp,
                    slice_before = cp - prev,
                    slice_after = n - cp,
                    recorded_before = before,
                    recorded_after = after,
                    "Recorded window sizes differ from the slices used for the means"
                );
                (*before, *after)
            }
        };

        events.push(ShiftEvent::sentiment_mean(
            platform,
            points[cp - 1].bucket_start,
            before_mean,
            after_mean,
            window_before,
            window_after,
        ));
        prev = cp;
    }

    events
}

fn mean(points: &[SeriesPoint]) -> f64 {
    points.iter().map(|p| p.mean_sentiment).sum::<f64>() / points.len() as f64
}

pub struct ShiftRecorder {
    store: Arc<dyn SentimentStore>,
    retry: RetryPolicy,
    window: WindowMetadata,
}

impl ShiftRecorder {
    pub fn new(store: Arc<dyn SentimentStore>, retry: RetryPolicy, window: WindowMetadata) -> Self {
        Self {
            store,
            retry,
            window,
        }
    }

    /// Build and persist shifts for `change_points`, in order
    pub async fn record(
        &self,
        platform: &str,
        points: &[SeriesPoint],
        change_points: &[usize],
    ) -> Result<RecordReport> {
        let mut report = RecordReport::default();

        for event in build_shifts(platform, points, change_points, &self.window) {
            let inserted = retry_with_backoff("insert_shift", &self.retry, Error::is_transient, || {
                self.store.insert_shift(&event)
            })
            .await?;

            if inserted {
                tracing::info!(
                    platform = %platform,
                    shift_id = %event.shift_id,
                    ts = %event.timestamp,
                    score = event.score,
                    direction = event.direction.as_i64(),
                    "Recorded shift"
                );
                report.recorded += 1;
            } else {
                tracing::debug!(shift_id = %event.shift_id, "Shift already recorded");
                report.duplicates += 1;
            }
        }

        Ok(report)
    }
}
