//! End-to-end pipeline tests
//!
//! Real SQLite store in a temp dir, scripted scorer. Covers:
//! - Clean step detection and the recorded shift fields
//! - Re-run non-duplication
//! - Insufficient-data skip
//! - Best-effort enrichment under scoring failures
//! - Store failure mid-enrichment keeps committed chunks
//! - Per-platform failure isolation
//! - Run lock exclusion and lease renewal

mod helpers;

use helpers::{create_test_store, fast_config, hourly_posts, FailingStore, ScriptedScorer, BASE_HOUR};
use sentishift_common::db::{records, ShiftDirection};
use sentishift_common::time::from_unix;
use sentishift_pipeline::store::SentimentStore;
use sentishift_pipeline::{Pipeline, RunStatus};
use std::sync::Arc;

/// 10 values around `low` then 10 around `high`, alternating +/-0.01
fn step(low: f64, high: f64) -> Vec<f64> {
    (0..20)
        .map(|i| {
            let noise = if i % 2 == 0 { 0.01 } else { -0.01 };
            if i < 10 {
                low + noise
            } else {
                high + noise
            }
        })
        .collect()
}

#[tokio::test]
async fn test_clean_step_up_records_one_shift() {
    let (_dir, store) = create_test_store().await;
    store.insert_raw(&hourly_posts("x", &step(0.1, 0.6))).await.unwrap();

    let pipeline = Pipeline::new(
        Arc::new(store.clone()),
        Arc::new(ScriptedScorer::new()),
        fast_config(&["x"]),
    );
    let report = pipeline.run_once().await.unwrap();

    assert_eq!(report.status, RunStatus::Clean);
    assert_eq!(report.enrichment.inserted, 20);
    assert_eq!(report.platforms[0].buckets, 20);
    assert_eq!(report.platforms[0].change_points, 1);
    assert_eq!(report.platforms[0].recorded, 1);

    let shifts = store.list_shifts("x").await.unwrap();
    assert_eq!(shifts.len(), 1);
    let shift = &shifts[0];
    assert_eq!(shift.direction, ShiftDirection::Up);
    assert!((shift.score - 0.5).abs() < 1e-6, "score = {}", shift.score);
    // Stamped with the last bucket before the change (cp - 1 = 9)
    assert_eq!(shift.timestamp, from_unix(BASE_HOUR + 9 * 3600));
    assert_eq!(shift.scope, "global");
    assert_eq!(shift.metric, "sentiment_mean");
    assert_eq!(shift.explanation, "mean 0.10 -> 0.60");
    assert_eq!((shift.window_before, shift.window_after), (10, 10));
}

#[tokio::test]
async fn test_step_down_direction_is_negative() {
    let (_dir, store) = create_test_store().await;
    store.insert_raw(&hourly_posts("reddit", &step(0.6, 0.1))).await.unwrap();

    let pipeline = Pipeline::new(
        Arc::new(store.clone()),
        Arc::new(ScriptedScorer::new()),
        fast_config(&["reddit"]),
    );
    pipeline.run_once().await.unwrap();

    let shifts = store.list_shifts("reddit").await.unwrap();
    assert_eq!(shifts.len(), 1);
    assert_eq!(shifts[0].direction, ShiftDirection::Down);
    assert!((shifts[0].score - 0.5).abs() < 1e-6);
}

#[tokio::test]
async fn test_rerun_does_not_duplicate_shifts() {
    let (_dir, store) = create_test_store().await;
    store.insert_raw(&hourly_posts("x", &step(0.1, 0.6))).await.unwrap();

    let scorer = Arc::new(ScriptedScorer::new());
    let pipeline = Pipeline::new(Arc::new(store.clone()), scorer.clone(), fast_config(&["x"]));

    let first = pipeline.run_once().await.unwrap();
    let second = pipeline.run_once().await.unwrap();

    assert_eq!(first.platforms[0].recorded, 1);
    assert_eq!(second.platforms[0].recorded, 0);
    assert_eq!(second.platforms[0].duplicates, 1);
    assert_eq!(store.list_shifts("x").await.unwrap().len(), 1);

    // Nothing was rescored on the second run
    assert_eq!(second.enrichment.selected, 0);
    assert_eq!(scorer.calls(), 20);
}

#[tokio::test]
async fn test_nine_buckets_skip_detection() {
    let (_dir, store) = create_test_store().await;
    let values = [0.1, 0.1, 0.1, 0.1, 0.9, 0.9, 0.9, 0.9, 0.9];
    store.insert_raw(&hourly_posts("x", &values)).await.unwrap();

    let pipeline = Pipeline::new(
        Arc::new(store.clone()),
        Arc::new(ScriptedScorer::new()),
        fast_config(&["x"]),
    );
    let report = pipeline.run_once().await.unwrap();

    assert_eq!(report.status, RunStatus::Clean);
    assert!(report.platforms[0].insufficient_data);
    assert_eq!(report.platforms[0].change_points, 0);
    assert!(store.list_shifts("x").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_flat_series_records_nothing() {
    let (_dir, store) = create_test_store().await;
    store.insert_raw(&hourly_posts("x", &[0.3; 30])).await.unwrap();

    let pipeline = Pipeline::new(
        Arc::new(store.clone()),
        Arc::new(ScriptedScorer::new()),
        fast_config(&["x"]),
    );
    let report = pipeline.run_once().await.unwrap();

    assert_eq!(report.platforms[0].change_points, 0);
    assert!(store.list_shifts("x").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_scoring_failure_keeps_other_records() {
    let (_dir, store) = create_test_store().await;
    store.insert_raw(&hourly_posts("x", &[0.1, 0.2, 0.3])).await.unwrap();

    // "0.2" never scores; "0.3" times out once, then succeeds on retry
    let scorer = ScriptedScorer::new().always_timeout("0.2").timeout_times("0.3", 1);
    let pipeline = Pipeline::new(Arc::new(store.clone()), Arc::new(scorer), fast_config(&["x"]));

    let report = pipeline.run_once().await.unwrap();

    assert_eq!(report.status, RunStatus::PartialFailure);
    assert_eq!(report.enrichment.selected, 3);
    assert_eq!(report.enrichment.scored, 2);
    assert_eq!(report.enrichment.inserted, 2);
    assert_eq!(report.enrichment.failures.len(), 1);
    assert_eq!(report.enrichment.failures[0].record_id, "x-1");

    // The failed record is selected again next time
    let unscored = store.fetch_unscored(10).await.unwrap();
    let ids: Vec<&str> = unscored.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["x-1"]);

    // A healthy scorer picks it up
    let pipeline = Pipeline::new(
        Arc::new(store.clone()),
        Arc::new(ScriptedScorer::new()),
        fast_config(&["x"]),
    );
    let report = pipeline.run_once().await.unwrap();
    assert_eq!(report.status, RunStatus::Clean);
    assert_eq!(report.enrichment.inserted, 1);
    assert!(store.fetch_unscored(10).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_invalid_scores_are_not_retried() {
    let (_dir, store) = create_test_store().await;
    store.insert_raw(&hourly_posts("x", &[0.5])).await.unwrap();

    let scorer = Arc::new(ScriptedScorer::new().invalid("0.5"));
    let pipeline = Pipeline::new(Arc::new(store.clone()), scorer.clone(), fast_config(&["x"]));

    let report = pipeline.run_once().await.unwrap();

    assert_eq!(report.status, RunStatus::PartialFailure);
    assert_eq!(report.enrichment.failures.len(), 1);
    assert_eq!(scorer.calls(), 1);
}

#[tokio::test]
async fn test_store_failure_mid_enrichment_keeps_committed_chunks() {
    let (_dir, store) = create_test_store().await;
    let values: Vec<f64> = (0..5).map(|i| i as f64 / 10.0).collect();
    store.insert_raw(&hourly_posts("x", &values)).await.unwrap();

    let failing = FailingStore::new(store.clone()).fail_enriched_after(1);
    let mut config = fast_config(&["x"]);
    config.flush_chunk_size = 2;
    let pipeline = Pipeline::new(Arc::new(failing), Arc::new(ScriptedScorer::new()), config);

    let result = pipeline.run_once().await;

    assert!(result.is_err(), "store failure should be fatal");
    // First chunk of two survived
    assert_eq!(records::count_enriched(store.pool()).await.unwrap(), 2);

    // Lock was released, so the next run is not skipped
    let pipeline = Pipeline::new(
        Arc::new(store.clone()),
        Arc::new(ScriptedScorer::new()),
        fast_config(&["x"]),
    );
    let report = pipeline.run_once().await.unwrap();
    assert_eq!(report.status, RunStatus::Clean);
    assert_eq!(report.enrichment.inserted, 3);
}

#[tokio::test]
async fn test_platform_failure_is_partial_and_isolated() {
    let (_dir, store) = create_test_store().await;
    store.insert_raw(&hourly_posts("x", &step(0.1, 0.6))).await.unwrap();

    let failing = FailingStore::new(store.clone()).fail_series_for("reddit");
    let pipeline = Pipeline::new(
        Arc::new(failing),
        Arc::new(ScriptedScorer::new()),
        fast_config(&["reddit", "x"]),
    );

    let report = pipeline.run_once().await.unwrap();

    assert_eq!(report.status, RunStatus::PartialFailure);
    assert!(report.platforms[0].error.is_some());
    assert_eq!(report.platforms[1].platform, "x");
    assert_eq!(report.platforms[1].recorded, 1);
}

#[tokio::test]
async fn test_live_lock_skips_run() {
    let (_dir, store) = create_test_store().await;
    store.insert_raw(&hourly_posts("x", &[0.2, 0.4])).await.unwrap();
    assert!(store.try_acquire_run_lock("other-run", 600).await.unwrap());

    let scorer = Arc::new(ScriptedScorer::new());
    let pipeline = Pipeline::new(Arc::new(store.clone()), scorer.clone(), fast_config(&["x"]));
    let report = pipeline.run_once().await.unwrap();

    assert_eq!(report.status, RunStatus::Skipped);
    assert_eq!(scorer.calls(), 0);
    assert_eq!(store.fetch_unscored(10).await.unwrap().len(), 2);

    // Once released, the next run proceeds
    assert!(store.release_run_lock("other-run").await.unwrap());
    let report = pipeline.run_once().await.unwrap();
    assert_eq!(report.status, RunStatus::Clean);
    assert_eq!(report.enrichment.inserted, 2);
}

#[tokio::test]
async fn test_max_points_limits_analysed_window() {
    let (_dir, store) = create_test_store().await;
    // Old step at hour 10, then 30 flat hours
    let mut values = step(0.1, 0.6);
    values.extend(std::iter::repeat(0.61).take(30));
    store.insert_raw(&hourly_posts("x", &values)).await.unwrap();

    let mut config = fast_config(&["x"]);
    config.detection.max_points = Some(30);
    let pipeline = Pipeline::new(Arc::new(store.clone()), Arc::new(ScriptedScorer::new()), config);

    let report = pipeline.run_once().await.unwrap();

    assert_eq!(report.platforms[0].buckets, 50);
    assert_eq!(report.platforms[0].analysed, 30);
    assert_eq!(report.platforms[0].change_points, 0);
}

#[tokio::test]
async fn test_run_lock_is_renewed_during_a_long_run() {
    let (_dir, store) = create_test_store().await;
    store.insert_raw(&hourly_posts("x", &[0.2, 0.4, 0.6])).await.unwrap();

    let counting = Arc::new(FailingStore::new(store.clone()));
    let mut config = fast_config(&["x"]);
    // Zero TTL: every check is past half the lease
    config.lock_ttl_secs = 0;
    let pipeline = Pipeline::new(counting.clone(), Arc::new(ScriptedScorer::new()), config);

    let report = pipeline.run_once().await.unwrap();

    assert_eq!(report.status, RunStatus::Clean);
    // Acquire, one renewal per record, one per platform
    assert_eq!(counting.lock_calls(), 1 + 3 + 1);
}

#[tokio::test]
async fn test_short_run_does_not_renew_lock() {
    let (_dir, store) = create_test_store().await;
    store.insert_raw(&hourly_posts("x", &[0.2, 0.4, 0.6])).await.unwrap();

    let counting = Arc::new(FailingStore::new(store.clone()));
    let pipeline = Pipeline::new(counting.clone(), Arc::new(ScriptedScorer::new()), fast_config(&["x"]));

    pipeline.run_once().await.unwrap();

    assert_eq!(counting.lock_calls(), 1);
}

#[tokio::test]
async fn test_lost_lock_defers_remaining_records() {
    let (_dir, store) = create_test_store().await;
    store.insert_raw(&hourly_posts("x", &[0.2, 0.4, 0.6])).await.unwrap();

    // Acquire and the first renewal succeed, then another run owns the lock
    let failing = Arc::new(FailingStore::new(store.clone()).lose_lock_after(2));
    let mut config = fast_config(&["x"]);
    config.lock_ttl_secs = 0;
    let scorer = Arc::new(ScriptedScorer::new());
    let pipeline = Pipeline::new(failing, scorer.clone(), config);

    let report = pipeline.run_once().await.unwrap();

    assert_eq!(report.status, RunStatus::PartialFailure);
    assert!(report.lock_lost);
    assert_eq!(report.enrichment.inserted, 1);
    assert_eq!(report.enrichment.deferred, 2);
    assert!(report.platforms.is_empty());
    assert_eq!(scorer.calls(), 1);
    assert_eq!(store.fetch_unscored(10).await.unwrap().len(), 2);
}
