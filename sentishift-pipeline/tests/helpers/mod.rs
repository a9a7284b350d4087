//! Test Helper Utilities
//!
//! Shared utilities for testing sentishift-pipeline

pub mod db_utils;
pub mod scripted_scorer;

// Re-export commonly used items
pub use db_utils::{create_test_store, fast_config, hourly_posts, FailingStore, BASE_HOUR};
pub use scripted_scorer::ScriptedScorer;
