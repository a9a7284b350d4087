//! Utility modules for sentishift-pipeline

pub mod retry;

pub use retry::{retry_with_backoff, RetryPolicy};
