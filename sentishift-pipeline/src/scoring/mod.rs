//! Sentiment scoring capability
//!
//! The pipeline consumes scoring as a black box: text in, sentiment /
//! emotions / toxicity out. Failures are returned as `ScoringError` values so
//! the enrichment step can decide per record whether to retry or skip.

pub mod http_client;

pub use http_client::HttpScorer;

use sentishift_common::db::SentimentScores;
use thiserror::Error;

/// Scoring capability errors
#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out after {0} ms")]
    Timeout(u64),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid score: {0}")]
    InvalidScore(String),
}

impl ScoringError {
    /// Network faults, timeouts, throttling and server errors are retryable.
    /// Client errors and malformed or out-of-range responses are not.
    pub fn is_transient(&self) -> bool {
        match self {
            ScoringError::Network(_) | ScoringError::Timeout(_) => true,
            ScoringError::Api(status, _) => *status == 429 || *status >= 500,
            ScoringError::Parse(_) | ScoringError::InvalidScore(_) => false,
        }
    }
}

/// Text → scores
#[async_trait::async_trait]
pub trait SentimentScorer: Send + Sync {
    /// Scorer name for logging
    fn name(&self) -> &'static str;

    /// Score one text. Returned scores are range-checked.
    async fn score(&self, text: &str) -> Result<SentimentScores, ScoringError>;
}
