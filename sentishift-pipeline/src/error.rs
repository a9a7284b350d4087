//! Error types for sentishift-pipeline
//!
//! Store failures abort the run. Scoring failures are per-record values the
//! enrichment step records and skips. Detector failures are per-platform.

use thiserror::Error;

/// Pipeline error type
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Store operation failed (after retries)
    #[error("Store error: {0}")]
    Store(#[from] sentishift_common::Error),

    /// Detection rejected its input
    #[error("Detection error: {0}")]
    Detection(String),
}

impl PipelineError {
    /// Whether retrying the same operation may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            PipelineError::Store(err) => err.is_transient(),
            PipelineError::Detection(_) => false,
        }
    }
}

/// Result type for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transience_follows_source_error() {
        let locked = PipelineError::Store(sentishift_common::Error::Database(
            sqlx::Error::PoolTimedOut,
        ));
        assert!(locked.is_transient());

        let bad_input = PipelineError::Store(sentishift_common::Error::InvalidInput(
            "limit 0".into(),
        ));
        assert!(!bad_input.is_transient());

        assert!(!PipelineError::Detection("NaN at index 3".into()).is_transient());
    }
}
