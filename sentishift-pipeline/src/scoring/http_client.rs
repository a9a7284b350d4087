//! HTTP client for the NLP scoring service
//!
//! `POST {base_url}/score` with `{"text": ...}`, answered by
//! `{"sentiment": f64, "emotions": {label: f64}, "toxicity": f64}`.

use super::{ScoringError, SentimentScorer};
use sentishift_common::db::SentimentScores;
use serde::Serialize;
use std::time::Duration;

const USER_AGENT: &str = concat!("sentishift-pipeline/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Serialize)]
struct ScoreRequest<'a> {
    text: &'a str,
}

/// Scoring service client
pub struct HttpScorer {
    http_client: reqwest::Client,
    endpoint: String,
    timeout_ms: u64,
}

impl HttpScorer {
    /// Build a client with a bounded per-request timeout
    pub fn new(base_url: &str, timeout_ms: u64) -> Result<Self, ScoringError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .map_err(|e| ScoringError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            endpoint: format!("{}/score", base_url.trim_end_matches('/')),
            timeout_ms,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait::async_trait]
impl SentimentScorer for HttpScorer {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn score(&self, text: &str) -> Result<SentimentScores, ScoringError> {
        tracing::trace!(endpoint = %self.endpoint, chars = text.len(), "Scoring text");

        let response = self
            .http_client
            .post(&self.endpoint)
            .json(&ScoreRequest { text })
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ScoringError::Timeout(self.timeout_ms)
                } else {
                    ScoringError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ScoringError::Api(status.as_u16(), error_text));
        }

        let scores: SentimentScores = response.json().await.map_err(|e| {
            if e.is_timeout() {
                ScoringError::Timeout(self.timeout_ms)
            } else {
                ScoringError::Parse(e.to_string())
            }
        })?;

        scores
            .validate()
            .map_err(|e| ScoringError::InvalidScore(e.to_string()))?;

        Ok(scores)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let scorer = HttpScorer::new("http://127.0.0.1:8001", 20_000);
        assert!(scorer.is_ok());
    }

    #[test]
    fn test_endpoint_joins_without_double_slash() {
        let scorer = HttpScorer::new("http://nlp:8001/", 1000).unwrap();
        assert_eq!(scorer.endpoint(), "http://nlp:8001/score");
    }

    #[tokio::test]
    async fn test_unreachable_service_is_transient() {
        // Port 9 (discard) is closed on test hosts
        let scorer = HttpScorer::new("http://127.0.0.1:9", 500).unwrap();
        let err = scorer.score("hello").await.unwrap_err();
        assert!(err.is_transient(), "expected transient error, got {:?}", err);
    }
}
