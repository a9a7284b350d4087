//! In-process scoring double
//!
//! The sentiment of a text is the text itself parsed as a number ("0.6" →
//! 0.6; anything else → 0.0). Individual texts can be scripted to fail.

use sentishift_common::db::SentimentScores;
use sentishift_pipeline::scoring::{ScoringError, SentimentScorer};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

#[derive(Default)]
pub struct ScriptedScorer {
    /// Texts that time out on every attempt
    always_timeout: HashSet<String>,
    /// Texts that time out this many more times, then succeed
    timeouts_left: Mutex<HashMap<String, usize>>,
    /// Texts that come back out of range
    invalid: HashSet<String>,
    calls: AtomicUsize,
}

#[allow(dead_code)]
impl ScriptedScorer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn always_timeout(mut self, text: &str) -> Self {
        self.always_timeout.insert(text.to_string());
        self
    }

    pub fn timeout_times(self, text: &str, times: usize) -> Self {
        self.timeouts_left
            .lock()
            .unwrap()
            .insert(text.to_string(), times);
        self
    }

    pub fn invalid(mut self, text: &str) -> Self {
        self.invalid.insert(text.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl SentimentScorer for ScriptedScorer {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn score(&self, text: &str) -> Result<SentimentScores, ScoringError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.always_timeout.contains(text) {
            return Err(ScoringError::Timeout(10));
        }

        {
            let mut left = self.timeouts_left.lock().unwrap();
            if let Some(n) = left.get_mut(text) {
                if *n > 0 {
                    *n -= 1;
                    return Err(ScoringError::Timeout(10));
                }
            }
        }

        if self.invalid.contains(text) {
            return Err(ScoringError::InvalidScore(format!("sentiment for '{}' out of range", text)));
        }

        Ok(SentimentScores {
            sentiment: text.parse().unwrap_or(0.0),
            emotions: BTreeMap::from([("neutral".to_string(), 0.5)]),
            toxicity: 0.0,
        })
    }
}
