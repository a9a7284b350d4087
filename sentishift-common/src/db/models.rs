//! Database models
//!
//! Lifecycle: `RawRecord` → (scored once) → `EnrichedRecord` → hourly
//! `SeriesPoint` sequence → `ShiftEvent`. Nothing is mutated after creation.

use crate::fingerprint::shift_fingerprint;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Scope tag recorded on every shift
pub const SCOPE_GLOBAL: &str = "global";

/// Metric tag for hourly mean sentiment shifts
pub const METRIC_SENTIMENT_MEAN: &str = "sentiment_mean";

/// Language recorded until language detection exists
pub const DEFAULT_LANGUAGE: &str = "en";

/// Sarcasm placeholder until a sarcasm model exists
pub const SARCASM_PLACEHOLDER: f64 = 0.0;

/// Topic id meaning "unassigned"
pub const TOPIC_UNASSIGNED: i64 = -1;

/// Quality score placeholder until quality scoring exists
pub const QUALITY_PLACEHOLDER: f64 = 1.0;

/// Raw social-media post as written by the ingestion connectors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    pub id: String,
    pub platform: String,
    pub author: String,
    pub created_at: DateTime<Utc>,
    pub text: String,
    pub meta_json: serde_json::Value,
}

/// Output of the external scoring capability for one text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentScores {
    /// Signed sentiment in [-1, 1]
    pub sentiment: f64,
    /// Emotion label → probability in [0, 1]
    pub emotions: BTreeMap<String, f64>,
    /// Toxicity probability in [0, 1]
    pub toxicity: f64,
}

impl SentimentScores {
    /// Reject values outside their documented ranges (NaN included)
    pub fn validate(&self) -> Result<()> {
        if !(-1.0..=1.0).contains(&self.sentiment) {
            return Err(Error::InvalidInput(format!(
                "sentiment {} outside [-1, 1]",
                self.sentiment
            )));
        }
        if !(0.0..=1.0).contains(&self.toxicity) {
            return Err(Error::InvalidInput(format!(
                "toxicity {} outside [0, 1]",
                self.toxicity
            )));
        }
        for (label, p) in &self.emotions {
            if !(0.0..=1.0).contains(p) {
                return Err(Error::InvalidInput(format!(
                    "emotion '{}' probability {} outside [0, 1]",
                    label, p
                )));
            }
        }
        Ok(())
    }
}

/// Scored post; at most one per raw record id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedRecord {
    pub id: String,
    pub platform: String,
    pub created_at: DateTime<Utc>,
    pub language: String,
    pub sentiment: f64,
    pub emotions: BTreeMap<String, f64>,
    pub toxicity: f64,
    pub sarcasm: f64,
    pub topic_id: i64,
    pub quality_score: f64,
}

impl EnrichedRecord {
    /// Pair a raw record with its scores and the placeholder columns
    pub fn from_scored(raw: &RawRecord, scores: SentimentScores) -> Self {
        Self {
            id: raw.id.clone(),
            platform: raw.platform.clone(),
            created_at: raw.created_at,
            language: DEFAULT_LANGUAGE.to_string(),
            sentiment: scores.sentiment,
            emotions: scores.emotions,
            toxicity: scores.toxicity,
            sarcasm: SARCASM_PLACEHOLDER,
            topic_id: TOPIC_UNASSIGNED,
            quality_score: QUALITY_PLACEHOLDER,
        }
    }
}

/// One hourly bucket of the per-platform sentiment series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    /// Hour-aligned bucket start (UTC)
    pub bucket_start: DateTime<Utc>,
    pub mean_sentiment: f64,
    pub count: i64,
}

/// Direction of a regime shift
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "i64", try_from = "i64")]
pub enum ShiftDirection {
    Up,
    Down,
}

impl ShiftDirection {
    /// `Up` only when the mean strictly increased
    pub fn between(before_mean: f64, after_mean: f64) -> Self {
        if after_mean > before_mean {
            ShiftDirection::Up
        } else {
            ShiftDirection::Down
        }
    }

    pub fn as_i64(self) -> i64 {
        match self {
            ShiftDirection::Up => 1,
            ShiftDirection::Down => -1,
        }
    }
}

impl From<ShiftDirection> for i64 {
    fn from(d: ShiftDirection) -> i64 {
        d.as_i64()
    }
}

impl TryFrom<i64> for ShiftDirection {
    type Error = String;

    fn try_from(value: i64) -> std::result::Result<Self, Self::Error> {
        match value {
            1 => Ok(ShiftDirection::Up),
            -1 => Ok(ShiftDirection::Down),
            other => Err(format!("invalid shift direction {}", other)),
        }
    }
}

/// Persisted regime shift
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShiftEvent {
    pub shift_id: String,
    pub timestamp: DateTime<Utc>,
    pub platform: String,
    pub scope: String,
    pub metric: String,
    pub score: f64,
    pub direction: ShiftDirection,
    pub window_before: i64,
    pub window_after: i64,
    pub explanation: String,
}

impl ShiftEvent {
    /// Build a global sentiment-mean shift with a deterministic id
    pub fn sentiment_mean(
        platform: &str,
        timestamp: DateTime<Utc>,
        before_mean: f64,
        after_mean: f64,
        window_before: i64,
        window_after: i64,
    ) -> Self {
        Self {
            shift_id: shift_fingerprint(platform, timestamp.timestamp(), METRIC_SENTIMENT_MEAN),
            timestamp,
            platform: platform.to_string(),
            scope: SCOPE_GLOBAL.to_string(),
            metric: METRIC_SENTIMENT_MEAN.to_string(),
            score: (after_mean - before_mean).abs(),
            direction: ShiftDirection::between(before_mean, after_mean),
            window_before,
            window_after,
            explanation: format!("mean {:.2} -> {:.2}", before_mean, after_mean),
        }
    }
}
