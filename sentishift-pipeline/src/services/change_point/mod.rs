//! Change-point detection over the hourly sentiment series
//!
//! PELT segmentation with an RBF kernel cost. Output indices are the starts of
//! every segment after the first: `cp` means the regime changes between
//! `s[cp - 1]` and `s[cp]`. The terminal boundary `n` is never reported.

pub mod pelt;
pub mod rbf_cost;

use pelt::PeltParams;
use rbf_cost::RbfCost;
use sentishift_common::config::DetectionConfig;
use sentishift_common::{Error, Result};

/// Penalized kernel change-point detector
#[derive(Debug, Clone, PartialEq)]
pub struct ChangePointDetector {
    /// Cost added per segment; higher means fewer change points
    pub penalty: f64,
    /// Series shorter than this yield no change points
    pub min_points: usize,
    pub min_segment_size: usize,
    pub jump: usize,
}

impl Default for ChangePointDetector {
    fn default() -> Self {
        Self::from_config(&DetectionConfig::default(), "")
    }
}

impl ChangePointDetector {
    pub fn new(penalty: f64) -> Self {
        Self {
            penalty,
            ..Self::default()
        }
    }

    /// Detector for `platform`, honoring per-platform penalty overrides
    pub fn from_config(config: &DetectionConfig, platform: &str) -> Self {
        Self {
            penalty: config.penalty_for(platform),
            min_points: config.min_points,
            min_segment_size: config.min_segment_size,
            jump: config.jump,
        }
    }

    /// Ascending change-point indices into `signal`
    ///
    /// Empty when `signal` is shorter than `min_points`. Non-finite values
    /// are rejected.
    pub fn detect(&self, signal: &[f64]) -> Result<Vec<usize>> {
        if signal.len() < self.min_points {
            tracing::debug!(
                points = signal.len(),
                min_points = self.min_points,
                "Series too short, skipping detection"
            );
            return Ok(Vec::new());
        }

        if let Some((index, value)) = signal.iter().enumerate().find(|(_, v)| !v.is_finite()) {
            return Err(Error::InvalidInput(format!(
                "non-finite value {} at index {}",
                value, index
            )));
        }

        if !(self.penalty.is_finite() && self.penalty > 0.0) {
            return Err(Error::InvalidInput(format!(
                "penalty must be positive, got {}",
                self.penalty
            )));
        }

        let cost = RbfCost::new(signal);
        let mut boundaries = pelt::segment(
            &cost,
            PeltParams {
                penalty: self.penalty,
                min_size: self.min_segment_size,
                jump: self.jump,
            },
        );

        // Strip the terminal boundary
        if boundaries.last() == Some(&signal.len()) {
            boundaries.pop();
        }

        tracing::debug!(
            points = signal.len(),
            gamma = cost.gamma(),
            penalty = self.penalty,
            change_points = boundaries.len(),
            "Segmentation complete"
        );

        Ok(boundaries)
    }
}
