//! Pipeline stages
//!
//! UnscoredSelector → EnrichmentCoordinator → SeriesAggregator →
//! ChangePointDetector → ShiftRecorder

pub mod change_point;
pub mod enrichment_coordinator;
pub mod series_aggregator;
pub mod shift_recorder;
pub mod unscored_selector;

pub use change_point::ChangePointDetector;
pub use enrichment_coordinator::{EnrichmentCoordinator, EnrichmentFailure, EnrichmentReport};
pub use series_aggregator::SeriesAggregator;
pub use shift_recorder::{RecordReport, ShiftRecorder};
pub use unscored_selector::UnscoredSelector;
