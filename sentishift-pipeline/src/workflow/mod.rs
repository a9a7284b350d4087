//! Run orchestration

pub mod lease;
pub mod pipeline;

pub use lease::RunLease;
pub use pipeline::{Pipeline, PipelineConfig, PlatformReport, RunReport, RunStatus};
