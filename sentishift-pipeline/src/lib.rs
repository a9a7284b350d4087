//! sentishift-pipeline library interface
//!
//! Incremental enrichment and change-point detection over per-platform hourly
//! sentiment. The binary wires a `SqliteStore` and an `HttpScorer` into a
//! `Pipeline`; tests substitute their own store or scorer.

pub mod error;
pub mod scoring;
pub mod services;
pub mod store;
pub mod utils;
pub mod workflow;

pub use crate::error::{PipelineError, PipelineResult};
pub use crate::workflow::{Pipeline, PipelineConfig, RunReport, RunStatus};
