//! # SentiShift Common Library
//!
//! Shared code for the SentiShift services including:
//! - Record and shift models
//! - Database schema initialization
//! - Configuration loading
//! - Hour bucketing and fingerprint helpers

pub mod config;
pub mod db;
pub mod error;
pub mod fingerprint;
pub mod time;

pub use error::{Error, Result};
