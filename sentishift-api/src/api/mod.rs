//! HTTP API handlers for sentishift-api

pub mod health;
pub mod series;
pub mod shifts;

pub use health::health_routes;
pub use series::get_series;
pub use shifts::get_shifts;

use crate::ApiError;

/// Platform path segments are `[A-Za-z0-9_-]{1,32}`
pub fn validate_platform(platform: &str) -> Result<(), ApiError> {
    let valid = !platform.is_empty()
        && platform.len() <= 32
        && platform
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');

    if valid {
        Ok(())
    } else {
        Err(ApiError::BadRequest(format!("Invalid platform: {}", platform)))
    }
}
