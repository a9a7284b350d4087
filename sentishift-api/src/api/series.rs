//! Hourly sentiment series

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use sentishift_common::db::series::query_hourly_series;
use serde::Serialize;

use super::validate_platform;
use crate::{ApiResult, AppState};

/// One hourly bucket
#[derive(Debug, Serialize)]
pub struct SeriesPointResponse {
    pub ts: DateTime<Utc>,
    pub sentiment_mean: f64,
    pub volume: i64,
}

/// GET /series/:platform
///
/// Hourly mean sentiment and post volume, ascending by hour.
pub async fn get_series(
    State(state): State<AppState>,
    Path(platform): Path<String>,
) -> ApiResult<Json<Vec<SeriesPointResponse>>> {
    validate_platform(&platform)?;

    let points = query_hourly_series(&state.db, &platform).await?;

    Ok(Json(
        points
            .into_iter()
            .map(|p| SeriesPointResponse {
                ts: p.bucket_start,
                sentiment_mean: p.mean_sentiment,
                volume: p.count,
            })
            .collect(),
    ))
}
