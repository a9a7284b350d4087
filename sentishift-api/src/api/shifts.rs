//! Recorded regime shifts

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use sentishift_common::db::shifts::list_shifts;
use serde::Serialize;

use super::validate_platform;
use crate::{ApiResult, AppState};

/// One recorded shift
#[derive(Debug, Serialize)]
pub struct ShiftResponse {
    pub shift_id: String,
    pub ts: DateTime<Utc>,
    pub metric: String,
    pub score: f64,
    /// +1 up, -1 down
    pub direction: i64,
    pub window_before: i64,
    pub window_after: i64,
    pub explanation: String,
}

/// GET /shifts/:platform
///
/// Shifts for `platform`, ascending by timestamp.
pub async fn get_shifts(
    State(state): State<AppState>,
    Path(platform): Path<String>,
) -> ApiResult<Json<Vec<ShiftResponse>>> {
    validate_platform(&platform)?;

    let shifts = list_shifts(&state.db, &platform).await?;

    Ok(Json(
        shifts
            .into_iter()
            .map(|s| ShiftResponse {
                shift_id: s.shift_id,
                ts: s.timestamp,
                metric: s.metric,
                score: s.score,
                direction: s.direction.as_i64(),
                window_before: s.window_before,
                window_after: s.window_after,
                explanation: s.explanation,
            })
            .collect(),
    ))
}
