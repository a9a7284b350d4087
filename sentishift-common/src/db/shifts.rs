//! Shift event persistence

use crate::db::models::{ShiftDirection, ShiftEvent};
use crate::time::from_unix;
use crate::{Error, Result};
use sqlx::{Row, SqlitePool};

/// Insert a shift unless one with the same id or (platform, ts, metric) exists
///
/// Returns `true` when a new row was written.
pub async fn insert_shift(pool: &SqlitePool, event: &ShiftEvent) -> Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT OR IGNORE INTO shifts (
            shift_id, ts, platform, scope, metric, score, direction,
            window_before, window_after, explanation
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&event.shift_id)
    .bind(event.timestamp.timestamp())
    .bind(&event.platform)
    .bind(&event.scope)
    .bind(&event.metric)
    .bind(event.score)
    .bind(event.direction.as_i64())
    .bind(event.window_before)
    .bind(event.window_after)
    .bind(&event.explanation)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// All shifts for a platform, ordered by timestamp
pub async fn list_shifts(pool: &SqlitePool, platform: &str) -> Result<Vec<ShiftEvent>> {
    let rows = sqlx::query(
        r#"
        SELECT shift_id, ts, platform, scope, metric, score, direction,
               window_before, window_after, explanation
        FROM shifts
        WHERE platform = ?
        ORDER BY ts ASC, metric ASC
        "#,
    )
    .bind(platform)
    .fetch_all(pool)
    .await?;

    let mut shifts = Vec::with_capacity(rows.len());
    for row in rows {
        let direction: i64 = row.try_get("direction")?;
        shifts.push(ShiftEvent {
            shift_id: row.try_get("shift_id")?,
            timestamp: from_unix(row.try_get("ts")?),
            platform: row.try_get("platform")?,
            scope: row.try_get("scope")?,
            metric: row.try_get("metric")?,
            score: row.try_get("score")?,
            direction: ShiftDirection::try_from(direction).map_err(Error::Internal)?,
            window_before: row.try_get("window_before")?,
            window_after: row.try_get("window_after")?,
            explanation: row.try_get("explanation")?,
        });
    }

    Ok(shifts)
}
