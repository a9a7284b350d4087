//! Hourly sentiment series

use crate::db::models::SeriesPoint;
use crate::time::{from_unix, BUCKET_SECONDS};
use crate::Result;
use sqlx::SqlitePool;

/// Mean sentiment and volume per hour for one platform, oldest bucket first
///
/// Covers the full enriched history of the platform. Buckets floor like
/// [`crate::time::hour_bucket`], including before the epoch.
pub async fn query_hourly_series(pool: &SqlitePool, platform: &str) -> Result<Vec<SeriesPoint>> {
    let rows = sqlx::query_as::<_, (i64, f64, i64)>(
        r#"
        SELECT created_at - ((created_at % ?1) + ?1) % ?1 AS bucket,
               AVG(sentiment) AS mean_sentiment,
               COUNT(*) AS volume
        FROM posts_enriched
        WHERE platform = ?2
        GROUP BY bucket
        ORDER BY bucket ASC
        "#,
    )
    .bind(BUCKET_SECONDS)
    .bind(platform)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(bucket, mean_sentiment, count)| SeriesPoint {
            bucket_start: from_unix(bucket),
            mean_sentiment,
            count,
        })
        .collect())
}
