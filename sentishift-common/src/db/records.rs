//! Raw and enriched post persistence

use crate::db::models::{EnrichedRecord, RawRecord};
use crate::time::from_unix;
use crate::Result;
use sqlx::{Row, SqlitePool};

/// Insert raw posts, ignoring ids that already exist
///
/// Returns the number of rows actually inserted.
pub async fn insert_raw(pool: &SqlitePool, records: &[RawRecord]) -> Result<u64> {
    if records.is_empty() {
        return Ok(0);
    }

    let mut tx = pool.begin().await?;
    let mut inserted = 0u64;

    for record in records {
        let meta = serde_json::to_string(&record.meta_json)?;
        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO posts_raw (post_id, platform, author_id, created_at, text, meta_json)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.id)
        .bind(&record.platform)
        .bind(&record.author)
        .bind(record.created_at.timestamp())
        .bind(&record.text)
        .bind(&meta)
        .execute(&mut *tx)
        .await?;
        inserted += result.rows_affected();
    }

    tx.commit().await?;
    Ok(inserted)
}

/// Oldest-first raw posts that have no enriched row (left anti-join on id)
pub async fn fetch_unscored(pool: &SqlitePool, limit: u32) -> Result<Vec<RawRecord>> {
    let rows = sqlx::query(
        r#"
        SELECT pr.post_id, pr.platform, pr.author_id, pr.created_at, pr.text, pr.meta_json
        FROM posts_raw pr
        LEFT JOIN posts_enriched pe ON pr.post_id = pe.post_id
        WHERE pe.post_id IS NULL
        ORDER BY pr.created_at ASC, pr.post_id ASC
        LIMIT ?
        "#,
    )
    .bind(i64::from(limit))
    .fetch_all(pool)
    .await?;

    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        let meta: String = row.try_get("meta_json")?;
        records.push(RawRecord {
            id: row.try_get("post_id")?,
            platform: row.try_get("platform")?,
            author: row.try_get("author_id")?,
            created_at: from_unix(row.try_get("created_at")?),
            text: row.try_get("text")?,
            meta_json: serde_json::from_str(&meta)?,
        });
    }

    Ok(records)
}

/// Insert enriched posts in one transaction, ignoring ids already enriched
///
/// Returns the number of rows actually inserted; the difference from
/// `rows.len()` is rows another run had already written.
pub async fn insert_enriched(pool: &SqlitePool, rows: &[EnrichedRecord]) -> Result<u64> {
    if rows.is_empty() {
        return Ok(0);
    }

    let mut tx = pool.begin().await?;
    let mut inserted = 0u64;

    for row in rows {
        let emotions = serde_json::to_string(&row.emotions)?;
        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO posts_enriched (
                post_id, platform, created_at, lang, sentiment, emotions_json,
                toxicity, sarcasm, topic_id, quality_score
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&row.id)
        .bind(&row.platform)
        .bind(row.created_at.timestamp())
        .bind(&row.language)
        .bind(row.sentiment)
        .bind(&emotions)
        .bind(row.toxicity)
        .bind(row.sarcasm)
        .bind(row.topic_id)
        .bind(row.quality_score)
        .execute(&mut *tx)
        .await?;
        inserted += result.rows_affected();
    }

    tx.commit().await?;
    Ok(inserted)
}

/// Count enriched posts
pub async fn count_enriched(pool: &SqlitePool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts_enriched")
        .fetch_one(pool)
        .await?;
    Ok(count)
}
