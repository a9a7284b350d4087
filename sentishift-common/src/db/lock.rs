//! Run-level lease lock
//!
//! A lock row names its owner and an expiry. A live lock held by another owner
//! blocks acquisition; an expired one is taken over, so a crashed run cannot
//! wedge the scheduler for longer than one TTL.

use crate::Result;
use sqlx::SqlitePool;

/// Try to take (or renew) the named lock for `owner`
///
/// Returns `true` when `owner` now holds the lock.
pub async fn try_acquire(
    pool: &SqlitePool,
    name: &str,
    owner: &str,
    now_unix: i64,
    ttl_secs: i64,
) -> Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO pipeline_lock (name, owner, acquired_at, expires_at)
        VALUES (?, ?, ?, ?)
        ON CONFLICT(name) DO UPDATE SET
            owner = excluded.owner,
            acquired_at = excluded.acquired_at,
            expires_at = excluded.expires_at
        WHERE pipeline_lock.expires_at <= excluded.acquired_at
           OR pipeline_lock.owner = excluded.owner
        "#,
    )
    .bind(name)
    .bind(owner)
    .bind(now_unix)
    .bind(now_unix + ttl_secs)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Release the named lock if `owner` still holds it
pub async fn release(pool: &SqlitePool, name: &str, owner: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM pipeline_lock WHERE name = ? AND owner = ?")
        .bind(name)
        .bind(owner)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
