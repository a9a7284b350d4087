//! Timestamp utilities
//!
//! Records are stored with `created_at` as unix seconds (UTC). Series buckets
//! are hour-aligned unix seconds.

use chrono::{DateTime, TimeZone, Utc};

/// Seconds per hourly bucket
pub const BUCKET_SECONDS: i64 = 3600;

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Start of the hour containing `unix_seconds`
///
/// Floors toward negative infinity so pre-1970 timestamps bucket correctly.
pub fn hour_bucket(unix_seconds: i64) -> i64 {
    unix_seconds.div_euclid(BUCKET_SECONDS) * BUCKET_SECONDS
}

/// Convert stored unix seconds to a UTC timestamp
///
/// Out-of-range values clamp to the unix epoch.
pub fn from_unix(unix_seconds: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(unix_seconds, 0)
        .single()
        .unwrap_or_default()
}
