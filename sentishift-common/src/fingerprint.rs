//! Deterministic identifiers for persisted shift events
//!
//! A shift is identified by what it describes (platform, bucket, metric), so
//! recording the same detection twice yields the same key.

use sha2::{Digest, Sha256};

/// Field separator (ASCII unit separator) so `("a", "bc")` and `("ab", "c")` differ
const SEPARATOR: &[u8] = b"\x1f";

/// Compute the shift identifier: first 16 bytes of SHA-256, lowercase hex (32 chars)
pub fn shift_fingerprint(platform: &str, bucket_unix_seconds: i64, metric: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(platform.as_bytes());
    hasher.update(SEPARATOR);
    hasher.update(bucket_unix_seconds.to_string().as_bytes());
    hasher.update(SEPARATOR);
    hasher.update(metric.as_bytes());
    let digest = hasher.finalize();

    digest[..16].iter().map(|b| format!("{:02x}", b)).collect()
}
