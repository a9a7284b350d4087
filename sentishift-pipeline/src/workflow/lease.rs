//! Run lock lease renewal
//!
//! The run lock expires `ttl_secs` after it was last written. A run that
//! outlives one TTL extends it from inside its long phases, at most once per
//! half TTL, so an overlapping run cannot take the lock over mid-run.

use crate::store::SentimentStore;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Holder side of the run lock for one run
pub struct RunLease {
    store: Arc<dyn SentimentStore>,
    owner: String,
    ttl_secs: i64,
    started: Instant,
    /// Milliseconds after `started` of the last successful write
    renewed_ms: AtomicU64,
    lost: AtomicBool,
}

impl RunLease {
    /// Lease for `owner`, which must already hold the lock
    pub fn new(store: Arc<dyn SentimentStore>, owner: impl Into<String>, ttl_secs: i64) -> Self {
        Self {
            store,
            owner: owner.into(),
            ttl_secs,
            started: Instant::now(),
            renewed_ms: AtomicU64::new(0),
            lost: AtomicBool::new(false),
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Another run took the lock over after it expired
    pub fn is_lost(&self) -> bool {
        self.lost.load(Ordering::SeqCst)
    }

    fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    /// Extend the lease once half its lifetime has passed
    ///
    /// Renewal failures are logged, never returned; the run continues and the
    /// stored rows stay correct either way.
    pub async fn keep_alive(&self) {
        let half_ttl = Duration::from_secs(self.ttl_secs.max(0) as u64) / 2;
        let now_ms = self.elapsed_ms();
        let since_renewal = now_ms.saturating_sub(self.renewed_ms.load(Ordering::SeqCst));
        if Duration::from_millis(since_renewal) < half_ttl {
            return;
        }

        match self.store.try_acquire_run_lock(&self.owner, self.ttl_secs).await {
            Ok(true) => {
                self.renewed_ms.store(now_ms, Ordering::SeqCst);
                debug!(owner = %self.owner, ttl_secs = self.ttl_secs, "Run lock renewed");
            }
            Ok(false) => {
                if !self.lost.swap(true, Ordering::SeqCst) {
                    warn!(owner = %self.owner, "Run lock was taken over by another run");
                }
            }
            Err(e) => warn!(owner = %self.owner, error = %e, "Failed to renew run lock"),
        }
    }
}
