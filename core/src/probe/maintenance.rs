//! Query cache maintenance sweeping

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::{Probe, ProbeError};
use crate::cache::QueryCache;

/// Probe that sweeps expired entries out of the query cache
///
/// Scheduled like any other check so that its liveness shows up in the
/// result store; it never fails. Cache growth stays bounded even if the
/// sweeper stalls, because expiry is also enforced on every lookup.
pub struct MaintenanceProbe {
    cache: Arc<QueryCache>,
    ttl: Duration,
}

impl MaintenanceProbe {
    /// Create a new maintenance probe sweeping with the process-wide TTL
    pub fn new(cache: Arc<QueryCache>, ttl: Duration) -> Self {
        Self { cache, ttl }
    }
}

#[async_trait]
impl Probe for MaintenanceProbe {
    async fn execute(&self) -> Result<String, ProbeError> {
        let removed = self.cache.sweep(self.ttl);
        if removed > 0 {
            debug!("maintenance sweep removed {} cached query outcomes", removed);
        }
        Ok(String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::Outcome;
    use std::time::Instant;

    #[tokio::test]
    async fn test_sweep_removes_expired_entries_and_never_fails() {
        let cache = Arc::new(QueryCache::new());
        cache.store("fresh", Outcome::ok(""));
        let mut stale = Outcome::ok("");
        stale.timestamp = Instant::now()
            .checked_sub(Duration::from_secs(30))
            .expect("in range");
        cache.store("stale", stale);

        let probe = MaintenanceProbe::new(Arc::clone(&cache), Duration::from_secs(5));
        assert!(probe.execute().await.is_ok());
        assert_eq!(cache.len(), 1);

        // Idempotent on an already-clean cache.
        assert!(probe.execute().await.is_ok());
        assert_eq!(cache.len(), 1);
    }
}
