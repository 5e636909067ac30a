//! Result aggregation façade
//!
//! The aggregator is what the HTTP layer talks to: it owns the result
//! store, the query cache and the process-wide query settings, spawns the
//! check runners at startup, and composes per-request verdicts out of the
//! latest check outcomes plus the memoized query outcome.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::timeout;
use tracing::{error, info};

use crate::cache::QueryCache;
use crate::outcome::{Outcome, Status};
use crate::probe::ProbeError;
use crate::query::{self, QueryArgs};
use crate::runner::CheckRunner;
use crate::store::ResultStore;

/// Query evaluation settings, one set per HTTP server
#[derive(Debug, Clone)]
pub struct QuerySettings {
    /// Maximum duration of one cache-miss evaluation
    pub query_timeout: Duration,
    /// Freshness window of cached query outcomes (process-wide)
    pub query_cache_ttl: Duration,
    /// Include error text in query outcome messages
    pub error_message: bool,
    /// Include success detail in query outcome messages
    pub status_message: bool,
}

impl Default for QuerySettings {
    fn default() -> Self {
        Self {
            query_timeout: Duration::from_secs(1),
            query_cache_ttl: Duration::from_secs(1),
            error_message: true,
            status_message: false,
        }
    }
}

/// Top-level façade over check outcomes and on-demand queries
pub struct Aggregator {
    store: Arc<ResultStore>,
    cache: Arc<QueryCache>,
    settings: QuerySettings,
}

impl Aggregator {
    /// Create an aggregator over a shared store and cache
    pub fn new(store: Arc<ResultStore>, cache: Arc<QueryCache>, settings: QuerySettings) -> Self {
        Self {
            store,
            cache,
            settings,
        }
    }

    /// Spawn one runner task per configured check
    pub fn spawn_runners(&self, runners: Vec<CheckRunner>, tasks: &mut JoinSet<()>) {
        for runner in runners {
            info!(check = %runner.name(), "starting check");
            tasks.spawn(runner.run());
        }
    }

    /// Run the on-demand checks for one request, memoized by query key
    ///
    /// Concurrent misses for the same key may evaluate twice; the last
    /// store wins, which is fine because query evaluation is idempotent.
    pub async fn run_query(&self, query_key: &str, args: &QueryArgs) -> Outcome {
        if let Some(hit) = self.cache.lookup(query_key, self.settings.query_cache_ttl) {
            return hit;
        }

        let result = match timeout(self.settings.query_timeout, query::evaluate(args)).await {
            Ok(result) => result,
            Err(_elapsed) => Err(ProbeError::Timeout(self.settings.query_timeout)),
        };
        if let Err(cause) = &result {
            error!(query = %query_key, "query check failed: {}", cause);
        }
        let outcome = Outcome::from_probe(
            "query",
            result,
            self.settings.error_message,
            self.settings.status_message,
        );
        self.cache.store(query_key, outcome.clone());
        outcome
    }

    /// Compose the aggregate verdict for one request
    ///
    /// OK iff the cached query outcome (when a query key is present) and
    /// every non-excluded check outcome are OK. The message joins the
    /// non-empty messages of the winning side with `"; "`, ordered by check
    /// name with the query message first; with nothing to say it falls
    /// back to `"true"` / `"false"`.
    pub fn snapshot(&self, query_key: &str, exclude: &HashSet<String>) -> (Status, String) {
        let query_outcome = if query_key.is_empty() {
            None
        } else {
            self.cache.lookup(query_key, self.settings.query_cache_ttl)
        };
        let checks = self.store.snapshot(exclude);

        let healthy = query_outcome.as_ref().map_or(true, Outcome::is_ok)
            && checks.values().all(Outcome::is_ok);
        let status = if healthy { Status::Ok } else { Status::Error };

        let mut messages = Vec::new();
        if let Some(outcome) = &query_outcome {
            if outcome.status == status && !outcome.message.is_empty() {
                messages.push(outcome.message.clone());
            }
        }
        // BTreeMap iteration keeps the by-name ordering stable.
        for outcome in checks.values() {
            if outcome.status == status && !outcome.message.is_empty() {
                messages.push(outcome.message.clone());
            }
        }

        let message = if messages.is_empty() {
            if healthy { "true" } else { "false" }.to_string()
        } else {
            messages.join("; ")
        };
        (status, message)
    }

    /// Whether the verdict for this request is OK
    pub fn all_healthy(&self, query_key: &str, exclude: &HashSet<String>) -> bool {
        self.snapshot(query_key, exclude).0 == Status::Ok
    }

    /// The shared result store
    pub fn store(&self) -> &Arc<ResultStore> {
        &self.store
    }

    /// The shared query cache
    pub fn cache(&self) -> &Arc<QueryCache> {
        &self.cache
    }
}
