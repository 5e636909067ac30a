//! Daemon bootstrap: wire the aggregator, check runners, status servers,
//! and systemd integration
//!
//! Startup order matters: runners first so outcomes begin accumulating,
//! then the per-server startup gate, then the listeners, and only then the
//! readiness notification. The death of any supervised task is fatal; the
//! init system owns restarts.

use rscheck_core::{config, Aggregator, QueryCache, QuerySettings, ResultStore};
use schema::{ConfigFile, ServerParams, ThreadSpec};
use std::collections::HashSet;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::{sleep, Instant};
use tracing::{info, warn};

use crate::server::{self, ServerContext};
use crate::watchdog;
use crate::{DaemonError, Result};

/// Run the daemon until a signal arrives or a supervised task dies
pub async fn run(cfg: ConfigFile) -> Result<()> {
    let servers = config::server_threads(&cfg);
    if servers.is_empty() {
        warn!("no http_server thread configured; checks will run unobserved");
    }
    let query_cache_ttl = process_query_cache_ttl(&servers);

    let store = Arc::new(ResultStore::new(config::check_names(&cfg)));
    let cache = Arc::new(QueryCache::new());
    let runners = config::build_runners(&cfg, &store, &cache, query_cache_ttl)?;

    let mut tasks: JoinSet<()> = JoinSet::new();

    // The primary aggregator supervises the runners and answers the
    // startup gate; per-server aggregators share its store and cache.
    let primary = Aggregator::new(
        Arc::clone(&store),
        Arc::clone(&cache),
        QuerySettings {
            query_cache_ttl,
            ..QuerySettings::default()
        },
    );
    primary.spawn_runners(runners, &mut tasks);

    for &(name, spec, params) in &servers {
        wait_for_first_healthy(&primary, params).await;

        let aggregator = Arc::new(Aggregator::new(
            Arc::clone(&store),
            Arc::clone(&cache),
            QuerySettings {
                query_timeout: params.query_timeout(),
                query_cache_ttl,
                error_message: spec.error_message,
                status_message: spec.status_message,
            },
        ));
        let ctx = Arc::new(ServerContext {
            aggregator,
            location: params.location.clone(),
            keep_alive: params.keep_alive,
        });
        let addr = bind_addr(name, params)?;
        let serving = server::serve(ctx, addr)?;
        let name = name.to_string();
        tasks.spawn(async move {
            if let Err(e) = serving.await {
                warn!(server = %name, "status server terminated: {}", e);
            }
        });
    }

    watchdog::notify_ready();
    tasks.spawn(watchdog::ping_loop());

    supervise(tasks).await
}

/// Wait for signals or the first task death
async fn supervise(mut tasks: JoinSet<()>) -> Result<()> {
    let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("interrupt received, shutting down");
            Ok(())
        }
        _ = sigterm.recv() => {
            info!("termination requested, shutting down");
            Ok(())
        }
        joined = tasks.join_next() => {
            let detail = match joined {
                Some(Err(join_error)) => join_error.to_string(),
                Some(Ok(())) => "task exited unexpectedly".to_string(),
                None => "no supervised tasks".to_string(),
            };
            Err(DaemonError::TaskDied(detail))
        }
    }
}

/// The process-wide query cache TTL, owned by the aggregator
///
/// Taken from the first server thread; disagreements between servers are
/// flagged but not fatal.
fn process_query_cache_ttl(servers: &[(&String, &ThreadSpec, &ServerParams)]) -> Duration {
    let ttl = servers
        .first()
        .map(|(_, _, params)| params.query_cache_ttl())
        .unwrap_or(Duration::from_secs(1));
    for (name, _, params) in servers.iter().skip(1) {
        if params.query_cache_ttl() != ttl {
            warn!(
                server = %name,
                "query_cache_ttl {:?} ignored; the process-wide value is {:?}",
                params.query_cache_ttl(),
                ttl
            );
        }
    }
    ttl
}

/// Block until the first all-healthy verdict or the configured timeout
async fn wait_for_first_healthy(aggregator: &Aggregator, params: &ServerParams) {
    let timeout = params.wait_status_timeout();
    if timeout.is_zero() {
        return;
    }
    let deadline = Instant::now() + timeout;
    let empty = HashSet::new();
    info!("waiting up to {:?} for a healthy verdict before accepting", timeout);
    while Instant::now() < deadline {
        if aggregator.all_healthy("", &empty) {
            return;
        }
        sleep(params.wait_status_interval()).await;
    }
    warn!("startup gate timed out after {:?}; accepting anyway", timeout);
}

fn bind_addr(name: &str, params: &ServerParams) -> Result<SocketAddr> {
    let ip: IpAddr = params.address.parse().map_err(|_| {
        DaemonError::Core(rscheck_core::CoreError::ConfigurationError(format!(
            "threads.{}.address: invalid address '{}'",
            name, params.address
        )))
    })?;
    Ok(SocketAddr::new(ip, params.port))
}
