//! Per-check supervision loop
//!
//! One `CheckRunner` owns one probe and publishes its outcomes into the
//! result store on a fixed cadence. The interval is slept *between*
//! cycles, so a slow probe never overlaps itself. Probe failures, timeouts
//! and even panics are contained here: the loop always continues.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::error;

use crate::outcome::Outcome;
use crate::probe::{Probe, ProbeError};
use crate::store::ResultStore;

/// Supervises one probe on a fixed interval
pub struct CheckRunner {
    name: String,
    probe: Arc<dyn Probe>,
    interval: Duration,
    timeout: Duration,
    error_message: bool,
    status_message: bool,
    store: Arc<ResultStore>,
}

impl CheckRunner {
    /// Create a runner for one configured check
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: impl Into<String>,
        probe: Arc<dyn Probe>,
        interval: Duration,
        timeout: Duration,
        error_message: bool,
        status_message: bool,
        store: Arc<ResultStore>,
    ) -> Self {
        Self {
            name: name.into(),
            probe,
            interval,
            timeout,
            error_message,
            status_message,
            store,
        }
    }

    /// The check name this runner publishes under
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run check cycles forever
    ///
    /// Never returns; runners end with process teardown.
    pub async fn run(self) {
        loop {
            let outcome = self.cycle().await;
            self.store.update(&self.name, outcome);
            sleep(self.interval).await;
        }
    }

    /// Execute one probe cycle and translate the result into an outcome
    ///
    /// The probe runs in its own task so that a panic is caught at the
    /// join boundary, and so that an expired timeout can abort the
    /// in-flight work instead of letting it linger.
    async fn cycle(&self) -> Outcome {
        let probe = Arc::clone(&self.probe);
        let mut task = tokio::spawn(async move { probe.execute().await });

        let result = match timeout(self.timeout, &mut task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_error)) => Err(ProbeError::Panicked(join_error.to_string())),
            Err(_elapsed) => {
                task.abort();
                Err(ProbeError::Timeout(self.timeout))
            }
        };

        if let Err(cause) = &result {
            error!(check = %self.name, "check failed: {}", cause);
        }
        Outcome::from_probe(&self.name, result, self.error_message, self.status_message)
    }
}
