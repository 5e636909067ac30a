//! systemd readiness and watchdog integration
//!
//! Notifications are best-effort: without a `NOTIFY_SOCKET` they are
//! no-ops, so running outside systemd costs nothing.

use sd_notify::NotifyState;
use std::time::Duration;
use tracing::{debug, warn};

/// Default watchdog interval when `WATCHDOG_USEC` is unset (3 s)
const DEFAULT_WATCHDOG_USEC: u64 = 3_000_000;

/// The watchdog interval advertised by the supervising init system
pub fn watchdog_interval() -> Duration {
    let usec = std::env::var("WATCHDOG_USEC")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .filter(|usec| *usec > 0)
        .unwrap_or(DEFAULT_WATCHDOG_USEC);
    Duration::from_micros(usec)
}

/// Emit the one-time readiness notification
pub fn notify_ready() {
    if let Err(e) = sd_notify::notify(false, &[NotifyState::Ready]) {
        warn!("readiness notification failed: {}", e);
    }
}

/// Ping the watchdog at half the advertised interval, forever
pub async fn ping_loop() {
    let interval = watchdog_interval() / 2;
    debug!("watchdog ping every {:?}", interval);
    loop {
        tokio::time::sleep(interval).await;
        if let Err(e) = sd_notify::notify(false, &[NotifyState::Watchdog]) {
            warn!("watchdog ping failed: {}", e);
        }
    }
}
