//! RSCheck daemon library
//!
//! Wiring for the `rscheck` binary: bootstrap, the HTTP status endpoint,
//! and systemd integration. The check engine itself lives in
//! `rscheck-core`.

use thiserror::Error;

pub mod bootstrap;
pub mod server;
pub mod watchdog;

/// Daemon-specific error types
#[derive(Error, Debug)]
pub enum DaemonError {
    #[error(transparent)]
    Core(#[from] rscheck_core::CoreError),

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Supervised task terminated: {0}")]
    TaskDied(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Daemon-specific result type
pub type Result<T> = std::result::Result<T, DaemonError>;
