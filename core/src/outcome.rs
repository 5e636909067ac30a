//! Check outcomes
//!
//! An [`Outcome`] is the immutable result of one check cycle or one query
//! evaluation: a status, a message destined for the HTTP response body, and
//! the instant it was produced. The timestamp doubles as the expiry anchor
//! for cached query outcomes.

use crate::probe::ProbeError;
use std::time::Instant;

/// Verdict of a single check cycle or query evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// The check passed
    Ok,
    /// The check failed
    Error,
}

/// The result of one check cycle, immutable once constructed
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    /// Whether the check passed
    pub status: Status,
    /// Text rendered into the HTTP response body (possibly empty)
    pub message: String,
    /// When this outcome was produced
    pub timestamp: Instant,
}

impl Outcome {
    /// A passing outcome with the given message
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            status: Status::Ok,
            message: message.into(),
            timestamp: Instant::now(),
        }
    }

    /// A failing outcome with the given message
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: Status::Error,
            message: message.into(),
            timestamp: Instant::now(),
        }
    }

    /// The sentinel outcome a check holds before its first cycle completes
    ///
    /// Counts as healthy so that freshly started daemons do not flap; the
    /// startup gate is the mechanism for delaying exposure instead.
    pub fn initial() -> Self {
        Self::ok("")
    }

    /// Whether the check passed
    pub fn is_ok(&self) -> bool {
        self.status == Status::Ok
    }

    /// Translate a probe result into an outcome per the runner rules
    ///
    /// Success keeps the probe's detail only when `status_message` is set;
    /// failure renders `"<name> error: <cause>"` only when `error_message`
    /// is set.
    pub fn from_probe(
        name: &str,
        result: std::result::Result<String, ProbeError>,
        error_message: bool,
        status_message: bool,
    ) -> Self {
        match result {
            Ok(detail) => {
                if status_message {
                    Self::ok(detail)
                } else {
                    Self::ok("")
                }
            }
            Err(cause) => {
                if error_message {
                    Self::error(format!("{} error: {}", name, cause))
                } else {
                    Self::error("")
                }
            }
        }
    }
}
