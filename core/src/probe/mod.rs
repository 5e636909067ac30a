//! Health probes
//!
//! Each probe is one kind of health check behind the [`Probe`] trait. A
//! probe holds nothing but immutable configuration; every invocation
//! allocates its own sockets and descriptors. Timeouts are enforced by the
//! check runner, which abandons the in-flight execution on expiry.

use async_trait::async_trait;
use regex::Regex;
use std::time::Duration;
use thiserror::Error;

pub mod dns;
pub mod interfaces;
pub mod maintenance;
pub mod routes;
pub mod status_file;
pub mod sysctl;
pub mod tcp;
pub mod udp;
pub mod url;

pub use dns::DnsProbe;
pub use interfaces::InterfacesProbe;
pub use maintenance::MaintenanceProbe;
pub use routes::DefaultRoutesProbe;
pub use status_file::StatusFileProbe;
pub use sysctl::SysctlProbe;
pub use tcp::TcpProbe;
pub use udp::UdpRequestProbe;
pub use url::UrlProbe;

/// Errors a probe can produce
#[derive(Error, Debug)]
pub enum ProbeError {
    /// The probe did not finish within its timeout
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// Socket or filesystem failure
    #[error("{0}")]
    Io(#[from] std::io::Error),

    /// DNS resolution failure
    #[error("dns lookup failed: {0}")]
    Dns(String),

    /// TLS handshake failure
    #[error("tls handshake failed: {0}")]
    Tls(String),

    /// Netlink conversation failure
    #[error("netlink error: {0}")]
    Netlink(String),

    /// A response or value did not match what was expected
    #[error("{0}")]
    Mismatch(String),

    /// Any other check failure
    #[error("{0}")]
    Failed(String),

    /// The probe task panicked; treated like any other failure
    #[error("probe panicked: {0}")]
    Panicked(String),
}

/// One health check
///
/// `Ok` carries the success detail rendered when `status_message` is set
/// (often empty); `Err` carries the cause rendered when `error_message` is
/// set.
#[async_trait]
pub trait Probe: Send + Sync {
    /// Execute the check once
    async fn execute(&self) -> Result<String, ProbeError>;
}

/// Compile a response pattern anchored at the start of input
///
/// Matching is a prefix match: the pattern must match at offset zero but
/// may leave a suffix unconsumed. An empty pattern matches anything.
pub fn compile_response_pattern(pattern: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!(r"\A(?:{})", pattern))
}
