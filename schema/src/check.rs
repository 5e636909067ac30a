//! Thread specifications: the common check knobs plus per-class parameters
//!
//! Every entry under `threads:` selects its behavior with a `class` key.
//! Check classes share four knobs (`interval`, `timeout`, `error_message`,
//! `status_message`); the remaining keys are class parameters. The
//! `http_server` class reuses the same table shape but carries the server
//! parameters from [`crate::server`].

use crate::server::ServerParams;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// One entry of the `threads` table
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ThreadSpec {
    /// Class-specific parameters, selected by the `class` key
    #[serde(flatten)]
    pub class: ThreadClass,

    /// Seconds slept between check cycles (checks only)
    #[serde(rename = "interval", default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Per-cycle probe timeout in seconds (checks only)
    #[serde(rename = "timeout", default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Include the error text in the outcome message on failure
    #[serde(default = "default_true")]
    pub error_message: bool,

    /// Include the probe's success detail in the outcome message
    #[serde(default)]
    pub status_message: bool,
}

impl ThreadSpec {
    /// Get the cycle interval as a Duration
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Get the probe timeout as a Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Whether this thread is an HTTP status server rather than a check
    pub fn is_server(&self) -> bool {
        matches!(self.class, ThreadClass::HttpServer(_))
    }
}

/// Class-specific parameters for one thread
///
/// Unknown `class` values fail deserialization, which makes them a startup
/// failure before any check runs.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "class", rename_all = "snake_case")]
pub enum ThreadClass {
    /// Query a DNS resolver and expect an answer
    Dns {
        /// Nameserver host (IP literal or resolvable name)
        host: String,
        /// Nameserver port
        #[serde(default = "default_dns_port")]
        port: u16,
        /// Use TCP transport instead of UDP
        #[serde(default)]
        tcp: bool,
        /// Name to query
        qname: String,
        /// Record type to query (e.g. A, AAAA, MX)
        #[serde(default = "default_qtype")]
        qtype: String,
    },

    /// Expect at least one default route in the kernel routing table
    DefaultRoutes,

    /// Expect the listed interfaces to be up, running, and addressed
    Interfaces {
        /// Interface names to verify
        interfaces: Vec<String>,
    },

    /// TCP connect (optionally with a TLS handshake)
    Tcp {
        /// Target host
        host: String,
        /// Target port
        port: u16,
        /// Complete a TLS handshake after connecting
        #[serde(default)]
        use_ssl: bool,
    },

    /// Send a UDP datagram and match the response against a pattern
    UdpRequest {
        /// Target host
        host: String,
        /// Target port
        port: u16,
        /// Payload to send
        request: String,
        /// Pattern the (trimmed) response must match from its start
        response: String,
        /// Maximum number of response bytes to read
        #[serde(default = "default_max_response_size")]
        max_response_size: usize,
    },

    /// HTTP GET a URL and match the body against a pattern
    Url {
        /// URL to fetch
        url: String,
        /// Pattern the (trimmed) body must match from its start; empty
        /// matches anything
        #[serde(default)]
        response: String,
    },

    /// Compare `/proc/sys` values against expected settings
    Sysctl {
        /// Map of sysctl variable (dotted form) to expected value
        variables: BTreeMap<String, SysctlValue>,
    },

    /// Inspect an externally maintained status file
    StatusFile {
        /// Path of the status file
        status_file: PathBuf,
        /// Maximum age of the file in seconds; 0 disables the check
        #[serde(default)]
        status_file_ttl: u64,
        /// Fail when any line contains this string (empty disables)
        #[serde(default)]
        error_string: String,
        /// Require some line to contain this string (empty disables)
        #[serde(default)]
        success_string: String,
    },

    /// Sweep expired entries out of the query cache
    Maintenance,

    /// HTTP status endpoint
    HttpServer(ServerParams),
}

/// Expected value of a sysctl variable
///
/// Sysctl comparison is textual, so scalars of any YAML type are accepted
/// and rendered to the string that `/proc/sys` would produce.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum SysctlValue {
    /// Integer setting, e.g. `vm.swappiness: 0`
    Int(i64),
    /// Boolean setting, rendered as `1`/`0`
    Bool(bool),
    /// Anything else, compared verbatim
    Str(String),
}

impl fmt::Display for SysctlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SysctlValue::Int(v) => write!(f, "{}", v),
            SysctlValue::Bool(v) => write!(f, "{}", if *v { 1 } else { 0 }),
            SysctlValue::Str(v) => f.write_str(v),
        }
    }
}

const fn default_interval_secs() -> u64 {
    3
}

const fn default_timeout_secs() -> u64 {
    1
}

const fn default_true() -> bool {
    true
}

const fn default_dns_port() -> u16 {
    53
}

fn default_qtype() -> String {
    "A".to_string()
}

const fn default_max_response_size() -> usize {
    1024
}
