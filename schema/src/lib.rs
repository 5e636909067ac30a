//! Schema definitions for RSCheck
//!
//! This crate contains the serde types for the RSCheck YAML configuration:
//! the logging section, the thread table, and the per-class parameters of
//! every check and server thread. Parsing and validation live in
//! `rscheck-core`; this crate is data only.

use serde::Deserialize;
use std::collections::BTreeMap;

pub mod check;
pub mod logging;
pub mod server;

pub use check::*;
pub use logging::*;
pub use server::*;

/// Top-level structure of an RSCheck configuration file
///
/// ```yaml
/// logging:
///   level: info
/// threads:
///   dns_local:
///     class: dns
///     host: 127.0.0.1
///     qname: localhost.
///   status:
///     class: http_server
///     port: 8048
/// ```
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ConfigFile {
    /// Logging configuration (optional, sane defaults)
    #[serde(default)]
    pub logging: LoggingSpec,

    /// Map of thread name to thread specification
    pub threads: BTreeMap<String, ThreadSpec>,
}
