//! HTTP status server parameters

use serde::Deserialize;
use std::time::Duration;

/// Parameters of an `http_server` thread
///
/// The `error_message` / `status_message` knobs that govern query outcomes
/// live on the surrounding [`crate::ThreadSpec`], like any other thread.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ServerParams {
    /// Address to bind
    #[serde(default = "default_address")]
    pub address: String,

    /// Port to bind
    pub port: u16,

    /// Path served; every other path is a 404
    #[serde(default = "default_location")]
    pub location: String,

    /// Keep connections open and send `Content-Length`; when false every
    /// response carries `Connection: close`
    #[serde(default = "default_keep_alive")]
    pub keep_alive: bool,

    /// Seconds allowed for evaluating an on-demand query check
    #[serde(rename = "query_timeout", default = "default_query_timeout_secs")]
    pub query_timeout_secs: u64,

    /// Seconds a cached query outcome stays fresh
    #[serde(rename = "query_cache_ttl", default = "default_query_cache_ttl_secs")]
    pub query_cache_ttl_secs: u64,

    /// Seconds to wait for the first all-healthy verdict before accepting
    /// connections; 0 starts the listener immediately
    #[serde(rename = "wait_status_timeout", default)]
    pub wait_status_timeout_secs: u64,

    /// Poll cadence of the startup gate in seconds
    #[serde(
        rename = "wait_status_interval",
        default = "default_wait_status_interval_secs"
    )]
    pub wait_status_interval_secs: u64,
}

impl ServerParams {
    /// Get the query evaluation timeout as a Duration
    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_secs)
    }

    /// Get the query cache TTL as a Duration
    pub fn query_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.query_cache_ttl_secs)
    }

    /// Get the startup gate timeout as a Duration
    pub fn wait_status_timeout(&self) -> Duration {
        Duration::from_secs(self.wait_status_timeout_secs)
    }

    /// Get the startup gate poll interval as a Duration
    pub fn wait_status_interval(&self) -> Duration {
        Duration::from_secs(self.wait_status_interval_secs)
    }
}

fn default_address() -> String {
    "0.0.0.0".to_string()
}

fn default_location() -> String {
    "/getstatus".to_string()
}

const fn default_keep_alive() -> bool {
    true
}

const fn default_query_timeout_secs() -> u64 {
    1
}

const fn default_query_cache_ttl_secs() -> u64 {
    1
}

const fn default_wait_status_interval_secs() -> u64 {
    1
}
