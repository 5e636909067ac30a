//! On-demand query parsing and evaluation
//!
//! The HTTP layer hands the raw URL query string to [`QueryArgs::parse`];
//! a structurally malformed string is a client error (HTTP 400). A
//! well-formed query with an unrecognized argument name is *semantically*
//! invalid and surfaces as an ERROR query outcome instead, like any other
//! failed check.

use std::collections::HashSet;
use std::net::IpAddr;
use std::path::Path;
use thiserror::Error;

use crate::netinfo;
use crate::probe::{sysctl, ProbeError};

/// The query string was not a sequence of `k=v` pairs
#[derive(Error, Debug, PartialEq, Eq)]
#[error("malformed query string")]
pub struct MalformedQuery;

/// Parsed query arguments, first occurrence per name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryArgs {
    pairs: Vec<(String, String)>,
}

impl QueryArgs {
    /// Parse a raw (undecoded) query string
    ///
    /// Repeated argument names keep their first value only.
    pub fn parse(raw: &str) -> Result<Self, MalformedQuery> {
        let mut pairs: Vec<(String, String)> = Vec::new();
        if raw.is_empty() {
            return Ok(Self { pairs });
        }
        for piece in raw.split('&') {
            let (name, value) = piece.split_once('=').ok_or(MalformedQuery)?;
            if name.is_empty() {
                return Err(MalformedQuery);
            }
            if !pairs.iter().any(|(seen, _)| seen == name) {
                pairs.push((name.to_string(), value.to_string()));
            }
        }
        Ok(Self { pairs })
    }

    /// Whether no arguments were supplied
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// The ordered `(name, value)` pairs
    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(seen, _)| seen == name)
            .map(|(_, value)| value.as_str())
    }

    /// Check names to omit from the verdict
    pub fn exclude(&self) -> HashSet<String> {
        self.get("exclude")
            .map(|value| {
                value
                    .split(',')
                    .filter(|name| !name.is_empty())
                    .map(|name| name.to_string())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The `virtual_if` argument, if present
    pub fn virtual_if(&self) -> Option<&str> {
        self.get("virtual_if")
    }

    /// The `virtual_ip` argument, if present
    pub fn virtual_ip(&self) -> Option<&str> {
        self.get("virtual_ip")
    }
}

/// Evaluate the query checks requested by `args`
///
/// `exclude` and `virtual_ip` are data for other rules and trigger nothing
/// themselves; `virtual_if` runs the virtual-interface check; any other
/// name is an invalid check.
pub async fn evaluate(args: &QueryArgs) -> Result<String, ProbeError> {
    for (name, _value) in args.pairs() {
        match name.as_str() {
            "exclude" | "virtual_ip" => {}
            "virtual_if" => virtual_interface_check(args)?,
            other => {
                return Err(ProbeError::Failed(format!("invalid check \"{}\"", other)));
            }
        }
    }
    if args.virtual_ip().is_some() && args.virtual_if().is_none() {
        return Err(ProbeError::Failed(
            "virtual_ip requires virtual_if".to_string(),
        ));
    }
    Ok(String::new())
}

/// Verify that a virtual interface is live and carries the virtual IPs
///
/// The interface must exist, be up and running, have reverse-path
/// filtering disabled, and every listed IP must be bound to it.
fn virtual_interface_check(args: &QueryArgs) -> Result<(), ProbeError> {
    let ifname = args
        .virtual_if()
        .expect("virtual_interface_check called without virtual_if");
    let ips = args.virtual_ip().ok_or_else(|| {
        ProbeError::Failed("virtual_if requires virtual_ip".to_string())
    })?;

    let info = netinfo::interface_info(ifname)?
        .ok_or_else(|| ProbeError::Failed(format!("interface {} does not exist", ifname)))?;
    if !info.is_up() {
        return Err(ProbeError::Failed(format!("interface {} is not up", ifname)));
    }
    if !info.is_running() {
        return Err(ProbeError::Failed(format!(
            "interface {} is not running",
            ifname
        )));
    }

    // Interface names may contain dots (vlan devices), so build the proc
    // path directly instead of going through dotted-variable conversion.
    let rp_filter = sysctl::read_path(Path::new(&format!(
        "/proc/sys/net/ipv4/conf/{}/rp_filter",
        ifname
    )));
    if rp_filter != "0" {
        return Err(ProbeError::Failed(format!(
            "rp_filter not disabled on {}",
            ifname
        )));
    }

    for ip_text in ips.split(',').filter(|ip| !ip.is_empty()) {
        let ip: IpAddr = ip_text
            .parse()
            .map_err(|_| ProbeError::Failed(format!("invalid virtual_ip \"{}\"", ip_text)))?;
        if !info.addrs.contains(&ip) {
            return Err(ProbeError::Failed(format!(
                "address {} not bound to {}",
                ip, ifname
            )));
        }
    }
    Ok(())
}
