//! Network interface health probing

use async_trait::async_trait;

use super::{Probe, ProbeError};
use crate::netinfo;

/// Probe that expects interfaces to exist, be up and running, and carry
/// at least one address
///
/// The error identifies the first interface that fails and why.
#[derive(Debug, Clone)]
pub struct InterfacesProbe {
    interfaces: Vec<String>,
}

impl InterfacesProbe {
    /// Create a new interfaces probe
    pub fn new(interfaces: Vec<String>) -> Self {
        Self { interfaces }
    }
}

#[async_trait]
impl Probe for InterfacesProbe {
    async fn execute(&self) -> Result<String, ProbeError> {
        for name in &self.interfaces {
            let info = netinfo::interface_info(name)?.ok_or_else(|| {
                ProbeError::Failed(format!("interface {} does not exist", name))
            })?;
            if !info.is_up() {
                return Err(ProbeError::Failed(format!("interface {} is not up", name)));
            }
            if !info.is_running() {
                return Err(ProbeError::Failed(format!(
                    "interface {} is not running",
                    name
                )));
            }
            if info.addrs.is_empty() {
                return Err(ProbeError::Failed(format!(
                    "interface {} has no address assigned",
                    name
                )));
            }
        }
        Ok(String::new())
    }
}
