//! DNS resolution health probing

use async_trait::async_trait;
use hickory_proto::rr::RecordType;
use hickory_proto::xfer::Protocol;
use hickory_resolver::config::{NameServerConfig, ResolverConfig};
use hickory_resolver::name_server::TokioConnectionProvider;
use hickory_resolver::Resolver;
use tracing::debug;

use super::{Probe, ProbeError};
use crate::netinfo;

/// DNS health probe that queries one nameserver directly
///
/// Queries `(qname, qtype)` against the configured server over UDP, or TCP
/// when `tcp` is set. Any resolver error, including NXDOMAIN, fails the
/// check. The success detail is the comma-joined answer record set.
#[derive(Debug, Clone)]
pub struct DnsProbe {
    host: String,
    port: u16,
    tcp: bool,
    qname: String,
    qtype: RecordType,
}

impl DnsProbe {
    /// Create a new DNS probe
    pub fn new(
        host: impl Into<String>,
        port: u16,
        tcp: bool,
        qname: impl Into<String>,
        qtype: RecordType,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            tcp,
            qname: qname.into(),
            qtype,
        }
    }
}

#[async_trait]
impl Probe for DnsProbe {
    async fn execute(&self) -> Result<String, ProbeError> {
        let address = netinfo::resolve_addr(&self.host, self.port).await?;
        let protocol = if self.tcp { Protocol::Tcp } else { Protocol::Udp };
        debug!(
            "DNS probe querying {} {:?} against {} over {:?}",
            self.qname, self.qtype, address, protocol
        );

        let name_server = NameServerConfig::new(address, protocol);
        let config = ResolverConfig::from_parts(None, vec![], vec![name_server]);
        let resolver =
            Resolver::builder_with_config(config, TokioConnectionProvider::default()).build();

        let lookup = resolver
            .lookup(self.qname.clone(), self.qtype)
            .await
            .map_err(|e| ProbeError::Dns(e.to_string()))?;

        let answers: Vec<String> = lookup.iter().map(|rdata| rdata.to_string()).collect();
        Ok(answers.join(","))
    }
}
