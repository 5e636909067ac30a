//! Default-route health probing over netlink

use async_trait::async_trait;
use futures::TryStreamExt;
use netlink_packet_route::route::{RouteAddress, RouteAttribute};
use rtnetlink::{new_connection, Handle, IpVersion};
use std::net::IpAddr;
use tracing::debug;

use super::{Probe, ProbeError};

/// Probe that expects at least one default route in the kernel table
///
/// Dumps the IPv4 and IPv6 routing tables over netlink and collects the
/// gateways of routes with a zero-length destination prefix. The success
/// detail is the comma-joined gateway list.
#[derive(Debug, Clone, Default)]
pub struct DefaultRoutesProbe;

impl DefaultRoutesProbe {
    /// Create a new default-routes probe
    pub fn new() -> Self {
        Self
    }

    async fn collect_gateways(
        handle: &Handle,
        version: IpVersion,
        gateways: &mut Vec<IpAddr>,
    ) -> Result<(), ProbeError> {
        let mut routes = handle.route().get(version).execute();
        while let Some(message) = routes
            .try_next()
            .await
            .map_err(|e| ProbeError::Netlink(e.to_string()))?
        {
            if message.header.destination_prefix_length != 0 {
                continue;
            }
            for attribute in &message.attributes {
                if let RouteAttribute::Gateway(gateway) = attribute {
                    match gateway {
                        RouteAddress::Inet(addr) => gateways.push(IpAddr::V4(*addr)),
                        RouteAddress::Inet6(addr) => gateways.push(IpAddr::V6(*addr)),
                        _ => {}
                    }
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Probe for DefaultRoutesProbe {
    async fn execute(&self) -> Result<String, ProbeError> {
        let (connection, handle, _) =
            new_connection().map_err(|e| ProbeError::Netlink(e.to_string()))?;
        tokio::spawn(connection);

        let mut gateways = Vec::new();
        Self::collect_gateways(&handle, IpVersion::V4, &mut gateways).await?;
        Self::collect_gateways(&handle, IpVersion::V6, &mut gateways).await?;
        debug!("default route gateways: {:?}", gateways);

        if gateways.is_empty() {
            return Err(ProbeError::Failed("no default route".to_string()));
        }
        let rendered: Vec<String> = gateways.iter().map(|gw| gw.to_string()).collect();
        Ok(rendered.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Route-table contents depend on the host; only exercise the shape of
    // the result here.
    #[tokio::test]
    async fn test_default_routes_probe_runs() {
        let probe = DefaultRoutesProbe::new();
        match probe.execute().await {
            Ok(gateways) => {
                assert!(!gateways.is_empty());
                for gw in gateways.split(',') {
                    gw.parse::<IpAddr>().expect("gateway should be an IP");
                }
            }
            Err(ProbeError::Failed(msg)) => assert_eq!(msg, "no default route"),
            Err(ProbeError::Netlink(_)) => {} // sandboxed environments
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }
}
