//! UDP request/response health probing

use async_trait::async_trait;
use regex::Regex;
use tokio::net::UdpSocket;
use tracing::debug;

use super::{Probe, ProbeError};
use crate::netinfo;

/// UDP health probe that sends a request and pattern-matches the response
///
/// The socket is connected so that ICMP port-unreachable surfaces as an
/// error instead of a hang. The response is read once, truncated to
/// `max_response_size`, stripped of trailing whitespace, and matched
/// against the pattern from the start of the string.
#[derive(Debug, Clone)]
pub struct UdpRequestProbe {
    host: String,
    port: u16,
    request: String,
    response: Regex,
    max_response_size: usize,
}

impl UdpRequestProbe {
    /// Create a new UDP request probe
    ///
    /// `response` must already be compiled with
    /// [`super::compile_response_pattern`].
    pub fn new(
        host: impl Into<String>,
        port: u16,
        request: impl Into<String>,
        response: Regex,
        max_response_size: usize,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            request: request.into(),
            response,
            max_response_size,
        }
    }
}

#[async_trait]
impl Probe for UdpRequestProbe {
    async fn execute(&self) -> Result<String, ProbeError> {
        let address = netinfo::resolve_addr(&self.host, self.port).await?;
        let bind_addr = if address.is_ipv4() { "0.0.0.0:0" } else { "[::]:0" };
        let socket = UdpSocket::bind(bind_addr).await?;
        socket.connect(address).await?;
        debug!("UDP probe sending {} bytes to {}", self.request.len(), address);

        socket.send(self.request.as_bytes()).await?;

        let mut buf = vec![0u8; self.max_response_size];
        let n = socket.recv(&mut buf).await?;
        let body = String::from_utf8_lossy(&buf[..n]);
        let body = body.trim_end();

        if !self.response.is_match(body) {
            return Err(ProbeError::Mismatch(format!(
                "unexpected response \"{}\" from {}",
                body, address
            )));
        }
        Ok(body.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::compile_response_pattern;
    use tokio::task;

    /// Echo server that answers every datagram with a fixed payload.
    async fn start_udp_responder(reply: &'static [u8]) -> std::net::SocketAddr {
        let socket = UdpSocket::bind("127.0.0.1:0").await.expect("bind");
        let addr = socket.local_addr().expect("local addr");
        task::spawn(async move {
            let mut buf = [0u8; 512];
            while let Ok((_n, peer)) = socket.recv_from(&mut buf).await {
                let _ = socket.send_to(reply, peer).await;
            }
        });
        addr
    }

    #[tokio::test]
    async fn test_udp_probe_matching_response() {
        let addr = start_udp_responder(b"pong extra\n").await;
        let probe = UdpRequestProbe::new(
            "127.0.0.1",
            addr.port(),
            "ping",
            compile_response_pattern("pong").unwrap(),
            512,
        );
        let result = probe.execute().await.expect("should match");
        assert_eq!(result, "pong extra");
    }

    #[tokio::test]
    async fn test_udp_probe_mismatched_response() {
        let addr = start_udp_responder(b"nope\n").await;
        let probe = UdpRequestProbe::new(
            "127.0.0.1",
            addr.port(),
            "ping",
            compile_response_pattern("pong").unwrap(),
            512,
        );
        match probe.execute().await.unwrap_err() {
            ProbeError::Mismatch(msg) => assert!(msg.contains("nope")),
            other => panic!("Expected ProbeError::Mismatch, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_udp_probe_response_truncated_to_max_size() {
        let addr = start_udp_responder(b"pong and then some").await;
        let probe = UdpRequestProbe::new(
            "127.0.0.1",
            addr.port(),
            "ping",
            compile_response_pattern("pong").unwrap(),
            4,
        );
        let result = probe.execute().await.expect("should match");
        assert_eq!(result, "pong");
    }

    #[tokio::test]
    async fn test_udp_probe_anchoring_rejects_midstring_match() {
        let addr = start_udp_responder(b"false true").await;
        let probe = UdpRequestProbe::new(
            "127.0.0.1",
            addr.port(),
            "ping",
            compile_response_pattern("true").unwrap(),
            512,
        );
        assert!(probe.execute().await.is_err());
    }
}
