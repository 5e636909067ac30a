//! TCP connection health probing

use async_trait::async_trait;
use tokio::net::TcpStream;
use tracing::debug;

use super::{Probe, ProbeError};
use crate::netinfo;

/// TCP health probe that tests connection establishment
///
/// Connects to the configured host and port; with `use_ssl` it additionally
/// completes a TLS handshake before closing the connection. Certificate
/// validity is not asserted, only the target's ability to speak TLS.
#[derive(Debug, Clone)]
pub struct TcpProbe {
    /// Target host to connect to
    host: String,
    /// Target port to connect to
    port: u16,
    /// Complete a TLS handshake after connecting
    use_ssl: bool,
}

impl TcpProbe {
    /// Create a new TCP probe
    pub fn new(host: impl Into<String>, port: u16, use_ssl: bool) -> Self {
        Self {
            host: host.into(),
            port,
            use_ssl,
        }
    }

    /// Get the target address as a string
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[async_trait]
impl Probe for TcpProbe {
    async fn execute(&self) -> Result<String, ProbeError> {
        let address = netinfo::resolve_addr(&self.host, self.port).await?;
        debug!("TCP probe connecting to {}", address);

        let stream = TcpStream::connect(address).await?;

        if self.use_ssl {
            let connector = native_tls::TlsConnector::builder()
                .danger_accept_invalid_certs(true)
                .danger_accept_invalid_hostnames(true)
                .build()
                .map_err(|e| ProbeError::Tls(e.to_string()))?;
            let connector = tokio_native_tls::TlsConnector::from(connector);
            let _tls = connector
                .connect(&self.host, stream)
                .await
                .map_err(|e| ProbeError::Tls(e.to_string()))?;
            debug!("TLS handshake with {} completed", self.address());
        }

        // Connection is dropped here, closing the socket.
        Ok(String::new())
    }
}
