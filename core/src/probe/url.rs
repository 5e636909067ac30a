//! HTTP request health probing

use async_trait::async_trait;
use hyper::{Body, Client, Method, Request, Uri};
use hyper_tls::HttpsConnector;
use regex::Regex;
use tracing::debug;

use super::{Probe, ProbeError};

/// HTTP health probe that makes GET requests and validates responses
///
/// Any transport error or non-2xx status fails the check. The body is read
/// fully, stripped of trailing whitespace, and matched against the pattern
/// from the start of the string.
#[derive(Debug, Clone)]
pub struct UrlProbe {
    /// URL to request
    url: String,
    /// Pattern the trimmed body must match; empty matches anything
    response: Regex,
}

impl UrlProbe {
    /// Create a new URL probe
    ///
    /// `response` must already be compiled with
    /// [`super::compile_response_pattern`].
    pub fn new(url: impl Into<String>, response: Regex) -> Self {
        Self {
            url: url.into(),
            response,
        }
    }

    /// Get the target URL
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Probe for UrlProbe {
    async fn execute(&self) -> Result<String, ProbeError> {
        debug!("HTTP probe requesting {}", self.url);

        let client = Client::builder().build::<_, Body>(HttpsConnector::new());

        let uri: Uri = self
            .url
            .parse()
            .map_err(|e| ProbeError::Failed(format!("invalid url {}: {}", self.url, e)))?;
        let req = Request::builder()
            .method(Method::GET)
            .uri(uri)
            .body(Body::empty())
            .map_err(|e| ProbeError::Failed(e.to_string()))?;

        let response = client
            .request(req)
            .await
            .map_err(|e| ProbeError::Failed(format!("request to {} failed: {}", self.url, e)))?;

        let status = response.status();
        debug!("HTTP probe to {} returned status {}", self.url, status);
        if !status.is_success() {
            return Err(ProbeError::Failed(format!(
                "{} returned HTTP status {}",
                self.url, status
            )));
        }

        let body_bytes = hyper::body::to_bytes(response.into_body())
            .await
            .map_err(|e| ProbeError::Failed(format!("body read from {} failed: {}", self.url, e)))?;
        let body = String::from_utf8_lossy(&body_bytes);
        let body = body.trim_end();

        if !self.response.is_match(body) {
            return Err(ProbeError::Mismatch(format!(
                "unexpected response \"{}\" from {}",
                body, self.url
            )));
        }
        Ok(body.to_string())
    }
}
