//! HTTP seam between the pipeline and the network.
//!
//! The pipeline builds a fully resolved [`HttpRequest`] and hands it to an
//! [`HttpTransport`]. [`ReqwestTransport`] is the production implementation;
//! tests substitute scripted backends.

use crate::error::{ProtocolError, Result};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Method;
use std::time::Duration;
use tracing::{instrument, trace};

/// A resolved outgoing call
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    /// Endpoint path relative to the API host
    pub endpoint: String,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpRequest {
    /// Value of the first header called `name` (case-insensitive)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Status and raw body of a reply
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Bytes,
}

/// Something that can carry one HTTP exchange
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse>;
}

/// `reqwest`-backed transport with a fixed per-call timeout
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProtocolError::Transport(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// Wrap an already configured client (proxies, custom TLS, ...)
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    #[instrument(skip(self, request), fields(endpoint = %request.endpoint))]
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let mut builder = self.client.request(request.method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder
            .body(request.body)
            .send()
            .await
            .map_err(|e| ProtocolError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| ProtocolError::Transport(format!("Failed to read body: {e}")))?;

        trace!(status, len = body.len(), "HTTP exchange complete");
        Ok(HttpResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let request = HttpRequest {
            method: Method::POST,
            endpoint: "load/index".into(),
            url: "https://host/load/index".into(),
            headers: vec![("APP-VER".into(), "8.1.0".into())],
            body: Vec::new(),
        };
        assert_eq!(request.header("app-ver"), Some("8.1.0"));
        assert_eq!(request.header("SID"), None);
    }
}
