//! Lookup of the currently published client version.

use crate::error::{ProtocolError, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};

/// Source of the current client version string
#[async_trait]
pub trait VersionProbe: Send + Sync {
    /// # Errors
    /// `ProtocolError::VersionFetch` if the source is unreachable or reports
    /// no version.
    async fn fetch(&self) -> Result<String>;
}

#[derive(Debug, Deserialize)]
struct GameDetail {
    #[serde(default)]
    data: GameDetailData,
}

#[derive(Debug, Default, Deserialize)]
struct GameDetailData {
    #[serde(default)]
    android_version: String,
}

/// Reads `data.android_version` from the game's public detail page
#[derive(Debug, Clone)]
pub struct HttpVersionProbe {
    client: reqwest::Client,
    url: String,
}

impl HttpVersionProbe {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProtocolError::VersionFetch(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl VersionProbe for HttpVersionProbe {
    #[instrument(skip(self), fields(url = %self.url))]
    async fn fetch(&self) -> Result<String> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| ProtocolError::VersionFetch(format!("failed to get app version: {e}")))?;

        ensure_ok(response.status())?;

        let body = response
            .bytes()
            .await
            .map_err(|e| ProtocolError::VersionFetch(format!("failed to read response: {e}")))?;

        let version = parse_android_version(&body)?;
        debug!(version = %version, "Fetched published client version");
        Ok(version)
    }
}

fn ensure_ok(status: StatusCode) -> Result<()> {
    if status != StatusCode::OK {
        return Err(ProtocolError::VersionFetch(format!(
            "unexpected status code: {}",
            status.as_u16()
        )));
    }
    Ok(())
}

fn parse_android_version(body: &[u8]) -> Result<String> {
    let detail: GameDetail = serde_json::from_slice(body)
        .map_err(|e| ProtocolError::VersionFetch(format!("invalid JSON: {e}")))?;

    if detail.data.android_version.is_empty() {
        return Err(ProtocolError::VersionFetch(
            "android_version is empty".to_string(),
        ));
    }
    Ok(detail.data.android_version)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_android_version() {
        let body = br#"{"code":0,"data":{"android_version":"8.2.0","ios_version":"8.2.1"}}"#;
        assert_eq!(parse_android_version(body).unwrap(), "8.2.0");
    }

    #[test]
    fn test_parse_rejects_empty_version() {
        let err = parse_android_version(br#"{"data":{"android_version":""}}"#).unwrap_err();
        assert!(matches!(err, ProtocolError::VersionFetch(_)));

        let err = parse_android_version(br#"{"data":{}}"#).unwrap_err();
        assert!(matches!(err, ProtocolError::VersionFetch(_)));
    }

    #[test]
    fn test_only_200_is_accepted() {
        assert!(ensure_ok(StatusCode::OK).is_ok());
        for status in [StatusCode::NO_CONTENT, StatusCode::ACCEPTED, StatusCode::NOT_FOUND] {
            assert!(matches!(
                ensure_ok(status),
                Err(ProtocolError::VersionFetch(_))
            ));
        }
    }

    #[test]
    fn test_parse_rejects_malformed_json() {
        assert!(matches!(
            parse_android_version(b"<html>"),
            Err(ProtocolError::VersionFetch(_))
        ));
    }
}
