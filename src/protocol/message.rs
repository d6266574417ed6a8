//! Request and response capabilities shared by every API endpoint.
//!
//! Each endpoint is its own concrete record type with static serde rules;
//! the engine only relies on the two traits below.

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

/// Business result code of a successful call
pub const RESULT_OK: i32 = 1;

/// Business result code asking the client to log in again
pub const RESULT_SESSION_INVALID: i32 = 3;

/// Business result code reporting an outdated client version
pub const RESULT_VERSION_OUTDATED: i32 = 204;

/// An API call the engine can submit
pub trait ApiRequest: Serialize + Send + Sync {
    /// Whether the body travels as an encrypted MessagePack envelope
    fn needs_encryption(&self) -> bool {
        true
    }

    fn method(&self) -> Method {
        Method::POST
    }

    /// Path relative to the API host, e.g. `check/game_start`
    fn endpoint(&self) -> &'static str;

    /// Store the (possibly encrypted) viewer id in the request body
    fn set_viewer_id(&mut self, viewer_id: String);
}

/// A decoded API reply
pub trait ApiResponse: DeserializeOwned + Send {
    fn request_id(&self) -> &str;

    /// Raw rolling session token; hashed before it is sent back as `SID`
    fn session_token(&self) -> &str;

    fn result_code(&self) -> i32;

    fn viewer_id(&self) -> u64;
}

/// Bookkeeping block the server attaches to every reply
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataHeaders {
    #[serde(default, deserialize_with = "nullable")]
    pub sid: String,
    #[serde(default, deserialize_with = "nullable")]
    pub viewer_id: u64,
    #[serde(default, deserialize_with = "nullable")]
    pub request_id: String,
    #[serde(default, deserialize_with = "nullable")]
    pub result_code: i32,
}

/// Standard reply shape: data headers plus an endpoint-specific payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de> + Default"))]
pub struct Envelope<T> {
    #[serde(default)]
    pub data_headers: DataHeaders,
    #[serde(default, deserialize_with = "nullable")]
    pub data: T,
}

impl<T> ApiResponse for Envelope<T>
where
    T: DeserializeOwned + Default + Send,
{
    fn request_id(&self) -> &str {
        &self.data_headers.request_id
    }

    fn session_token(&self) -> &str {
        &self.data_headers.sid
    }

    fn result_code(&self) -> i32 {
        self.data_headers.result_code
    }

    fn viewer_id(&self) -> u64 {
        self.data_headers.viewer_id
    }
}

/// Treat an explicit `nil`/`null` like a missing field
fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, PartialEq, Deserialize)]
    struct Probe {
        #[serde(default)]
        manifest_ver: String,
    }

    #[test]
    fn test_envelope_tolerates_null_and_missing_fields() {
        let raw = r#"{"data_headers":{"sid":null,"result_code":204},"data":null}"#;
        let env: Envelope<Probe> = serde_json::from_str(raw).unwrap();
        assert_eq!(env.result_code(), 204);
        assert_eq!(env.session_token(), "");
        assert_eq!(env.request_id(), "");
        assert_eq!(env.data, Probe::default());
    }

    #[test]
    fn test_envelope_reads_headers() {
        let raw = r#"{"data_headers":{"sid":"s","viewer_id":42,"request_id":"r","result_code":1},
                      "data":{"manifest_ver":"10002200"}}"#;
        let env: Envelope<Probe> = serde_json::from_str(raw).unwrap();
        assert_eq!(env.viewer_id(), 42);
        assert_eq!(env.request_id(), "r");
        assert_eq!(env.data.manifest_ver, "10002200");
    }
}
