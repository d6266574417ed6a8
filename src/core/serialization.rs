//! # Serialization Formats
//!
//! Body formats spoken by the game API.
//!
//! - **MessagePack**: the inner payload of every encrypted call. Structs are
//!   written as maps keyed by field name, matching the game client. Strings
//!   sent as raw binary by the server decode into `String` fields as long as
//!   they are valid UTF-8.
//! - **JSON**: the body of the few unencrypted calls (server list,
//!   maintenance status).
//!
//! ## Usage
//! ```ignore
//! use pcr_protocol::core::serialization::WireFormat;
//!
//! let bytes = WireFormat::MessagePack.encode(&request)?;
//! let reply: Envelope<LoadIndexResponse> = WireFormat::MessagePack.decode(&bytes)?;
//! ```

use crate::error::{ProtocolError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Supported body formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WireFormat {
    /// Compact binary map format used inside encrypted envelopes
    #[default]
    MessagePack,
    /// Plain JSON used by unencrypted calls
    Json,
}

impl WireFormat {
    /// `Content-Type` header value for a request body in this format
    pub fn content_type(self) -> &'static str {
        match self {
            WireFormat::MessagePack => "application/octet-stream",
            WireFormat::Json => "application/json",
        }
    }

    /// Get human-readable name
    pub fn name(self) -> &'static str {
        match self {
            WireFormat::MessagePack => "MessagePack",
            WireFormat::Json => "JSON",
        }
    }

    /// Serialize `value` in this format
    pub fn encode<T: Serialize + ?Sized>(self, value: &T) -> Result<Vec<u8>> {
        match self {
            WireFormat::MessagePack => encode_msgpack(value),
            WireFormat::Json => {
                serde_json::to_vec(value).map_err(|e| ProtocolError::Encode(e.to_string()))
            }
        }
    }

    /// Deserialize a `T` from bytes in this format
    pub fn decode<T: DeserializeOwned>(self, data: &[u8]) -> Result<T> {
        match self {
            WireFormat::MessagePack => decode_msgpack(data),
            WireFormat::Json => {
                serde_json::from_slice(data).map_err(|e| ProtocolError::Decode(e.to_string()))
            }
        }
    }
}

/// Encode a value as a MessagePack map
pub fn encode_msgpack<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    rmp_serde::to_vec_named(value).map_err(|e| ProtocolError::Encode(e.to_string()))
}

/// Decode a MessagePack document into the requested shape
pub fn decode_msgpack<T: DeserializeOwned>(data: &[u8]) -> Result<T> {
    rmp_serde::from_slice(data).map_err(|e| ProtocolError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct LoadIndex {
        viewer_id: String,
        carrier: String,
    }

    #[test]
    fn test_content_types() {
        assert_eq!(
            WireFormat::MessagePack.content_type(),
            "application/octet-stream"
        );
        assert_eq!(WireFormat::Json.content_type(), "application/json");
    }

    #[test]
    fn test_format_names() {
        assert_eq!(WireFormat::MessagePack.name(), "MessagePack");
        assert_eq!(WireFormat::Json.name(), "JSON");
    }

    #[test]
    fn test_default_format() {
        assert_eq!(WireFormat::default(), WireFormat::MessagePack);
    }

    #[test]
    fn test_msgpack_writes_field_names() {
        let value = LoadIndex {
            viewer_id: "1".into(),
            carrier: "LN_NMSL".into(),
        };
        let bytes = encode_msgpack(&value).unwrap();
        // fixmap with two entries
        assert_eq!(bytes[0], 0x82);
        assert!(bytes.windows(7).any(|w| w == b"carrier"));
        assert_eq!(decode_msgpack::<LoadIndex>(&bytes).unwrap(), value);
    }

    #[test]
    fn test_msgpack_binary_strings_decode_as_text() {
        // {"viewer_id": bin8("42"), "carrier": str("x")}
        let mut bytes = vec![0x82, 0xa9];
        bytes.extend_from_slice(b"viewer_id");
        bytes.extend_from_slice(&[0xc4, 0x02, b'4', b'2', 0xa7]);
        bytes.extend_from_slice(b"carrier");
        bytes.extend_from_slice(&[0xa1, b'x']);

        let decoded: LoadIndex = decode_msgpack(&bytes).unwrap();
        assert_eq!(decoded.viewer_id, "42");
        assert_eq!(decoded.carrier, "x");
    }

    #[test]
    fn test_msgpack_rejects_garbage() {
        assert!(matches!(
            decode_msgpack::<LoadIndex>(&[0xc1, 0x00]),
            Err(ProtocolError::Decode(_))
        ));
    }

    #[test]
    fn test_json_roundtrip() {
        let value = LoadIndex {
            viewer_id: "0".into(),
            carrier: "c".into(),
        };
        let bytes = WireFormat::Json.encode(&value).unwrap();
        assert!(std::str::from_utf8(&bytes).unwrap().contains("\"viewer_id\":\"0\""));
        assert_eq!(WireFormat::Json.decode::<LoadIndex>(&bytes).unwrap(), value);
    }
}
