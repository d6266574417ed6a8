//! # Error Types
//!
//! Error handling for the session and wire-protocol engine.
//!
//! This module defines every failure the engine can surface, from transport
//! problems through codec failures up to business result codes returned by
//! the game server.
//!
//! ## Error Categories
//! - **Transport Errors**: network failures, non-200 HTTP statuses, cancellation
//! - **Codec Errors**: MessagePack/JSON encoding, padding and cipher failures
//! - **Business Errors**: non-success result codes, session invalidation,
//!   stale client version
//! - **Login Errors**: tutorial gate and exhausted login attempts
//!
//! Every layer wraps the error it received with the name of the failing
//! operation (see [`ResultExt::context`]); [`ProtocolError::root`] recovers the
//! originating kind.
//!
//! ## Example Usage
//! ```rust
//! use pcr_protocol::error::{ProtocolError, Result, ResultExt};
//!
//! fn parse_code(raw: &str) -> Result<i32> {
//!     raw.parse::<i32>()
//!         .map_err(|e| ProtocolError::Decode(e.to_string()))
//!         .context("parse_code", "result code is not numeric")
//! }
//!
//! let err = parse_code("x").unwrap_err();
//! assert!(matches!(err.root(), ProtocolError::Decode(_)));
//! ```

use std::fmt;
use thiserror::Error;

/// Error message constants to reduce allocations in error paths.
pub mod constants {
    /// Codec errors
    pub const ERR_ENCODE_PAYLOAD: &str = "Failed to encode payload";
    pub const ERR_DECRYPT_PAYLOAD: &str = "Failed to decrypt response payload";
    pub const ERR_ENCRYPT_VIEWER_ID: &str = "Failed to encrypt viewer id";

    /// Pipeline errors
    pub const ERR_PREPARE_REQUEST: &str = "Failed to prepare request";
    pub const ERR_SEND_REQUEST: &str = "Failed to send request";
    pub const ERR_DECODE_RESPONSE: &str = "Failed to decode response";

    /// Session errors
    pub const ERR_VERSION_FETCH: &str = "Failed to fetch new app version";
    pub const ERR_VERSION_STORE: &str = "Failed to store new app version";
    pub const ERR_STARTUP_PROBE: &str = "Startup probe failed";

    /// Synchronization errors
    pub const ERR_LOCK_POISONED: &str = "Synchronization primitive poisoned";
}

/// Stage of the response decryption pipeline that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecryptStage {
    Base64,
    Cipher,
    Padding,
    Decode,
}

impl fmt::Display for DecryptStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DecryptStage::Base64 => "base64",
            DecryptStage::Cipher => "cipher",
            DecryptStage::Padding => "padding",
            DecryptStage::Decode => "decode",
        };
        f.write_str(name)
    }
}

// ProtocolError is the primary error type for all engine operations
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("HTTP request failed with status {0}")]
    HttpStatus(u16),

    #[error("Encode error: {0}")]
    Encode(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Invalid padding")]
    InvalidPadding,

    #[error("Ciphertext too short: {0} bytes (minimum 32)")]
    CiphertextTooShort(usize),

    #[error("Ciphertext length {0} is not a multiple of the block size")]
    CiphertextMisaligned(usize),

    #[error("Base64 error: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Decryption failed at {stage} stage: {source}")]
    Decrypt {
        stage: DecryptStage,
        #[source]
        source: Box<ProtocolError>,
    },

    #[error("API failed with result code {code}")]
    Business { code: i32 },

    #[error("Session invalidated by server (result code 3)")]
    SessionInvalid,

    #[error("Client version was outdated and has been updated to {0}; retry the call")]
    VersionUpdated(String),

    #[error("Account has not completed the tutorial")]
    TutorialIncomplete,

    #[error("Login failed after {attempts} attempts: {source}")]
    LoginFailed {
        attempts: u32,
        #[source]
        source: Box<ProtocolError>,
    },

    #[error("Session is already authenticated")]
    AlreadyAuthenticated,

    #[error("Version fetch error: {0}")]
    VersionFetch(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("operation '{operation}' failed: {message} (caused by: {source})")]
    Context {
        operation: &'static str,
        message: String,
        #[source]
        source: Box<ProtocolError>,
    },
}

impl ProtocolError {
    /// Wrap this error with the name of the failing operation
    pub fn context(self, operation: &'static str, message: impl Into<String>) -> Self {
        ProtocolError::Context {
            operation,
            message: message.into(),
            source: Box::new(self),
        }
    }

    /// The originating error, looking through context and stage wrappers
    pub fn root(&self) -> &ProtocolError {
        match self {
            ProtocolError::Context { source, .. }
            | ProtocolError::Decrypt { source, .. }
            | ProtocolError::LoginFailed { source, .. } => source.root(),
            other => other,
        }
    }

    /// Business result code carried by this error, if any
    pub fn api_code(&self) -> Option<i32> {
        match self.root() {
            ProtocolError::Business { code } => Some(*code),
            ProtocolError::SessionInvalid => Some(3),
            ProtocolError::VersionUpdated(_) => Some(204),
            _ => None,
        }
    }

    /// Whether the server declared the session invalid
    pub fn is_session_invalid(&self) -> bool {
        matches!(self.root(), ProtocolError::SessionInvalid)
    }

    /// Whether the call should simply be retried after a client version refresh
    pub fn is_version_updated(&self) -> bool {
        matches!(self.root(), ProtocolError::VersionUpdated(_))
    }
}

/// Attach operation context to a `Result`
pub trait ResultExt<T> {
    fn context(self, operation: &'static str, message: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, operation: &'static str, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.context(operation, message))
    }
}

/// Type alias for Results using ProtocolError
pub type Result<T> = std::result::Result<T, ProtocolError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_walks_all_wrappers() {
        let err = ProtocolError::LoginFailed {
            attempts: 3,
            source: Box::new(
                ProtocolError::TutorialIncomplete.context("login:game_start", "tutorial gate"),
            ),
        };
        assert!(matches!(err.root(), ProtocolError::TutorialIncomplete));
    }

    #[test]
    fn test_api_code() {
        assert_eq!(ProtocolError::Business { code: 17 }.api_code(), Some(17));
        assert_eq!(
            ProtocolError::SessionInvalid
                .context("execute", "API failed")
                .api_code(),
            Some(3)
        );
        assert_eq!(
            ProtocolError::VersionUpdated("8.2.0".into()).api_code(),
            Some(204)
        );
        assert_eq!(ProtocolError::HttpStatus(500).api_code(), None);
    }

    #[test]
    fn test_context_message_names_operation() {
        let err = ProtocolError::HttpStatus(502).context("execute:http_status", "HTTP failed");
        let text = err.to_string();
        assert!(text.contains("execute:http_status"));
        assert!(text.contains("502"));
    }
}
