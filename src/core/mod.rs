//! # Core Codecs
//!
//! Byte-level building blocks of the game's wire protocol.
//!
//! ## Components
//! - **Padding**: PKCS#7 padding for 16-byte blocks
//! - **Cipher**: AES-256-CBC with a fixed IV and a per-message key appended
//!   to the ciphertext
//! - **Serialization**: MessagePack (encrypted bodies) and JSON (plain bodies)
//! - **Crypto**: the composition used by the transport pipeline, plus the
//!   `SID` header hash
//!
//! ## Wire Format
//! ```text
//! request body:  [CBC(pad(msgpack(request)))] [key(32)]
//! response body: base64([CBC(pad(msgpack(response)))] [key(32)])
//! ```

pub mod cipher;
pub mod crypto;
pub mod padding;
pub mod serialization;
