//! Payload encryption as spoken by the game API.
//!
//! Requests travel as raw `CBC(pad(msgpack(request))) || key` bytes; responses
//! come back base64 encoded in the same layout. The viewer id field of an
//! encrypted request is itself sealed under its own key and base64 encoded.
//!
//! See [`cipher`](crate::core::cipher) for why none of this is confidential.

use crate::config::SID_SALT;
use crate::core::{cipher, padding, serialization};
use crate::error::{DecryptStage, ProtocolError, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use md5::{Digest, Md5};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Stateless composition of the MessagePack codec, the CBC cipher and base64
#[derive(Debug, Clone, Copy, Default)]
pub struct ProtocolCrypto;

impl ProtocolCrypto {
    pub fn new() -> Self {
        Self
    }

    /// Encode `value` as MessagePack and seal it under a fresh key.
    ///
    /// The result is the raw request body; it is not base64 encoded.
    pub fn encrypt_payload<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>> {
        let encoded = serialization::encode_msgpack(value)?;
        cipher::encrypt(&encoded)
    }

    /// Base64-decode a response body, then open it into `T`.
    ///
    /// # Errors
    /// `ProtocolError::Decrypt` naming the first stage that failed.
    pub fn decrypt_payload<T: DeserializeOwned>(&self, body: impl AsRef<[u8]>) -> Result<T> {
        let sealed = BASE64
            .decode(body.as_ref())
            .map_err(|e| stage_error(DecryptStage::Base64, ProtocolError::Base64(e)))?;
        self.open_envelope(&sealed)
    }

    /// Open raw `ciphertext || key` bytes into `T` (no base64 layer)
    pub fn open_envelope<T: DeserializeOwned>(&self, sealed: &[u8]) -> Result<T> {
        let decrypted =
            cipher::decrypt(sealed).map_err(|e| stage_error(DecryptStage::Cipher, e))?;
        let plain =
            padding::unpad(&decrypted).map_err(|e| stage_error(DecryptStage::Padding, e))?;
        serialization::decode_msgpack(plain).map_err(|e| stage_error(DecryptStage::Decode, e))
    }

    /// Seal the decimal form of `id` under its own fresh key and base64 it
    pub fn encrypt_viewer_id(&self, id: u64) -> Result<String> {
        let sealed = cipher::encrypt(id.to_string().as_bytes())?;
        Ok(BASE64.encode(sealed))
    }

    /// Inverse of [`encrypt_viewer_id`](Self::encrypt_viewer_id)
    pub fn decrypt_viewer_id(&self, encoded: &str) -> Result<u64> {
        let sealed = BASE64
            .decode(encoded)
            .map_err(|e| stage_error(DecryptStage::Base64, ProtocolError::Base64(e)))?;
        let decrypted =
            cipher::decrypt(&sealed).map_err(|e| stage_error(DecryptStage::Cipher, e))?;
        let plain =
            padding::unpad(&decrypted).map_err(|e| stage_error(DecryptStage::Padding, e))?;
        std::str::from_utf8(plain)
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .ok_or_else(|| {
                stage_error(
                    DecryptStage::Decode,
                    ProtocolError::Decode("viewer id is not a decimal integer".into()),
                )
            })
    }
}

/// Hash a server session token into the value of the `SID` header
pub fn calc_session_token(token: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(token.as_bytes());
    hasher.update(SID_SALT.as_bytes());
    hex::encode(hasher.finalize())
}

fn stage_error(stage: DecryptStage, source: ProtocolError) -> ProtocolError {
    ProtocolError::Decrypt {
        stage,
        source: Box::new(source),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct HomeIndex {
        viewer_id: String,
        message_id: i32,
        tips_id_list: Vec<i32>,
    }

    fn sample() -> HomeIndex {
        HomeIndex {
            viewer_id: "abc".into(),
            message_id: 1,
            tips_id_list: vec![3, 5],
        }
    }

    #[test]
    fn test_payload_roundtrip_through_base64() {
        let crypto = ProtocolCrypto::new();
        let sealed = crypto.encrypt_payload(&sample()).unwrap();
        let body = BASE64.encode(&sealed);
        let opened: HomeIndex = crypto.decrypt_payload(body).unwrap();
        assert_eq!(opened, sample());
    }

    #[test]
    fn test_decrypt_reports_base64_stage() {
        let err = ProtocolCrypto::new()
            .decrypt_payload::<HomeIndex>("***not base64***")
            .unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::Decrypt {
                stage: DecryptStage::Base64,
                ..
            }
        ));
    }

    #[test]
    fn test_decrypt_reports_cipher_stage() {
        let err = ProtocolCrypto::new()
            .decrypt_payload::<HomeIndex>(BASE64.encode(b"short"))
            .unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::Decrypt {
                stage: DecryptStage::Cipher,
                ..
            }
        ));
        assert!(matches!(err.root(), ProtocolError::CiphertextTooShort(5)));
    }

    #[test]
    fn test_decrypt_reports_decode_stage() {
        let sealed = cipher::encrypt(&[0xc1]).unwrap();
        let err = ProtocolCrypto::new()
            .decrypt_payload::<HomeIndex>(BASE64.encode(sealed))
            .unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::Decrypt {
                stage: DecryptStage::Decode,
                ..
            }
        ));
    }

    #[test]
    fn test_viewer_id_uses_independent_keys() {
        let crypto = ProtocolCrypto::new();
        let a = crypto.encrypt_viewer_id(1_234_567).unwrap();
        let b = crypto.encrypt_viewer_id(1_234_567).unwrap();
        assert_ne!(a, b);
        assert_eq!(crypto.decrypt_viewer_id(&a).unwrap(), 1_234_567);
        assert_eq!(crypto.decrypt_viewer_id(&b).unwrap(), 1_234_567);
    }

    #[test]
    fn test_session_token_hash() {
        // md5("abcc!SID!n")
        let expected = hex::encode(Md5::digest(b"abcc!SID!n"));
        assert_eq!(calc_session_token("abc"), expected);
        assert_eq!(calc_session_token("abc").len(), 32);
    }
}
