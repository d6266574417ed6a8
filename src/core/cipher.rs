//! AES-256-CBC with the game's appended-key convention.
//!
//! Every message is encrypted under a fresh 32-byte key made of ASCII hex
//! characters, and the key is appended to the ciphertext:
//!
//! ```text
//! [CBC(pad(plaintext), key, PROTOCOL_IV)] [key(32)]
//! ```
//!
//! The key travels in the clear next to the data it protects, so this layer
//! only reproduces the game client's obfuscation. It provides no
//! confidentiality and must not be treated as a security boundary.

use crate::config::PROTOCOL_IV;
use crate::core::padding::{pad, BLOCK_SIZE};
use crate::error::{ProtocolError, Result};
use aes::cipher::{block_padding::NoPadding, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::Rng;

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// Length of the per-message key appended to every ciphertext
pub const KEY_LEN: usize = 32;

/// Per-message key; every byte is a lowercase ASCII hex digit
pub type WireKey = [u8; KEY_LEN];

const HEX_ALPHABET: &[u8; 16] = b"0123456789abcdef";

/// Generate a fresh key of uniformly chosen hex characters
pub fn generate_key() -> WireKey {
    let mut rng = rand::rng();
    let mut key = [0u8; KEY_LEN];
    for byte in key.iter_mut() {
        *byte = HEX_ALPHABET[rng.random_range(0..HEX_ALPHABET.len())];
    }
    key
}

/// Pad and encrypt `plaintext` under a fresh key, returning `ciphertext || key`
pub fn encrypt(plaintext: &[u8]) -> Result<Vec<u8>> {
    encrypt_with_key(plaintext, &generate_key())
}

/// Pad and encrypt `plaintext` under `key`, returning `ciphertext || key`
pub fn encrypt_with_key(plaintext: &[u8], key: &WireKey) -> Result<Vec<u8>> {
    let cipher = Aes256CbcEnc::new_from_slices(key, PROTOCOL_IV)
        .map_err(|e| ProtocolError::Encode(format!("cipher init: {e}")))?;

    let padded = pad(plaintext);
    let mut out = cipher.encrypt_padded_vec_mut::<NoPadding>(&padded);
    out.extend_from_slice(key);
    Ok(out)
}

/// Split off the trailing key and CBC-decrypt the rest
///
/// The returned bytes are still padded; strip them with
/// [`unpad`](crate::core::padding::unpad).
///
/// # Errors
/// - `CiphertextTooShort` if the input cannot hold the 32-byte key
/// - `CiphertextMisaligned` if the remaining ciphertext is not block aligned
pub fn decrypt(data: &[u8]) -> Result<Vec<u8>> {
    if data.len() < KEY_LEN {
        return Err(ProtocolError::CiphertextTooShort(data.len()));
    }

    let (body, key) = data.split_at(data.len() - KEY_LEN);
    if body.len() % BLOCK_SIZE != 0 {
        return Err(ProtocolError::CiphertextMisaligned(body.len()));
    }

    let cipher = Aes256CbcDec::new_from_slices(key, PROTOCOL_IV)
        .map_err(|e| ProtocolError::Decode(format!("cipher init: {e}")))?;

    cipher
        .decrypt_padded_vec_mut::<NoPadding>(body)
        .map_err(|_| ProtocolError::CiphertextMisaligned(body.len()))
}
