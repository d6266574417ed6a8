//! PKCS#7 block padding for the 16-byte AES block size.
//!
//! The game always pads: an already aligned message gains a full block of
//! `0x10` bytes, so the trailing byte of a padded buffer always names the
//! pad length.

use crate::error::{ProtocolError, Result};

/// AES block size in bytes
pub const BLOCK_SIZE: usize = 16;

/// Append `n` bytes of value `n`, where `n = 16 - len % 16` (never zero)
pub fn pad(data: &[u8]) -> Vec<u8> {
    let padding = BLOCK_SIZE - data.len() % BLOCK_SIZE;
    let mut out = Vec::with_capacity(data.len() + padding);
    out.extend_from_slice(data);
    out.resize(data.len() + padding, padding as u8);
    out
}

/// Strip PKCS#7 padding, verifying every pad byte
///
/// # Errors
/// Returns `ProtocolError::InvalidPadding` if the input is empty, the claimed
/// pad length is 0 or larger than a block (or the input), or any pad byte
/// differs from the claimed length.
pub fn unpad(data: &[u8]) -> Result<&[u8]> {
    let Some(&last) = data.last() else {
        return Err(ProtocolError::InvalidPadding);
    };

    let padding = last as usize;
    if padding == 0 || padding > BLOCK_SIZE || padding > data.len() {
        return Err(ProtocolError::InvalidPadding);
    }

    let (body, tail) = data.split_at(data.len() - padding);
    if tail.iter().any(|&b| b != last) {
        return Err(ProtocolError::InvalidPadding);
    }

    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pad_partial_block() {
        let padded = pad(b"hello");
        assert_eq!(padded.len(), 16);
        assert!(padded[5..].iter().all(|&b| b == 11));
    }

    #[test]
    fn test_pad_aligned_input_gains_full_block() {
        let padded = pad(&[7u8; 32]);
        assert_eq!(padded.len(), 48);
        assert!(padded[32..].iter().all(|&b| b == 16));
    }

    #[test]
    fn test_pad_empty_input() {
        assert_eq!(pad(&[]), vec![16u8; 16]);
    }

    #[test]
    fn test_unpad_rejects_bad_input() {
        assert!(matches!(unpad(&[]), Err(ProtocolError::InvalidPadding)));
        assert!(matches!(unpad(&[1, 2, 0]), Err(ProtocolError::InvalidPadding)));
        assert!(matches!(unpad(&[17u8; 32]), Err(ProtocolError::InvalidPadding)));
        assert!(matches!(unpad(&[9, 9, 3, 3]), Err(ProtocolError::InvalidPadding)));
        assert!(matches!(unpad(&[4, 4, 4]), Err(ProtocolError::InvalidPadding)));
    }

    #[test]
    fn test_unpad_strips_exact_length() {
        assert_eq!(unpad(&[b'a', b'b', 2, 2]).unwrap(), b"ab");
        assert_eq!(unpad(&pad(b"viewer")).unwrap(), b"viewer");
    }
}
