#![no_main]

use libfuzzer_sys::fuzz_target;
use pcr_protocol::core::padding::{pad, unpad};

fuzz_target!(|data: &[u8]| {
    if let Ok(stripped) = unpad(data) {
        assert!(stripped.len() < data.len());
    }
    assert_eq!(unpad(&pad(data)).ok(), Some(data));
});
