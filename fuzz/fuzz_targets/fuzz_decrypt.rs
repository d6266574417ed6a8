#![no_main]

use libfuzzer_sys::fuzz_target;
use pcr_protocol::core::crypto::ProtocolCrypto;

fuzz_target!(|data: &[u8]| {
    // Response bodies come straight off the network
    let crypto = ProtocolCrypto::new();
    let _ = crypto.decrypt_payload::<serde_json::Value>(data);
    let _ = crypto.open_envelope::<serde_json::Value>(data);
    if let Ok(text) = std::str::from_utf8(data) {
        let _ = crypto.decrypt_viewer_id(text);
    }
});
