#![no_main]

use libfuzzer_sys::fuzz_target;
use meshchat_protocol::utils::compression::{compress, decompress};

fuzz_target!(|data: &[u8]| {
    // Round-trip: whatever we compress must decompress to the original
    if data.len() <= 65535 {
        let compressed = compress(data);
        if let Ok(out) = decompress(&compressed) {
            assert_eq!(out, data);
        }
    }

    // Raw hostile input: size claims must be rejected before allocation
    let _ = decompress(data);
});
