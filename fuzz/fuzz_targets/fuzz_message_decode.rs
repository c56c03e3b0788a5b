#![no_main]

use libfuzzer_sys::fuzz_target;
use meshchat_protocol::Message;

fuzz_target!(|data: &[u8]| {
    // Fuzz message decoding - hostile length prefixes and flag combinations
    if let Ok(message) = Message::from_bytes(data) {
        // Re-encoding a decoded message must never panic
        let _ = message.to_bytes();
    }
});
