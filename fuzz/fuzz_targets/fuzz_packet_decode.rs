#![no_main]

use libfuzzer_sys::fuzz_target;
use meshchat_protocol::Packet;

fuzz_target!(|data: &[u8]| {
    // Fuzz packet decoding - test for panics, over-reads, runaway allocation
    if let Ok(packet) = Packet::from_bytes(data) {
        // A successful decode must re-encode without error
        let _ = packet.to_bytes();
    }
});
