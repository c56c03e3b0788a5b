//! Message identifier generation and peer id text form.
//!
//! Message ids are UUID-v4-formatted text built from four independent
//! 32-bit random draws. Uniqueness-in-practice is all the mesh needs for
//! deduplication; the ids carry no cryptographic meaning.

use std::fmt::Write;

/// Length of a message id in its canonical text form.
pub const MESSAGE_ID_LEN: usize = 36;

/// Generate a unique message id in UUID v4 text form (8-4-4-4-12 hex
/// groups, version nibble 4, variant bits `10`).
pub fn generate_message_id() -> String {
    let r1: u32 = rand::random();
    let r2: u32 = rand::random();
    let r3: u32 = rand::random();
    let r4: u32 = rand::random();

    format!(
        "{:08x}-{:04x}-4{:03x}-{:04x}-{:012x}",
        r1,
        (r2 >> 16) & 0xFFFF,
        r2 & 0x0FFF,
        ((r3 >> 16) & 0x3FFF) | 0x8000,
        (u64::from(r3 & 0xFFFF) << 32) | u64::from(r4),
    )
}

/// Hex text form of an 8-byte peer id, as carried in the message's
/// sender-peer-id field.
pub fn peer_id_to_hex(peer_id: &[u8; 8]) -> String {
    peer_id.iter().fold(String::with_capacity(16), |mut s, b| {
        let _ = write!(s, "{b:02x}");
        s
    })
}

/// Parse the hex text form back into an 8-byte peer id.
///
/// Returns `None` unless the input is exactly 16 hex digits.
pub fn peer_id_from_hex(text: &str) -> Option<[u8; 8]> {
    if text.len() != 16 || !text.is_ascii() {
        return None;
    }
    let mut peer_id = [0u8; 8];
    for (i, chunk) in text.as_bytes().chunks_exact(2).enumerate() {
        let pair = std::str::from_utf8(chunk).ok()?;
        peer_id[i] = u8::from_str_radix(pair, 16).ok()?;
    }
    Some(peer_id)
}
