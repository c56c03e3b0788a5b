//! Binary codec for the chat message carried inside a packet payload.
//!
//! Wire layout, multi-byte integers big-endian:
//!
//! ```text
//! [Flags(1)] [Timestamp(8)]
//! [IdLen(1)] [Id] [SenderLen(1)] [Sender] [ContentLen(2)] [Content]
//! [OriginalSenderLen(1) + OriginalSender]?
//! [RecipientNicknameLen(1) + RecipientNickname]?
//! [SenderPeerIdLen(1) + SenderPeerId]?
//! ```
//!
//! Presence flags for the three optional trailing fields are a projection of
//! which strings are non-empty, recomputed on every encode. On decode an
//! absent optional field is left as an empty string. A flag claiming a field
//! the buffer no longer holds is tolerated as "absent" so that minimal or
//! fragment-lossy peers still interoperate.

use bytes::{Buf, BufMut};
use tracing::{debug, warn};

use crate::config::CONTENT_CAPACITY;
use crate::error::{ProtocolError, Result};
use crate::utils::ident::generate_message_id;
use crate::utils::time::current_timestamp_ms;

/// Message flag bits. The presence bits are derived from field content on
/// encode, never set independently.
pub mod flags {
    /// Message was re-broadcast by a node other than its originator
    pub const IS_RELAY: u8 = 0x01;
    /// Message is addressed to a single peer
    pub const IS_PRIVATE: u8 = 0x02;
    /// An original-sender nickname trails the content
    pub const HAS_ORIGINAL_SENDER: u8 = 0x04;
    /// A recipient nickname trails the content
    pub const HAS_RECIPIENT_NICKNAME: u8 = 0x08;
    /// The sender's peer id (hex text) trails the content
    pub const HAS_SENDER_PEER_ID: u8 = 0x10;
}

/// Smallest decodable message: flags, timestamp, two 1-byte length
/// prefixes, and the 2-byte content length prefix.
pub const MIN_MESSAGE_SIZE: usize = 13;

/// Largest value a 1-byte length prefix can describe.
const MAX_SHORT_FIELD: usize = u8::MAX as usize;

/// Largest value the 2-byte content length prefix can describe.
const MAX_CONTENT_FIELD: usize = u16::MAX as usize;

/// A chat message, the unit the UI layer produces and consumes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    /// Unique identifier in UUID-v4 text form.
    pub id: String,
    /// Display nickname of the originator.
    pub sender: String,
    /// Message body. Decoding clamps storage to [`CONTENT_CAPACITY`] bytes.
    pub content: String,
    /// Milliseconds since epoch.
    pub timestamp: u64,
    pub is_relay: bool,
    pub is_private: bool,
    /// Originator nickname when relaying on behalf of another peer.
    pub original_sender: String,
    /// Target nickname for private messages.
    pub recipient_nickname: String,
    /// Hex text form of the sender's 8-byte peer id.
    pub sender_peer_id: String,
}

impl Message {
    /// Build a public message with a fresh id and the current timestamp.
    pub fn new(sender: &str, content: &str) -> Self {
        Self {
            id: generate_message_id(),
            sender: sender.to_string(),
            content: content.to_string(),
            timestamp: current_timestamp_ms(),
            ..Self::default()
        }
    }

    /// Build a private message addressed to `recipient_nickname`.
    pub fn private(sender: &str, content: &str, recipient_nickname: &str) -> Self {
        Self {
            is_private: true,
            recipient_nickname: recipient_nickname.to_string(),
            ..Self::new(sender, content)
        }
    }

    /// Flags byte, derived from the relay/private markers and from which
    /// optional strings are non-empty.
    pub fn flags(&self) -> u8 {
        let mut flags = 0u8;
        if self.is_relay {
            flags |= flags::IS_RELAY;
        }
        if self.is_private {
            flags |= flags::IS_PRIVATE;
        }
        if !self.original_sender.is_empty() {
            flags |= flags::HAS_ORIGINAL_SENDER;
        }
        if !self.recipient_nickname.is_empty() {
            flags |= flags::HAS_RECIPIENT_NICKNAME;
        }
        if !self.sender_peer_id.is_empty() {
            flags |= flags::HAS_SENDER_PEER_ID;
        }
        flags
    }

    /// Exact number of bytes `to_bytes` will produce for this message.
    pub fn encoded_len(&self) -> usize {
        let mut len = 1 + 8 + 1 + self.id.len() + 1 + self.sender.len() + 2 + self.content.len();
        for field in [
            &self.original_sender,
            &self.recipient_nickname,
            &self.sender_peer_id,
        ] {
            if !field.is_empty() {
                len += 1 + field.len();
            }
        }
        len
    }

    /// Encode into a freshly allocated buffer.
    ///
    /// # Errors
    /// [`ProtocolError::FieldTooLong`] when a string exceeds what its length
    /// prefix can represent. Rejecting here, rather than truncating the
    /// length byte and corrupting the frame, is a deliberate deviation from
    /// earlier implementations of this format.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        check_short_field("message id", &self.id)?;
        check_short_field("sender", &self.sender)?;
        check_short_field("original sender", &self.original_sender)?;
        check_short_field("recipient nickname", &self.recipient_nickname)?;
        check_short_field("sender peer id", &self.sender_peer_id)?;
        if self.content.len() > MAX_CONTENT_FIELD {
            return Err(ProtocolError::FieldTooLong {
                field: "content",
                len: self.content.len(),
                max: MAX_CONTENT_FIELD,
            });
        }

        let mut buf = Vec::with_capacity(self.encoded_len());
        buf.put_u8(self.flags());
        buf.put_u64(self.timestamp);

        buf.put_u8(self.id.len() as u8);
        buf.put_slice(self.id.as_bytes());
        buf.put_u8(self.sender.len() as u8);
        buf.put_slice(self.sender.as_bytes());
        buf.put_u16(self.content.len() as u16);
        buf.put_slice(self.content.as_bytes());

        for field in [
            &self.original_sender,
            &self.recipient_nickname,
            &self.sender_peer_id,
        ] {
            if !field.is_empty() {
                buf.put_u8(field.len() as u8);
                buf.put_slice(field.as_bytes());
            }
        }

        debug!(
            id = %self.id,
            content_len = self.content.len(),
            total = buf.len(),
            "encoded message"
        );
        Ok(buf)
    }

    /// Decode a message from packet payload bytes.
    ///
    /// Content longer than [`CONTENT_CAPACITY`] is stored truncated while
    /// the cursor still advances the full declared length, so any trailing
    /// optional fields stay correctly positioned.
    ///
    /// # Errors
    /// - [`ProtocolError::TooShort`] below the 13-byte minimum
    /// - [`ProtocolError::Truncated`] when a declared mandatory-field length
    ///   runs past the end of the buffer
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < MIN_MESSAGE_SIZE {
            warn!(len = data.len(), "message below minimum size");
            return Err(ProtocolError::TooShort {
                len: data.len(),
                min: MIN_MESSAGE_SIZE,
            });
        }

        let mut buf = data;

        let flags = buf.get_u8();
        let timestamp = buf.get_u64();

        let id = read_short_field(&mut buf, "message id")?;
        let sender = read_short_field(&mut buf, "sender")?;

        if buf.remaining() < 2 {
            return Err(ProtocolError::Truncated {
                section: "content length",
                needed: 2,
                available: buf.remaining(),
            });
        }
        let content_len = buf.get_u16() as usize;
        if content_len > buf.remaining() {
            return Err(ProtocolError::Truncated {
                section: "content",
                needed: content_len,
                available: buf.remaining(),
            });
        }
        let stored = content_len.min(CONTENT_CAPACITY);
        let content = String::from_utf8_lossy(&buf[..stored]).into_owned();
        buf.advance(content_len);

        let mut message = Self {
            id,
            sender,
            content,
            timestamp,
            is_relay: flags & flags::IS_RELAY != 0,
            is_private: flags & flags::IS_PRIVATE != 0,
            ..Self::default()
        };

        if flags & flags::HAS_ORIGINAL_SENDER != 0 {
            if let Some(field) = read_optional_field(&mut buf) {
                message.original_sender = field;
            }
        }
        if flags & flags::HAS_RECIPIENT_NICKNAME != 0 {
            if let Some(field) = read_optional_field(&mut buf) {
                message.recipient_nickname = field;
            }
        }
        if flags & flags::HAS_SENDER_PEER_ID != 0 {
            if let Some(field) = read_optional_field(&mut buf) {
                message.sender_peer_id = field;
            }
        }

        debug!(id = %message.id, sender = %message.sender, "decoded message");
        Ok(message)
    }
}

fn check_short_field(field: &'static str, value: &str) -> Result<()> {
    if value.len() > MAX_SHORT_FIELD {
        return Err(ProtocolError::FieldTooLong {
            field,
            len: value.len(),
            max: MAX_SHORT_FIELD,
        });
    }
    Ok(())
}

/// Read a mandatory 1-byte-length-prefixed string.
fn read_short_field(buf: &mut &[u8], section: &'static str) -> Result<String> {
    if !buf.has_remaining() {
        return Err(ProtocolError::Truncated {
            section,
            needed: 1,
            available: 0,
        });
    }
    let len = buf.get_u8() as usize;
    if len > buf.remaining() {
        return Err(ProtocolError::Truncated {
            section,
            needed: len,
            available: buf.remaining(),
        });
    }
    let value = String::from_utf8_lossy(&buf[..len]).into_owned();
    buf.advance(len);
    Ok(value)
}

/// Read an optional trailing field, tolerating exhausted input.
///
/// Returns `None` when the buffer is empty or the declared length over-runs
/// what remains; the flag claiming the field is then treated as stale.
fn read_optional_field(buf: &mut &[u8]) -> Option<String> {
    if !buf.has_remaining() {
        return None;
    }
    let len = buf.get_u8() as usize;
    if len > buf.remaining() {
        return None;
    }
    let value = String::from_utf8_lossy(&buf[..len]).into_owned();
    buf.advance(len);
    Some(value)
}
