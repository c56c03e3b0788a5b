//! Binary codec for the routing envelope exchanged between mesh peers.
//!
//! Wire layout, all multi-byte integers big-endian:
//!
//! ```text
//! [Version(1)] [Type(1)] [TTL(1)] [Timestamp(8)] [Flags(1)] [PayloadLen(2)]
//! [SenderID(8)] [RecipientID(8)?] [Payload(N)] [Signature(64)?]
//! ```
//!
//! The recipient and signature sections are present only when their flag
//! bits are set; their position in the sequence is fixed whenever present.
//! Every length field is treated as untrusted: decoding checks remaining
//! buffer space before each read and can never index past the input.

use bytes::{Buf, BufMut};
use tracing::{debug, warn};

use crate::config::{
    HEADER_SIZE, MAX_PAYLOAD_SIZE, MIN_PACKET_SIZE, PROTOCOL_VERSION, RECIPIENT_ID_SIZE,
    SENDER_ID_SIZE, SIGNATURE_SIZE,
};
use crate::error::{ProtocolError, Result};
use crate::utils::time::current_timestamp_ms;

/// Packet flag bits. The recipient and signature bits are derived from
/// field presence on encode, never set independently.
pub mod flags {
    /// Packet carries a recipient ID (directed rather than broadcast)
    pub const HAS_RECIPIENT: u8 = 0x01;
    /// Packet carries a trailing signature block
    pub const HAS_SIGNATURE: u8 = 0x02;
    /// Payload bytes are compressed
    pub const IS_COMPRESSED: u8 = 0x04;
}

/// All packet types understood by this node.
///
/// The on-wire type stays a raw `u8` inside [`Packet`] so that packets of
/// unknown type can still be relayed by intermediate nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PacketType {
    PublicMessage = 0x01,
    PrivateMessage = 0x02,
    Announcement = 0x03,
    SyncRequest = 0x04,
    SyncResponse = 0x05,
    Handshake = 0x06,
    DeliveryAck = 0x07,
}

impl PacketType {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x01 => Some(Self::PublicMessage),
            0x02 => Some(Self::PrivateMessage),
            0x03 => Some(Self::Announcement),
            0x04 => Some(Self::SyncRequest),
            0x05 => Some(Self::SyncResponse),
            0x06 => Some(Self::Handshake),
            0x07 => Some(Self::DeliveryAck),
            _ => None,
        }
    }
}

impl From<PacketType> for u8 {
    fn from(t: PacketType) -> u8 {
        t as u8
    }
}

/// The routing envelope carried over the radio link.
///
/// Payload bytes are owned by the packet for its lifetime; decoding
/// allocates a fresh buffer sized exactly to the declared payload length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub version: u8,
    /// Raw wire type; see [`Packet::kind`] for the enum view.
    pub packet_type: u8,
    /// Hop budget, decremented by relaying nodes.
    pub ttl: u8,
    /// Milliseconds since epoch.
    pub timestamp: u64,
    pub sender_id: [u8; SENDER_ID_SIZE],
    pub recipient_id: Option<[u8; RECIPIENT_ID_SIZE]>,
    pub payload: Vec<u8>,
    pub signature: Option<[u8; SIGNATURE_SIZE]>,
    pub is_compressed: bool,
}

impl Packet {
    /// Build a broadcast packet with the current timestamp and default version.
    pub fn new(kind: PacketType, ttl: u8, sender_id: [u8; SENDER_ID_SIZE], payload: Vec<u8>) -> Self {
        Self {
            version: PROTOCOL_VERSION,
            packet_type: kind.into(),
            ttl,
            timestamp: current_timestamp_ms(),
            sender_id,
            recipient_id: None,
            payload,
            signature: None,
            is_compressed: false,
        }
    }

    /// The typed view of the wire type byte, if this node understands it.
    pub fn kind(&self) -> Option<PacketType> {
        PacketType::from_u8(self.packet_type)
    }

    /// Flags byte, derived from which optional sections are present.
    pub fn flags(&self) -> u8 {
        let mut flags = 0u8;
        if self.recipient_id.is_some() {
            flags |= flags::HAS_RECIPIENT;
        }
        if self.signature.is_some() {
            flags |= flags::HAS_SIGNATURE;
        }
        if self.is_compressed {
            flags |= flags::IS_COMPRESSED;
        }
        flags
    }

    /// Exact number of bytes `encode_into` will write for this packet.
    pub fn encoded_len(&self) -> usize {
        let mut len = HEADER_SIZE + SENDER_ID_SIZE + self.payload.len();
        if self.recipient_id.is_some() {
            len += RECIPIENT_ID_SIZE;
        }
        if self.signature.is_some() {
            len += SIGNATURE_SIZE;
        }
        len
    }

    /// Encode into a caller-supplied buffer, returning the number of bytes
    /// written.
    ///
    /// # Errors
    /// - [`ProtocolError::OversizedPayload`] if the payload does not fit the
    ///   16-bit length field
    /// - [`ProtocolError::BufferTooSmall`] if `buf` cannot hold the exact
    ///   encoded size
    pub fn encode_into(&self, buf: &mut [u8]) -> Result<usize> {
        if self.payload.len() > MAX_PAYLOAD_SIZE {
            return Err(ProtocolError::OversizedPayload(self.payload.len()));
        }

        let required = self.encoded_len();
        if buf.len() < required {
            return Err(ProtocolError::BufferTooSmall {
                needed: required,
                available: buf.len(),
            });
        }

        let mut out = &mut buf[..required];
        out.put_u8(self.version);
        out.put_u8(self.packet_type);
        out.put_u8(self.ttl);
        out.put_u64(self.timestamp);
        out.put_u8(self.flags());
        out.put_u16(self.payload.len() as u16);
        out.put_slice(&self.sender_id);
        if let Some(recipient) = &self.recipient_id {
            out.put_slice(recipient);
        }
        out.put_slice(&self.payload);
        if let Some(signature) = &self.signature {
            out.put_slice(signature);
        }
        debug_assert!(out.is_empty());

        debug!(
            packet_type = self.packet_type,
            ttl = self.ttl,
            payload_len = self.payload.len(),
            total = required,
            "encoded packet"
        );
        Ok(required)
    }

    /// Encode into a freshly allocated, exactly sized buffer.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; self.encoded_len()];
        self.encode_into(&mut buf)?;
        Ok(buf)
    }

    /// Decode a packet from a complete frame.
    ///
    /// # Errors
    /// - [`ProtocolError::TooShort`] if the input is below header + sender id
    /// - [`ProtocolError::UnsupportedVersion`] on a version mismatch
    /// - [`ProtocolError::Truncated`] if the flags or the declared payload
    ///   length promise more bytes than the buffer holds
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < MIN_PACKET_SIZE {
            warn!(len = data.len(), "packet below minimum size");
            return Err(ProtocolError::TooShort {
                len: data.len(),
                min: MIN_PACKET_SIZE,
            });
        }

        let mut buf = data;

        let version = buf.get_u8();
        if version != PROTOCOL_VERSION {
            warn!(version, "rejected packet with unsupported version");
            return Err(ProtocolError::UnsupportedVersion(version));
        }

        let packet_type = buf.get_u8();
        let ttl = buf.get_u8();
        let timestamp = buf.get_u64();
        let flags = buf.get_u8();
        let payload_length = buf.get_u16() as usize;

        let mut sender_id = [0u8; SENDER_ID_SIZE];
        buf.copy_to_slice(&mut sender_id);

        let recipient_id = if flags & flags::HAS_RECIPIENT != 0 {
            if buf.remaining() < RECIPIENT_ID_SIZE {
                return Err(ProtocolError::Truncated {
                    section: "recipient id",
                    needed: RECIPIENT_ID_SIZE,
                    available: buf.remaining(),
                });
            }
            let mut recipient = [0u8; RECIPIENT_ID_SIZE];
            buf.copy_to_slice(&mut recipient);
            Some(recipient)
        } else {
            None
        };

        if buf.remaining() < payload_length {
            warn!(
                declared = payload_length,
                available = buf.remaining(),
                "payload length runs past end of packet"
            );
            return Err(ProtocolError::Truncated {
                section: "payload",
                needed: payload_length,
                available: buf.remaining(),
            });
        }
        let mut payload = vec![0u8; payload_length];
        buf.copy_to_slice(&mut payload);

        let signature = if flags & flags::HAS_SIGNATURE != 0 {
            if buf.remaining() < SIGNATURE_SIZE {
                return Err(ProtocolError::Truncated {
                    section: "signature",
                    needed: SIGNATURE_SIZE,
                    available: buf.remaining(),
                });
            }
            let mut signature = [0u8; SIGNATURE_SIZE];
            buf.copy_to_slice(&mut signature);
            Some(signature)
        } else {
            None
        };

        debug!(packet_type, ttl, payload_len = payload_length, "decoded packet");

        Ok(Self {
            version,
            packet_type,
            ttl,
            timestamp,
            sender_id,
            recipient_id,
            payload,
            signature,
            is_compressed: flags & flags::IS_COMPRESSED != 0,
        })
    }
}
