//! Tokio codec adapter for running the packet format over byte streams.
//!
//! The radio link delivers whole frames, but test harnesses and bridge
//! transports (unix sockets, TCP tunnels) deliver a byte stream. This codec
//! frames that stream into packets. The total frame length is computable
//! from the fixed header alone, so the decoder simply waits until a complete
//! frame has arrived and then hands it to [`Packet::from_bytes`]; partial
//! frames are never decoded.

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use crate::config::{
    HEADER_SIZE, MIN_PACKET_SIZE, PROTOCOL_VERSION, RECIPIENT_ID_SIZE, SENDER_ID_SIZE,
    SIGNATURE_SIZE,
};
use crate::core::packet::{flags, Packet};
use crate::error::{ProtocolError, Result};

/// Frames a byte stream into [`Packet`]s and back.
pub struct PacketCodec;

impl Decoder for PacketCodec {
    type Item = Packet;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Packet>> {
        if src.len() < MIN_PACKET_SIZE {
            return Ok(None);
        }

        // A bad version byte means the stream cannot be re-synchronized.
        if src[0] != PROTOCOL_VERSION {
            return Err(ProtocolError::UnsupportedVersion(src[0]));
        }

        let header_flags = src[11];
        let payload_length = u16::from_be_bytes([src[12], src[13]]) as usize;

        let mut total = HEADER_SIZE + SENDER_ID_SIZE + payload_length;
        if header_flags & flags::HAS_RECIPIENT != 0 {
            total += RECIPIENT_ID_SIZE;
        }
        if header_flags & flags::HAS_SIGNATURE != 0 {
            total += SIGNATURE_SIZE;
        }

        if src.len() < total {
            src.reserve(total - src.len());
            return Ok(None);
        }

        let frame = src.split_to(total);
        Packet::from_bytes(&frame).map(Some)
    }
}

impl Encoder<Packet> for PacketCodec {
    type Error = ProtocolError;

    fn encode(&mut self, packet: Packet, dst: &mut BytesMut) -> Result<()> {
        let bytes = packet.to_bytes()?;
        dst.extend_from_slice(&bytes);
        Ok(())
    }
}
