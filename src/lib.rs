//! # meshchat-protocol
//!
//! Binary wire-protocol core for peer-to-peer mesh chat over short-range
//! radio links.
//!
//! Two nested structures cross the wire: the [`Packet`] routing envelope
//! (version, type, hop budget, timestamp, addressing, optional signature)
//! and the [`Message`] chat payload carried opaquely inside it. Both codecs
//! are pure, synchronous functions over caller-owned buffers, with no
//! shared state and no I/O, and treat every inbound length field as hostile.
//!
//! ## Wire Format
//! ```text
//! [Version(1)] [Type(1)] [TTL(1)] [Timestamp(8)] [Flags(1)] [Length(2)]
//! [SenderID(8)] [RecipientID(8)?] [Payload(N)] [Signature(64)?]
//! ```
//! All multi-byte integers are big-endian.
//!
//! ## Example
//! ```rust
//! use meshchat_protocol::{Message, Packet, PacketType};
//!
//! # fn main() -> meshchat_protocol::error::Result<()> {
//! let message = Message::new("alice", "hi mesh");
//! let packet = Packet::new(
//!     PacketType::PublicMessage,
//!     7,
//!     [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08],
//!     message.to_bytes()?,
//! );
//!
//! let frame = packet.to_bytes()?;
//! let decoded = Packet::from_bytes(&frame)?;
//! let chat = Message::from_bytes(&decoded.payload)?;
//! assert_eq!(chat.content, "hi mesh");
//! # Ok(())
//! # }
//! ```
//!
//! ## Security
//! - Length fields are bounds-checked before every read they govern
//! - Decoding allocates exactly the declared payload, never more
//! - Decompression is capped at the protocol payload limit
//! - Key material in the identity record is placeholder random bytes;
//!   real asymmetric primitives plug in at the identity boundary

pub mod config;
pub mod core;
pub mod error;
pub mod identity;
pub mod protocol;
pub mod transport;
pub mod utils;

pub use crate::config::{MeshConfig, PROTOCOL_VERSION};
pub use crate::core::codec::PacketCodec;
pub use crate::core::message::Message;
pub use crate::core::packet::{Packet, PacketType};
pub use crate::error::{ProtocolError, Result};
pub use crate::identity::Identity;
pub use crate::protocol::events::ChatEvent;
pub use crate::protocol::node::MeshNode;
pub use crate::transport::Transport;
