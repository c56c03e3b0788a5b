//! # Core Wire Format
//!
//! Binary encode/decode for the two structures that cross the radio link.
//!
//! This module is the heart of the crate: the routing envelope ([`packet`])
//! and the chat payload carried inside it ([`message`]), plus a framing
//! adapter ([`codec`]) for byte-stream transports.
//!
//! ## Wire Format
//! ```text
//! [Version(1)] [Type(1)] [TTL(1)] [Timestamp(8)] [Flags(1)] [Length(2)]
//! [SenderID(8)] [RecipientID(8)?] [Payload(N)] [Signature(64)?]
//! ```
//!
//! ## Security
//! - Every length field is validated before any read it governs
//! - Decoding allocates exactly the declared payload, never more
//! - Malformed input from untrusted peers is rejected, never over-read

pub mod codec;
pub mod message;
pub mod packet;
