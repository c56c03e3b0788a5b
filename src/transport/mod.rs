//! # Transport Layer
//!
//! The boundary between the codecs and whatever carries the bytes.
//!
//! The codecs never perform I/O; a [`Transport`] accepts fully encoded
//! packet frames and enforces the single-frame MTU. Fragmenting a frame
//! across multiple radio writes, and reassembling it, is transport
//! territory and is not implemented here.
//!
//! ## Components
//! - **Ble**: peer table and placeholder radio transport
//! - **Loopback**: in-process transport pair for tests and local tooling

use async_trait::async_trait;

use crate::error::{ProtocolError, Result};

pub mod ble;
pub mod loopback;

/// A link capable of carrying encoded packet frames.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Largest frame a single send may carry.
    fn mtu(&self) -> usize;

    /// Deliver a frame to every reachable peer.
    async fn broadcast(&self, frame: &[u8]) -> Result<()>;

    /// Deliver a frame to one peer.
    async fn send_to_peer(&self, peer_id: &[u8; 8], frame: &[u8]) -> Result<()>;
}

/// Reject frames that cannot be carried in a single send.
pub(crate) fn ensure_frame_fits(frame: &[u8], mtu: usize) -> Result<()> {
    if frame.len() > mtu {
        return Err(ProtocolError::TransportError(format!(
            "frame of {} bytes exceeds {mtu}-byte MTU",
            frame.len()
        )));
    }
    Ok(())
}
