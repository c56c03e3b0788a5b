//! Events surfaced to the application layer.
//!
//! Inbound handling reduces raw frames to these events; the UI layer only
//! ever sees them, never wire bytes.

/// What the mesh reported to the application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    /// A chat message arrived (public or addressed to this node).
    Message {
        sender: String,
        content: String,
        timestamp: u64,
        is_private: bool,
    },
    /// A peer announced itself or connected.
    PeerConnected { nickname: String, peer_id: [u8; 8] },
    /// A peer departed or timed out.
    PeerDisconnected { peer_id: [u8; 8] },
}
