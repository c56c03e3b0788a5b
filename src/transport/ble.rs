//! BLE transport: peer tracking and the radio-facing placeholder.
//!
//! The service and characteristic UUIDs below identify this chat network on
//! air and match the values other implementations of the format advertise.
//! Actual advertising, scanning, and characteristic I/O require a radio
//! backend; until one is wired in, the send paths validate and log frames
//! without putting anything on air, exactly like the device firmware this
//! transport mirrors.

use async_trait::async_trait;
use bytes::BytesMut;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, RwLock};
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::config::{BLE_MTU, MAX_PEERS};
use crate::error::{ProtocolError, Result};
use crate::identity::Identity;
use crate::transport::{ensure_frame_fits, Transport};

/// Service UUID F47B5E2D-4A9E-4C5A-9B3F-8E1D2C3A4B5C, little-endian byte order.
pub const SERVICE_UUID: [u8; 16] = [
    0x5C, 0x4B, 0x3A, 0x2C, 0x1D, 0x8E, 0x3F, 0x9B, 0x5A, 0x4C, 0x9E, 0x4A, 0x2D, 0x5E, 0x7B,
    0xF4,
];

/// Characteristic UUID A1B2C3D4-E5F6-4A5B-8C9D-0E1F2A3B4C5D, little-endian byte order.
pub const CHARACTERISTIC_UUID: [u8; 16] = [
    0x5D, 0x4C, 0x3B, 0x2A, 0x1F, 0x0E, 0x9D, 0x8C, 0x5B, 0x4A, 0xF6, 0xE5, 0xD4, 0xC3, 0xB2,
    0xA1,
];

/// A peer currently visible on the radio link.
#[derive(Debug, Clone)]
pub struct BlePeer {
    pub peer_id: [u8; 8],
    pub nickname: String,
    pub connected: bool,
    pub last_seen: Instant,
}

/// Placeholder BLE transport with a bounded peer table.
pub struct BleTransport {
    local_peer_id: RwLock<[u8; 8]>,
    peers: RwLock<Vec<BlePeer>>,
    active: AtomicBool,
    /// Scratch space for frames arriving split across characteristic
    /// writes. Sized at two MTUs; a reassembly protocol for frames larger
    /// than one MTU has not been defined for this format.
    rx_buffer: Mutex<BytesMut>,
}

impl BleTransport {
    pub fn new() -> Self {
        info!("BLE transport initialized");
        Self {
            local_peer_id: RwLock::new([0u8; 8]),
            peers: RwLock::new(Vec::new()),
            active: AtomicBool::new(false),
            rx_buffer: Mutex::new(BytesMut::with_capacity(BLE_MTU * 2)),
        }
    }

    /// Begin advertising and scanning as `identity`.
    pub fn start(&self, identity: &Identity) {
        if self.active.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Ok(mut local) = self.local_peer_id.write() {
            *local = identity.peer_id;
        }
        info!(peer_id = %identity.peer_id_hex(), "BLE started");
    }

    /// Stop advertising and scanning and drop the peer table.
    pub fn stop(&self) {
        if !self.active.swap(false, Ordering::SeqCst) {
            return;
        }
        if let Ok(mut peers) = self.peers.write() {
            peers.clear();
        }
        if let Ok(mut rx) = self.rx_buffer.lock() {
            rx.clear();
        }
        info!("BLE stopped");
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Peer id this transport advertises as, set by `start`.
    pub fn local_peer_id(&self) -> [u8; 8] {
        self.local_peer_id.read().map(|id| *id).unwrap_or([0u8; 8])
    }

    /// Record a peer sighting, updating its entry or inserting a new one.
    /// The table is capped; sightings beyond the cap are dropped.
    pub fn record_peer(&self, peer_id: [u8; 8], nickname: &str) {
        let Ok(mut peers) = self.peers.write() else {
            return;
        };
        if let Some(peer) = peers.iter_mut().find(|p| p.peer_id == peer_id) {
            peer.nickname = nickname.to_string();
            peer.connected = true;
            peer.last_seen = Instant::now();
            return;
        }
        if peers.len() >= MAX_PEERS {
            warn!(max = MAX_PEERS, "peer table full, ignoring new peer");
            return;
        }
        peers.push(BlePeer {
            peer_id,
            nickname: nickname.to_string(),
            connected: true,
            last_seen: Instant::now(),
        });
        debug!(nickname, "peer recorded");
    }

    pub fn mark_disconnected(&self, peer_id: &[u8; 8]) {
        if let Ok(mut peers) = self.peers.write() {
            if let Some(peer) = peers.iter_mut().find(|p| p.peer_id == *peer_id) {
                peer.connected = false;
            }
        }
    }

    /// Snapshot of the current peer table.
    pub fn peers(&self) -> Vec<BlePeer> {
        self.peers.read().map(|p| p.clone()).unwrap_or_default()
    }

    fn ensure_active(&self) -> Result<()> {
        if !self.is_active() {
            return Err(ProtocolError::TransportError(
                "BLE transport is not active".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for BleTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for BleTransport {
    fn mtu(&self) -> usize {
        BLE_MTU
    }

    async fn broadcast(&self, frame: &[u8]) -> Result<()> {
        self.ensure_active()?;
        ensure_frame_fits(frame, self.mtu())?;

        let peer_count = self.peers.read().map(|p| p.len()).unwrap_or(0);
        debug!(bytes = frame.len(), peers = peer_count, "broadcasting frame");
        // Characteristic writes happen here once a radio backend exists.
        Ok(())
    }

    async fn send_to_peer(&self, peer_id: &[u8; 8], frame: &[u8]) -> Result<()> {
        self.ensure_active()?;
        ensure_frame_fits(frame, self.mtu())?;

        let known = self
            .peers
            .read()
            .map(|p| p.iter().any(|peer| peer.peer_id == *peer_id))
            .unwrap_or(false);
        if !known {
            warn!("peer not found");
            return Err(ProtocolError::TransportError("peer not found".to_string()));
        }

        debug!(bytes = frame.len(), "sending frame to peer");
        // Characteristic write happens here once a radio backend exists.
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn started_transport() -> (BleTransport, Identity) {
        let transport = BleTransport::new();
        let identity = Identity::generate().unwrap();
        transport.start(&identity);
        (transport, identity)
    }

    #[tokio::test]
    async fn broadcast_requires_active_transport() {
        let transport = BleTransport::new();
        assert!(transport.broadcast(&[0u8; 32]).await.is_err());
    }

    #[tokio::test]
    async fn broadcast_rejects_oversized_frame() {
        let (transport, _identity) = started_transport();
        let frame = vec![0u8; BLE_MTU + 1];
        assert!(transport.broadcast(&frame).await.is_err());
        assert!(transport.broadcast(&frame[..BLE_MTU]).await.is_ok());
    }

    #[tokio::test]
    async fn send_to_unknown_peer_fails() {
        let (transport, _identity) = started_transport();
        assert!(transport.send_to_peer(&[9; 8], &[0u8; 8]).await.is_err());

        transport.record_peer([9; 8], "bob");
        assert!(transport.send_to_peer(&[9; 8], &[0u8; 8]).await.is_ok());
    }

    #[test]
    fn peer_table_is_capped() {
        let (transport, _identity) = started_transport();
        for i in 0..(MAX_PEERS as u8 + 4) {
            transport.record_peer([i; 8], &format!("peer{i}"));
        }
        assert_eq!(transport.peers().len(), MAX_PEERS);
    }

    #[test]
    fn record_peer_updates_existing_entry() {
        let (transport, _identity) = started_transport();
        transport.record_peer([1; 8], "old");
        transport.record_peer([1; 8], "new");

        let peers = transport.peers();
        assert_eq!(peers.len(), 1);
        assert_eq!(peers[0].nickname, "new");
    }

    #[test]
    fn start_adopts_identity_peer_id() {
        let transport = BleTransport::new();
        assert_eq!(transport.local_peer_id(), [0u8; 8]);

        let identity = Identity::generate().unwrap();
        transport.start(&identity);
        assert!(transport.is_active());
        assert_eq!(transport.local_peer_id(), identity.peer_id);
    }

    #[test]
    fn stop_clears_peer_table() {
        let (transport, identity) = started_transport();
        transport.record_peer([1; 8], "bob");
        transport.stop();
        assert!(!transport.is_active());
        assert!(transport.peers().is_empty());

        transport.start(&identity);
        assert!(transport.peers().is_empty());
    }
}
