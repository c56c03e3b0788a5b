//! In-process transport for tests and local tooling.
//!
//! Frames travel over channels instead of a radio, so full send/receive
//! flows (including relay topologies) can be exercised without hardware.
//! Links are explicit: a node only receives frames from nodes linked to it,
//! which makes multi-hop topologies straightforward to build.

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::warn;

use crate::config::BLE_MTU;
use crate::error::{ProtocolError, Result};
use crate::transport::{ensure_frame_fits, Transport};

/// A channel-backed transport endpoint.
pub struct LoopbackTransport {
    peer_id: [u8; 8],
    links: Vec<([u8; 8], mpsc::UnboundedSender<Vec<u8>>)>,
    inbox_tx: mpsc::UnboundedSender<Vec<u8>>,
    inbox: tokio::sync::Mutex<mpsc::UnboundedReceiver<Vec<u8>>>,
}

impl LoopbackTransport {
    pub fn new(peer_id: [u8; 8]) -> Self {
        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();
        Self {
            peer_id,
            links: Vec::new(),
            inbox_tx,
            inbox: tokio::sync::Mutex::new(inbox_rx),
        }
    }

    /// Connect two endpoints so each can reach the other.
    pub fn link(a: &mut Self, b: &mut Self) {
        a.links.push((b.peer_id, b.inbox_tx.clone()));
        b.links.push((a.peer_id, a.inbox_tx.clone()));
    }

    /// Build a directly connected pair.
    pub fn pair(a_id: [u8; 8], b_id: [u8; 8]) -> (Self, Self) {
        let mut a = Self::new(a_id);
        let mut b = Self::new(b_id);
        Self::link(&mut a, &mut b);
        (a, b)
    }

    /// Receive the next inbound frame. Returns `None` once every linked
    /// sender has been dropped.
    pub async fn recv(&self) -> Option<Vec<u8>> {
        self.inbox.lock().await.recv().await
    }

    /// Receive without waiting; `None` when the inbox is empty.
    pub fn try_recv(&self) -> Option<Vec<u8>> {
        self.inbox.try_lock().ok()?.try_recv().ok()
    }
}

#[async_trait]
impl Transport for LoopbackTransport {
    fn mtu(&self) -> usize {
        BLE_MTU
    }

    async fn broadcast(&self, frame: &[u8]) -> Result<()> {
        ensure_frame_fits(frame, self.mtu())?;
        for (peer_id, sender) in &self.links {
            if sender.send(frame.to_vec()).is_err() {
                warn!(peer_id = ?peer_id, "linked peer is gone, frame dropped");
            }
        }
        Ok(())
    }

    async fn send_to_peer(&self, peer_id: &[u8; 8], frame: &[u8]) -> Result<()> {
        ensure_frame_fits(frame, self.mtu())?;
        let (_, sender) = self
            .links
            .iter()
            .find(|(id, _)| id == peer_id)
            .ok_or_else(|| ProtocolError::TransportError("peer not found".to_string()))?;
        sender
            .send(frame.to_vec())
            .map_err(|_| ProtocolError::TransportError("peer is gone".to_string()))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[tokio::test]
    async fn broadcast_reaches_linked_peer() {
        let (a, b) = LoopbackTransport::pair([1; 8], [2; 8]);
        a.broadcast(b"frame one").await.unwrap();
        assert_eq!(b.recv().await.unwrap(), b"frame one");
    }

    #[tokio::test]
    async fn directed_send_reaches_only_target() {
        let mut a = LoopbackTransport::new([1; 8]);
        let mut b = LoopbackTransport::new([2; 8]);
        let mut c = LoopbackTransport::new([3; 8]);
        LoopbackTransport::link(&mut a, &mut b);
        LoopbackTransport::link(&mut a, &mut c);

        a.send_to_peer(&[2; 8], b"direct").await.unwrap();
        assert_eq!(b.recv().await.unwrap(), b"direct");
        assert!(c.try_recv().is_none());
    }

    #[tokio::test]
    async fn unknown_peer_rejected() {
        let (a, _b) = LoopbackTransport::pair([1; 8], [2; 8]);
        assert!(a.send_to_peer(&[9; 8], b"nope").await.is_err());
    }

    #[tokio::test]
    async fn oversized_frame_rejected() {
        let (a, _b) = LoopbackTransport::pair([1; 8], [2; 8]);
        let frame = vec![0u8; BLE_MTU + 1];
        assert!(a.broadcast(&frame).await.is_err());
    }
}
