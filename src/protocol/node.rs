//! Node wiring: identity + codecs + transport.
//!
//! Outbound: a [`Message`] is encoded, optionally compressed, wrapped in a
//! [`Packet`], and handed to the transport. Inbound reverses it: decode the
//! envelope, suppress duplicates, decompress, and (only for chat packet
//! types) decode the payload into a [`ChatEvent`]. Fresh packets are
//! re-flooded with a decremented hop budget.

use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::config::MeshConfig;
use crate::core::message::Message;
use crate::core::packet::{Packet, PacketType};
use crate::error::Result;
use crate::identity::Identity;
use crate::protocol::events::ChatEvent;
use crate::protocol::relay::{prepare_relay, SeenCache};
use crate::transport::Transport;
use crate::utils::compression::{maybe_compress, maybe_decompress};

/// A chat node on the mesh.
pub struct MeshNode<T: Transport> {
    identity: Identity,
    config: MeshConfig,
    transport: T,
    seen: Mutex<SeenCache>,
}

impl<T: Transport> MeshNode<T> {
    pub fn new(identity: Identity, config: MeshConfig, transport: T) -> Self {
        Self {
            identity,
            config,
            transport,
            seen: Mutex::new(SeenCache::new()),
        }
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Display nickname: the config override when present, otherwise the
    /// identity's stored nickname.
    pub fn nickname(&self) -> &str {
        self.config
            .node
            .nickname
            .as_deref()
            .unwrap_or_else(|| self.identity.nickname())
    }

    /// Broadcast a public chat message. Returns the message as sent.
    pub async fn send_public(&self, content: &str) -> Result<Message> {
        let mut message = Message::new(self.nickname(), content);
        message.sender_peer_id = self.identity.peer_id_hex();

        let packet = self.wrap(PacketType::PublicMessage, message.to_bytes()?)?;
        self.remember_own(&packet).await;
        self.transport.broadcast(&packet.to_bytes()?).await?;

        debug!(id = %message.id, "public message sent");
        Ok(message)
    }

    /// Send a private chat message to one peer.
    pub async fn send_private(
        &self,
        content: &str,
        recipient_nickname: &str,
        recipient_id: [u8; 8],
    ) -> Result<Message> {
        let mut message = Message::private(self.nickname(), content, recipient_nickname);
        message.sender_peer_id = self.identity.peer_id_hex();

        let mut packet = self.wrap(PacketType::PrivateMessage, message.to_bytes()?)?;
        packet.recipient_id = Some(recipient_id);
        self.remember_own(&packet).await;
        self.transport
            .send_to_peer(&recipient_id, &packet.to_bytes()?)
            .await?;

        debug!(id = %message.id, "private message sent");
        Ok(message)
    }

    /// Announce this node's presence, carrying its nickname as payload.
    pub async fn announce(&self) -> Result<()> {
        let packet = self.wrap(
            PacketType::Announcement,
            self.nickname().as_bytes().to_vec(),
        )?;
        self.remember_own(&packet).await;
        self.transport.broadcast(&packet.to_bytes()?).await
    }

    /// Handle one inbound frame, returning the event it produced, if any.
    ///
    /// Duplicate frames and this node's own flooded frames produce nothing.
    /// Fresh frames are re-broadcast with a decremented hop budget, whether
    /// or not this node could interpret them.
    pub async fn handle_frame(&self, frame: &[u8]) -> Result<Option<ChatEvent>> {
        let packet = Packet::from_bytes(frame)?;

        if packet.sender_id == self.identity.peer_id {
            return Ok(None);
        }
        if self.seen.lock().await.is_duplicate(&packet) {
            return Ok(None);
        }

        let addressed_to_us = packet
            .recipient_id
            .is_none_or(|recipient| recipient == self.identity.peer_id);

        let event = if addressed_to_us {
            self.consume(&packet)?
        } else {
            None
        };

        // A packet addressed to us has reached its destination; everything
        // else floods onward while its hop budget lasts.
        if packet.recipient_id.is_none() || !addressed_to_us {
            if let Some(relayed) = prepare_relay(&packet) {
                let relay_frame = relayed.to_bytes()?;
                if let Err(e) = self.transport.broadcast(&relay_frame).await {
                    warn!(error = %e, "relay broadcast failed");
                }
            }
        }

        Ok(event)
    }

    /// Interpret a packet addressed to (or broadcast past) this node.
    fn consume(&self, packet: &Packet) -> Result<Option<ChatEvent>> {
        match packet.kind() {
            Some(PacketType::PublicMessage) | Some(PacketType::PrivateMessage) => {
                let payload = maybe_decompress(&packet.payload, packet.is_compressed)?;
                let message = Message::from_bytes(&payload)?;
                Ok(Some(ChatEvent::Message {
                    sender: message.sender,
                    content: message.content,
                    timestamp: message.timestamp,
                    is_private: message.is_private,
                }))
            }
            Some(PacketType::Announcement) => {
                let nickname = String::from_utf8_lossy(&packet.payload).into_owned();
                Ok(Some(ChatEvent::PeerConnected {
                    nickname,
                    peer_id: packet.sender_id,
                }))
            }
            // Sync, handshake, and ack handling live above this layer.
            Some(_) => Ok(None),
            None => {
                debug!(packet_type = packet.packet_type, "unknown packet type");
                Ok(None)
            }
        }
    }

    fn wrap(&self, kind: PacketType, payload: Vec<u8>) -> Result<Packet> {
        let (payload, compressed) = if self.config.transport.compression_enabled {
            maybe_compress(&payload, self.config.transport.compression_threshold_bytes)
        } else {
            (payload, false)
        };

        let mut packet = Packet::new(
            kind,
            self.config.node.default_ttl,
            self.identity.peer_id,
            payload,
        );
        packet.is_compressed = compressed;
        Ok(packet)
    }

    /// Record our own outbound packet so flooded copies of it are
    /// suppressed when they come back around.
    async fn remember_own(&self, packet: &Packet) {
        self.seen.lock().await.is_duplicate(packet);
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::transport::loopback::LoopbackTransport;

    fn node_with(transport: LoopbackTransport) -> MeshNode<LoopbackTransport> {
        let identity = Identity::generate().unwrap();
        MeshNode::new(identity, MeshConfig::default(), transport)
    }

    #[tokio::test]
    async fn own_flooded_frame_is_ignored() {
        let (a_link, b_link) = LoopbackTransport::pair([1; 8], [2; 8]);
        let node = node_with(a_link);
        let _ = b_link; // keep the pair alive

        // A copy of our own packet coming back around the mesh.
        let message = Message::new(node.nickname(), "hello");
        let packet = Packet::new(
            PacketType::PublicMessage,
            7,
            node.identity().peer_id,
            message.to_bytes().unwrap(),
        );

        let event = node.handle_frame(&packet.to_bytes().unwrap()).await.unwrap();
        assert!(event.is_none());
    }

    #[tokio::test]
    async fn announcement_becomes_peer_event() {
        let (a_link, b_link) = LoopbackTransport::pair([1; 8], [2; 8]);
        let node_a = node_with(a_link);
        let node_b = node_with(b_link);

        node_a.announce().await.unwrap();
        let frame = node_b.transport().recv().await.unwrap();
        let event = node_b.handle_frame(&frame).await.unwrap().unwrap();

        match event {
            ChatEvent::PeerConnected { nickname, peer_id } => {
                assert_eq!(nickname, node_a.nickname());
                assert_eq!(peer_id, node_a.identity().peer_id);
            }
            other => panic!("expected PeerConnected, got {other:?}"),
        }
    }
}
