use crate::core::packet::{Packet, PacketType};
use crate::error::{ProtocolError, Result};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

type HandlerFn = dyn Fn(&Packet) -> Result<Option<Packet>> + Send + Sync + 'static;

/// Routes inbound packets to per-type handlers.
///
/// A handler may return a reply packet (a sync response, a delivery ack)
/// which the caller is expected to transmit. Packets whose type byte maps
/// to no registered handler are rejected with `UnexpectedPacket` so the
/// caller can decide whether to drop or relay them.
pub struct Dispatcher {
    handlers: Arc<RwLock<HashMap<u8, Box<HandlerFn>>>>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    pub fn new() -> Self {
        Self {
            handlers: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn register<F>(&self, kind: PacketType, handler: F) -> Result<()>
    where
        F: Fn(&Packet) -> Result<Option<Packet>> + Send + Sync + 'static,
    {
        let mut handlers = self.handlers.write().map_err(|_| {
            ProtocolError::TransportError("Failed to acquire write lock on dispatcher".to_string())
        })?;

        handlers.insert(kind.into(), Box::new(handler));
        Ok(())
    }

    pub fn dispatch(&self, packet: &Packet) -> Result<Option<Packet>> {
        let handlers = self.handlers.read().map_err(|_| {
            ProtocolError::TransportError("Failed to acquire read lock on dispatcher".to_string())
        })?;

        handlers
            .get(&packet.packet_type)
            .ok_or(ProtocolError::UnexpectedPacket)
            .and_then(|handler| handler(packet))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn packet_of(kind: PacketType) -> Packet {
        Packet::new(kind, 7, [1; 8], vec![])
    }

    #[test]
    fn routes_to_registered_handler() {
        let dispatcher = Dispatcher::new();
        dispatcher
            .register(PacketType::SyncRequest, |packet| {
                let mut reply = packet.clone();
                reply.packet_type = PacketType::SyncResponse.into();
                Ok(Some(reply))
            })
            .unwrap();

        let reply = dispatcher
            .dispatch(&packet_of(PacketType::SyncRequest))
            .unwrap()
            .unwrap();
        assert_eq!(reply.kind(), Some(PacketType::SyncResponse));
    }

    #[test]
    fn unregistered_type_is_unexpected() {
        let dispatcher = Dispatcher::new();
        assert!(matches!(
            dispatcher.dispatch(&packet_of(PacketType::DeliveryAck)),
            Err(ProtocolError::UnexpectedPacket)
        ));
    }

    #[test]
    fn later_registration_wins() {
        let dispatcher = Dispatcher::new();
        dispatcher
            .register(PacketType::Announcement, |_| Ok(None))
            .unwrap();
        dispatcher
            .register(PacketType::Announcement, |packet| Ok(Some(packet.clone())))
            .unwrap();

        let result = dispatcher
            .dispatch(&packet_of(PacketType::Announcement))
            .unwrap();
        assert!(result.is_some());
    }
}
