//! Flood-relay policy: TTL budgeting and duplicate suppression.
//!
//! Every node re-broadcasts packets it has not seen, with the hop budget
//! decremented, until the budget runs out. The seen-cache bounds memory
//! with both a TTL and a FIFO capacity limit so a chatty or hostile mesh
//! cannot grow it without bound.

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};
use tracing::{debug, trace};

use crate::core::packet::Packet;

/// Identity of a flooded packet for deduplication purposes.
///
/// Packets carry no message id at the envelope level, so the originator id
/// plus the millisecond timestamp stands in for one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct SeenKey {
    sender_id: [u8; 8],
    timestamp: u64,
}

/// Cache of recently seen packets with automatic expiration and O(1)
/// oldest-first eviction.
#[derive(Debug)]
pub struct SeenCache {
    entries: HashMap<SeenKey, Instant>,
    /// Insertion order for FIFO eviction when the cache is full.
    insertion_order: VecDeque<SeenKey>,
    ttl: Duration,
    max_entries: usize,
}

impl SeenCache {
    /// Default retention: 5 minutes and 1024 packets, several times the
    /// worst-case flood diameter of a small mesh.
    pub fn new() -> Self {
        Self::with_settings(Duration::from_secs(300), 1024)
    }

    pub fn with_settings(ttl: Duration, max_entries: usize) -> Self {
        Self {
            entries: HashMap::new(),
            insertion_order: VecDeque::new(),
            ttl,
            max_entries,
        }
    }

    /// Check whether this packet was already seen recently, recording it
    /// if not. Returns true for duplicates.
    pub fn is_duplicate(&mut self, packet: &Packet) -> bool {
        let key = SeenKey {
            sender_id: packet.sender_id,
            timestamp: packet.timestamp,
        };

        self.cleanup_expired();

        if self.entries.contains_key(&key) {
            debug!(
                sender_id = ?packet.sender_id,
                timestamp = packet.timestamp,
                "duplicate packet suppressed"
            );
            return true;
        }

        if self.entries.len() >= self.max_entries {
            let to_remove = self.entries.len() - self.max_entries + 1;
            self.remove_oldest_entries(to_remove);
        }

        self.entries.insert(key.clone(), Instant::now());
        self.insertion_order.push_back(key);
        trace!(timestamp = packet.timestamp, "packet recorded as seen");

        false
    }

    /// Number of packets currently tracked.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.insertion_order.clear();
    }

    fn cleanup_expired(&mut self) {
        let now = Instant::now();
        self.entries
            .retain(|_, added_at| now.duration_since(*added_at) < self.ttl);

        // Keep the eviction queue consistent with the map.
        while let Some(key) = self.insertion_order.front() {
            if !self.entries.contains_key(key) {
                self.insertion_order.pop_front();
            } else {
                break;
            }
        }
    }

    fn remove_oldest_entries(&mut self, count: usize) {
        for _ in 0..count {
            if let Some(key) = self.insertion_order.pop_front() {
                self.entries.remove(&key);
            }
        }
    }
}

impl Default for SeenCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Produce the relayed copy of a packet, or `None` when its hop budget is
/// exhausted. The relayed copy is byte-identical apart from the TTL.
pub fn prepare_relay(packet: &Packet) -> Option<Packet> {
    if packet.ttl <= 1 {
        trace!(ttl = packet.ttl, "hop budget exhausted, not relaying");
        return None;
    }
    let mut relayed = packet.clone();
    relayed.ttl -= 1;
    Some(relayed)
}
