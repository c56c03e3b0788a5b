#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
//! End-to-end flows over the in-process transport: public chat, private
//! chat, compression, and multi-hop flood relay with duplicate suppression.

use meshchat_protocol::config::MeshConfig;
use meshchat_protocol::protocol::events::ChatEvent;
use meshchat_protocol::transport::loopback::LoopbackTransport;
use meshchat_protocol::{Identity, MeshNode};

fn node(
    transport: LoopbackTransport,
    identity: Identity,
    nickname: &str,
) -> MeshNode<LoopbackTransport> {
    let config = MeshConfig::default_with_overrides(|c| {
        c.node.nickname = Some(nickname.to_string());
    });
    MeshNode::new(identity, config, transport)
}

/// Two identities plus a linked transport pair keyed by their peer ids.
fn linked_pair(a_name: &str, b_name: &str) -> (MeshNode<LoopbackTransport>, MeshNode<LoopbackTransport>) {
    let id_a = Identity::generate().unwrap();
    let id_b = Identity::generate().unwrap();
    let (t_a, t_b) = LoopbackTransport::pair(id_a.peer_id, id_b.peer_id);
    (node(t_a, id_a, a_name), node(t_b, id_b, b_name))
}

#[tokio::test]
async fn public_message_end_to_end() {
    let (alice, bob) = linked_pair("alice", "bob");

    let sent = alice.send_public("hello mesh").await.unwrap();
    assert_eq!(sent.sender, "alice");

    let frame = bob.transport().recv().await.unwrap();
    let event = bob.handle_frame(&frame).await.unwrap().unwrap();

    match event {
        ChatEvent::Message {
            sender,
            content,
            timestamp,
            is_private,
        } => {
            assert_eq!(sender, "alice");
            assert_eq!(content, "hello mesh");
            assert_eq!(timestamp, sent.timestamp);
            assert!(!is_private);
        }
        other => panic!("expected Message, got {other:?}"),
    }
}

#[tokio::test]
async fn private_message_end_to_end() {
    let (alice, bob) = linked_pair("alice", "bob");
    let bob_id = bob.identity().peer_id;

    alice.send_private("psst", "bob", bob_id).await.unwrap();

    let frame = bob.transport().recv().await.unwrap();
    let event = bob.handle_frame(&frame).await.unwrap().unwrap();

    match event {
        ChatEvent::Message {
            content,
            is_private,
            ..
        } => {
            assert_eq!(content, "psst");
            assert!(is_private);
        }
        other => panic!("expected private Message, got {other:?}"),
    }
}

#[tokio::test]
async fn private_message_for_someone_else_is_not_consumed() {
    let (alice, bob) = linked_pair("alice", "bob");

    // Addressed to a third party bob has never seen.
    let message = meshchat_protocol::Message::private(alice.nickname(), "not for you", "carol");
    let mut packet = meshchat_protocol::Packet::new(
        meshchat_protocol::PacketType::PrivateMessage,
        7,
        alice.identity().peer_id,
        message.to_bytes().unwrap(),
    );
    packet.recipient_id = Some([0x77; 8]);

    let event = bob.handle_frame(&packet.to_bytes().unwrap()).await.unwrap();
    assert!(event.is_none(), "directed traffic for others is relayed, not read");
}

#[tokio::test]
async fn duplicate_frames_produce_one_event() {
    let (alice, bob) = linked_pair("alice", "bob");

    alice.send_public("once only").await.unwrap();
    let frame = bob.transport().recv().await.unwrap();

    assert!(bob.handle_frame(&frame).await.unwrap().is_some());
    assert!(bob.handle_frame(&frame).await.unwrap().is_none());
    assert!(bob.handle_frame(&frame).await.unwrap().is_none());
}

#[tokio::test]
async fn three_hop_relay_delivers_and_decrements_ttl() {
    // Line topology: alice - bob - carol. Alice and carol are not linked.
    let id_a = Identity::generate().unwrap();
    let id_b = Identity::generate().unwrap();
    let id_c = Identity::generate().unwrap();

    let mut t_a = LoopbackTransport::new(id_a.peer_id);
    let mut t_b = LoopbackTransport::new(id_b.peer_id);
    let mut t_c = LoopbackTransport::new(id_c.peer_id);
    LoopbackTransport::link(&mut t_a, &mut t_b);
    LoopbackTransport::link(&mut t_b, &mut t_c);

    let alice = node(t_a, id_a, "alice");
    let bob = node(t_b, id_b, "bob");
    let carol = node(t_c, id_c, "carol");

    alice.send_public("across the mesh").await.unwrap();

    // Bob consumes and re-floods.
    let frame_at_bob = bob.transport().recv().await.unwrap();
    let bob_event = bob.handle_frame(&frame_at_bob).await.unwrap();
    assert!(bob_event.is_some());

    // Carol sees the relayed copy with one hop spent.
    let frame_at_carol = carol.transport().recv().await.unwrap();
    let original = meshchat_protocol::Packet::from_bytes(&frame_at_bob).unwrap();
    let relayed = meshchat_protocol::Packet::from_bytes(&frame_at_carol).unwrap();
    assert_eq!(relayed.ttl, original.ttl - 1);
    assert_eq!(relayed.payload, original.payload);

    let carol_event = carol.handle_frame(&frame_at_carol).await.unwrap().unwrap();
    match carol_event {
        ChatEvent::Message { content, .. } => assert_eq!(content, "across the mesh"),
        other => panic!("expected Message, got {other:?}"),
    }

    // The relay also bounced back to alice; she ignores her own packet.
    let frame_back_at_alice = alice.transport().recv().await.unwrap();
    assert!(alice
        .handle_frame(&frame_back_at_alice)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn exhausted_ttl_is_not_relayed() {
    let (alice, bob) = linked_pair("alice", "bob");

    let message = meshchat_protocol::Message::new("alice", "last hop");
    let packet = meshchat_protocol::Packet::new(
        meshchat_protocol::PacketType::PublicMessage,
        1,
        alice.identity().peer_id,
        message.to_bytes().unwrap(),
    );

    // Bob consumes it but must not re-broadcast a dead packet.
    let event = bob.handle_frame(&packet.to_bytes().unwrap()).await.unwrap();
    assert!(event.is_some());
    assert!(alice.transport().try_recv().is_none());
}

#[tokio::test]
async fn compressed_payload_end_to_end() {
    let id_a = Identity::generate().unwrap();
    let id_b = Identity::generate().unwrap();
    let (t_a, t_b) = LoopbackTransport::pair(id_a.peer_id, id_b.peer_id);

    let config = MeshConfig::default_with_overrides(|c| {
        c.node.nickname = Some("alice".to_string());
        c.transport.compression_enabled = true;
        c.transport.compression_threshold_bytes = 32;
    });
    let alice = MeshNode::new(id_a, config, t_a);
    let bob = node(t_b, id_b, "bob");

    let content = "repetition repetition repetition repetition repetition";
    alice.send_public(content).await.unwrap();

    let frame = bob.transport().recv().await.unwrap();
    let packet = meshchat_protocol::Packet::from_bytes(&frame).unwrap();
    assert!(packet.is_compressed, "payload above threshold compresses");

    let event = bob.handle_frame(&frame).await.unwrap().unwrap();
    match event {
        ChatEvent::Message { content: got, .. } => assert_eq!(got, content),
        other => panic!("expected Message, got {other:?}"),
    }
}

#[tokio::test]
async fn announcement_flow_updates_peer_knowledge() {
    let (alice, bob) = linked_pair("alice", "bob");

    alice.announce().await.unwrap();
    let frame = bob.transport().recv().await.unwrap();
    let event = bob.handle_frame(&frame).await.unwrap().unwrap();

    assert_eq!(
        event,
        ChatEvent::PeerConnected {
            nickname: "alice".to_string(),
            peer_id: alice.identity().peer_id,
        }
    );
}
