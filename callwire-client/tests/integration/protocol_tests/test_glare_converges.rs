use callwire_core::{SignalKind, SignalPayload, SignalingState};

use crate::integration::init_tracing;
use crate::utils::{ProtocolPeer, count_kind, protocol_channel, protocol_peer, published_by};

async fn deliver_answers(
    from: &str,
    to: &mut ProtocolPeer,
    channel: &callwire_relay::MemorySignalChannel,
    room: &callwire_core::RoomId,
) {
    for message in published_by(channel, room, from).await {
        if message.kind() == SignalKind::Answer {
            to.protocol.handle_message(message).await.unwrap();
        }
    }
}

async fn simultaneous_offers(alice_hears_first: bool) {
    let (channel, room) = protocol_channel("glare").await;
    let mut alice = protocol_peer("alice", &room, &channel).await;
    let mut bob = protocol_peer("bob", &room, &channel).await;

    // both saw an empty log, so both offer
    alice.protocol.bootstrap(Vec::new()).await.unwrap();
    bob.protocol.bootstrap(Vec::new()).await.unwrap();

    let offer_a = published_by(&channel, &room, "alice").await.remove(0);
    let offer_b = published_by(&channel, &room, "bob").await.remove(0);
    assert!(offer_a.seq < offer_b.seq);

    if alice_hears_first {
        alice.protocol.handle_message(offer_b).await.unwrap();
        bob.protocol.handle_message(offer_a.clone()).await.unwrap();
    } else {
        bob.protocol.handle_message(offer_a.clone()).await.unwrap();
        alice.protocol.handle_message(offer_b).await.unwrap();
    }
    deliver_answers("bob", &mut alice, &channel, &room).await;
    deliver_answers("alice", &mut bob, &channel, &room).await;

    let SignalPayload::Offer(offer_a) = offer_a.payload else {
        panic!("expected an offer");
    };

    // the earlier offer wins on both sides
    assert_eq!(alice.protocol.negotiator().signaling_state(), SignalingState::Stable);
    assert_eq!(bob.protocol.negotiator().signaling_state(), SignalingState::Stable);
    assert_eq!(alice.connection.local_description(), Some(offer_a.clone()));
    assert_eq!(bob.connection.remote_description(), Some(offer_a));
    assert_eq!(
        alice.connection.remote_description(),
        bob.connection.local_description()
    );
    assert_eq!(alice.connection.rollbacks(), 0);
    assert_eq!(bob.connection.rollbacks(), 1);

    let log = published_by(&channel, &room, "bob").await;
    assert_eq!(count_kind(&log, "bob", SignalKind::Answer), 1);
    let log = published_by(&channel, &room, "alice").await;
    assert_eq!(count_kind(&log, "alice", SignalKind::Answer), 0);
}

#[tokio::test]
async fn test_glare_converges_when_earlier_offerer_hears_first() {
    init_tracing();
    simultaneous_offers(true).await;
}

#[tokio::test]
async fn test_glare_converges_when_later_offerer_hears_first() {
    init_tracing();
    simultaneous_offers(false).await;
}
