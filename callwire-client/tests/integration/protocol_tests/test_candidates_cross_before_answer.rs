use callwire_client::BootstrapRole;
use callwire_core::{IceCandidate, SignalChannel, SignalKind, SignalingState};

use crate::integration::init_tracing;
use crate::utils::{protocol_channel, protocol_peer, published_by};

/// Both sides trickle two candidates before the answer reaches the offerer.
#[tokio::test]
async fn test_candidates_cross_before_answer() {
    init_tracing();

    let (channel, room) = protocol_channel("trickle").await;
    let mut alice = protocol_peer("alice", &room, &channel).await;
    let mut bob = protocol_peer("bob", &room, &channel).await;

    let role = alice.protocol.bootstrap(Vec::new()).await.unwrap();
    assert_eq!(role, BootstrapRole::Offerer);
    for c in ["a1", "a2"] {
        alice
            .protocol
            .publish_candidate(IceCandidate::new(c))
            .await
            .unwrap();
    }

    let history = channel.replay(&room).await.unwrap();
    bob.protocol.bootstrap(history).await.unwrap();
    for c in ["b1", "b2"] {
        bob.protocol
            .publish_candidate(IceCandidate::new(c))
            .await
            .unwrap();
    }
    assert_eq!(bob.connection.applied_candidates(), ["a1", "a2"]);

    // bob's candidates overtake his answer on the way to alice
    let mut from_bob = published_by(&channel, &room, "bob").await;
    from_bob.sort_by_key(|m| m.kind() == SignalKind::Answer);
    for message in from_bob {
        alice.protocol.handle_message(message).await.unwrap();
        if alice.protocol.negotiator().signaling_state() == SignalingState::HaveLocalOffer {
            assert!(alice.protocol.negotiator().pending_candidate_count() > 0);
        }
    }

    assert_eq!(
        alice.protocol.negotiator().signaling_state(),
        SignalingState::Stable
    );
    assert_eq!(alice.protocol.negotiator().pending_candidate_count(), 0);
    assert_eq!(alice.connection.applied_candidates(), ["b1", "b2"]);
}
