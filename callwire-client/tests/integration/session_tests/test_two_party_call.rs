use callwire_client::{BootstrapRole, NegotiatorEvent};
use callwire_core::{MediaKind, ParticipantId, SignalKind, SignalingState};

use crate::integration::init_tracing;
use crate::utils::{CallHarness, eventually, next_event};

#[tokio::test]
async fn test_two_party_call() {
    init_tracing();

    let harness = CallHarness::new("call").await;
    let mut alice = harness.join("alice").await;
    assert_eq!(alice.session.role(), &BootstrapRole::Offerer);

    let mut bob = harness.join("bob").await;
    assert_eq!(
        bob.session.role(),
        &BootstrapRole::Answerer {
            remote: ParticipantId::from("alice")
        }
    );

    let alice_session = &alice.session;
    eventually("alice to apply the answer", move || async move {
        alice_session
            .snapshot()
            .await
            .map(|s| s.signaling == SignalingState::Stable)
            .unwrap_or(false)
    })
    .await
    .unwrap();

    // both see the other's media
    for events in [&mut alice.events, &mut bob.events] {
        let event = next_event(events, |e| matches!(e, NegotiatorEvent::RemoteStream(_)))
            .await
            .expect("no remote stream");
        assert!(matches!(event, NegotiatorEvent::RemoteStream(_)));
    }

    // trickled candidates reach the other side
    harness.network.connection("alice").gather("alice-c1");
    harness.network.connection("bob").gather("bob-c1");

    let network = &harness.network;
    eventually("candidates to cross", move || async move {
        network.connection("bob").applied_candidates() == ["alice-c1"]
            && network.connection("alice").applied_candidates() == ["bob-c1"]
    })
    .await
    .unwrap();

    assert_eq!(harness.count("alice", SignalKind::Offer).await, 1);
    assert_eq!(harness.count("bob", SignalKind::Answer).await, 1);
    assert_eq!(harness.count("bob", SignalKind::Offer).await, 0);

    let snapshot = bob.session.snapshot().await.unwrap();
    assert_eq!(snapshot.signaling, SignalingState::Stable);
    assert_eq!(snapshot.outbound_tracks.len(), 2);
    assert!(
        snapshot
            .outbound_tracks
            .iter()
            .any(|t| t.kind() == MediaKind::Video)
    );

    alice.session.leave().await;
    bob.session.leave().await;
}
