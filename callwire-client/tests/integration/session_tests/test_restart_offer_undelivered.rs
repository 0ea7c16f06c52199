use std::time::Duration;

use callwire_client::{ConnectionEvent, NegotiatorEvent};
use callwire_core::{ChannelError, ConnectivityState, SignalingState};

use crate::integration::init_tracing;
use crate::utils::{CallHarness, FlakyChannel, Participant, eventually, next_event};

async fn settle(participant: &Participant) {
    let session = &participant.session;
    eventually("signaling to reach stable", move || async move {
        session
            .snapshot()
            .await
            .map(|s| s.signaling == SignalingState::Stable)
            .unwrap_or(false)
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn test_undelivered_restart_offer_gives_up() {
    init_tracing();

    let harness = CallHarness::new("undelivered").await;
    let flaky = FlakyChannel::new();
    let mut alice = harness.join_over("alice", flaky.clone()).await;
    let bob = harness.join_over("bob", flaky.clone()).await;
    settle(&alice).await;
    settle(&bob).await;

    let alice_conn = harness.network.connection("alice");
    alice_conn.emit(ConnectionEvent::Connectivity(ConnectivityState::Connected));

    // the relay stays unreachable for the rest of the test
    flaky.fail_next(ChannelError::Transport("connection reset".into()), 100);
    alice_conn.emit(ConnectionEvent::Connectivity(ConnectivityState::Failed));

    let lost = next_event(&mut alice.events, |e| {
        matches!(e, NegotiatorEvent::ConnectionLost { .. })
    })
    .await
    .expect("ConnectionLost not emitted");
    let NegotiatorEvent::ConnectionLost { reason } = lost else {
        unreachable!();
    };
    assert!(reason.contains("could not be delivered"), "{}", reason);

    // later loop wakeups must not mint fresh restart offers
    for i in 0..5 {
        alice_conn.gather(&format!("alice-late-{}", i));
    }
    let attempts = flaky.attempts();
    let f = &flaky;
    eventually("the late candidates to be attempted", move || async move {
        f.attempts() >= attempts + 5
    })
    .await
    .unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(alice_conn.ice_restarts(), 1);
    let snapshot = alice.session.snapshot().await.unwrap();
    assert_eq!(snapshot.signaling, SignalingState::Stable);
    assert_eq!(snapshot.restarts_remaining, 1);

    alice.session.leave().await;
    bob.session.leave().await;
}
