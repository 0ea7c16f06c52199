use callwire_client::{NegotiatorEvent, SessionError, TrackSwap};
use callwire_core::{CaptureSource, MediaKind, SignalKind, SignalingState};

use crate::integration::init_tracing;
use crate::utils::{CallHarness, eventually, next_event};

#[tokio::test]
async fn test_screen_share() {
    init_tracing();

    let harness = CallHarness::new("share").await;
    let alice = harness.join("alice").await;
    let mut bob = harness.join("bob").await;

    let alice_session = &alice.session;
    eventually("call to settle", move || async move {
        alice_session
            .snapshot()
            .await
            .map(|s| s.signaling == SignalingState::Stable)
            .unwrap_or(false)
    })
    .await
    .unwrap();
    let messages_before = harness.channel.message_count(&harness.room_id);

    let swap = alice.session.start_screen_share().await.unwrap();
    assert_eq!(swap, TrackSwap::Replaced);

    let screen = harness
        .network
        .connection("alice")
        .sender(MediaKind::Video)
        .expect("video sender");
    assert_eq!(screen.source(), CaptureSource::Screen);

    // bob gets the new track without another offer/answer round
    let screen_id = screen.id().to_owned();
    next_event(&mut bob.events, |e| {
        matches!(e, NegotiatorEvent::RemoteStream(t) if t.id == screen_id)
    })
    .await
    .expect("screen track not delivered");
    assert_eq!(harness.count("alice", SignalKind::Offer).await, 1);
    assert_eq!(
        harness.channel.message_count(&harness.room_id),
        messages_before
    );

    assert!(matches!(
        alice.session.start_screen_share().await,
        Err(SessionError::InvalidRequest(_))
    ));

    let swap = alice.session.stop_screen_share().await.unwrap();
    assert_eq!(swap, TrackSwap::Replaced);
    let camera = harness
        .network
        .connection("alice")
        .sender(MediaKind::Video)
        .expect("video sender");
    assert_eq!(camera.source(), CaptureSource::Camera);
    assert!(screen.is_stopped());
    assert_eq!(alice.capture.stop_count(CaptureSource::Screen), 1);
    assert_eq!(alice.capture.stop_count(CaptureSource::Camera), 0);

    alice.session.leave().await;
    bob.session.leave().await;
}
