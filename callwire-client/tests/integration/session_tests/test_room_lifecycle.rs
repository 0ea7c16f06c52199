use callwire_client::{CallSession, SessionError};
use callwire_core::{ChannelError, ParticipantId, RoomId, RoomStore, SignalKind};

use crate::integration::init_tracing;
use crate::utils::{CallHarness, test_config};

#[tokio::test]
async fn test_join_ended_room_is_rejected() {
    init_tracing();

    let harness = CallHarness::new("ended").await;
    harness.rooms.end_room(&harness.room_id).await.unwrap();

    let (deps, capture, _connector) = harness.deps("alice");
    let result = CallSession::join(
        harness.room_id.clone(),
        ParticipantId::from("alice"),
        deps,
        test_config(),
    )
    .await;

    assert!(matches!(result, Err(SessionError::RoomEnded(ref id)) if *id == harness.room_id));
    // rejected before touching any device
    assert!(capture.opened().is_empty());
    assert_eq!(harness.channel.message_count(&harness.room_id), 0);
}

#[tokio::test]
async fn test_join_unknown_room_is_rejected() {
    init_tracing();

    let harness = CallHarness::new("known").await;
    let (deps, capture, _connector) = harness.deps("alice");
    let result = CallSession::join(
        RoomId::from("unknown"),
        ParticipantId::from("alice"),
        deps,
        test_config(),
    )
    .await;

    assert!(matches!(
        result,
        Err(SessionError::Channel(ChannelError::RoomNotFound(_)))
    ));
    assert!(capture.opened().is_empty());
}

#[tokio::test]
async fn test_end_call_ends_room() {
    init_tracing();

    let harness = CallHarness::new("end").await;
    let alice = harness.join("alice").await;
    let bob = harness.join("bob").await;

    let room = alice.session.end_call().await.unwrap();
    assert!(!room.is_active());
    assert!(room.ended_at.is_some());
    assert_eq!(alice.capture.live_devices(), 0);

    // nobody new gets in
    assert!(matches!(
        harness.try_join("carol").await,
        Err(SessionError::RoomEnded(_))
    ));
    assert_eq!(harness.count("carol", SignalKind::Offer).await, 0);

    // and the remaining side keeps the log readable
    let log_len = harness.channel.message_count(&harness.room_id);
    assert!(log_len >= 2);

    bob.session.leave().await;
}
