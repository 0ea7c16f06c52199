use std::time::Duration;

use callwire_core::{ChannelError, RoomId, RoomStatus, RoomStore, SignalChannel, SignalKind};
use callwire_relay::RelayService;

use crate::integration::init_tracing;
use crate::utils::{candidate, offer, spawn_relay, ws_channel};

#[tokio::test]
async fn test_ws_room_store_round_trip() {
    init_tracing();

    let relay = RelayService::in_memory();
    let url = spawn_relay(relay.clone()).await.unwrap();
    let alice = ws_channel(&url, "alice").await;

    let room = alice
        .create_room(None, Duration::from_secs(900))
        .await
        .unwrap();
    assert_eq!(room.status, RoomStatus::Active);
    assert_eq!(relay.rooms().status(&room.id), Some(RoomStatus::Active));

    let fetched = alice.room(&room.id).await.unwrap();
    assert_eq!(fetched.id, room.id);

    let ended = alice.end_room(&room.id).await.unwrap();
    assert_eq!(ended.status, RoomStatus::Ended);

    assert_eq!(
        alice.room(&RoomId::from("missing")).await,
        Err(ChannelError::RoomNotFound(RoomId::from("missing")))
    );
    assert_eq!(
        alice
            .create_room(Some(room.id.clone()), Duration::from_secs(60))
            .await,
        Err(ChannelError::RoomExists(room.id.clone()))
    );
}

#[tokio::test]
async fn test_ws_publish_reaches_other_subscriber() {
    init_tracing();

    let url = spawn_relay(RelayService::in_memory()).await.unwrap();
    let alice = ws_channel(&url, "alice").await;
    let bob = ws_channel(&url, "bob").await;

    let room = alice
        .create_room(Some(RoomId::from("ws")), Duration::from_secs(900))
        .await
        .unwrap()
        .id;

    assert_eq!(alice.publish(offer(&room, "alice", "o1")).await.unwrap(), 1);

    let mut sub = bob.subscribe(&room).await.unwrap();
    let history = bob.replay(&room).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].kind(), SignalKind::Offer);

    assert_eq!(
        alice.publish(candidate(&room, "alice", "c1")).await.unwrap(),
        2
    );

    let live = tokio::time::timeout(Duration::from_secs(2), sub.messages.recv())
        .await
        .expect("Timeout waiting for live message")
        .expect("Subscription closed");
    assert_eq!(live.seq, 2);
    assert_eq!(live.kind(), SignalKind::IceCandidate);

    bob.unsubscribe(sub.id).await.unwrap();
    // a second unsubscribe is harmless
    bob.unsubscribe(sub.id).await.unwrap();
}

#[tokio::test]
async fn test_ws_errors_map_to_channel_errors() {
    init_tracing();

    let relay = RelayService::in_memory();
    let url = spawn_relay(relay.clone()).await.unwrap();
    let alice = ws_channel(&url, "alice").await;

    let room = alice
        .create_room(Some(RoomId::from("gone")), Duration::from_secs(900))
        .await
        .unwrap()
        .id;
    alice.end_room(&room).await.unwrap();

    let result = alice.publish(offer(&room, "alice", "late")).await;
    assert_eq!(result, Err(ChannelError::RoomEnded(room.clone())));
    assert!(result.unwrap_err().is_permanent());

    // the relay will not let alice speak for bob
    let forged = alice.publish(offer(&room, "bob", "forged")).await;
    assert!(matches!(forged, Err(ChannelError::Protocol(_))));

    let missing = alice.subscribe(&RoomId::from("nope")).await;
    assert!(matches!(missing, Err(ChannelError::RoomNotFound(_))));
}
