use callwire_core::{ChannelError, RoomId, RoomStore, SignalChannel};

use crate::integration::{create_bound_channel, init_tracing};
use crate::utils::{candidate, offer};

#[tokio::test]
async fn test_ended_room_rejects_publish() {
    init_tracing();

    let (channel, rooms, room) = create_bound_channel("r1").await;

    channel.publish(offer(&room, "alice", "o1")).await.unwrap();
    rooms.end_room(&room).await.unwrap();

    let err = channel
        .publish(candidate(&room, "alice", "late"))
        .await
        .unwrap_err();
    assert_eq!(err, ChannelError::RoomEnded(room.clone()));
    assert!(err.is_permanent());

    // history stays readable after the call ended
    assert_eq!(channel.replay(&room).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_unknown_room_is_rejected() {
    init_tracing();

    let (channel, _rooms, _room) = create_bound_channel("r1").await;
    let missing = RoomId::from("missing");

    let err = channel
        .publish(offer(&missing, "alice", "o1"))
        .await
        .unwrap_err();
    assert_eq!(err, ChannelError::RoomNotFound(missing.clone()));
    assert!(channel.subscribe(&missing).await.is_err());
}
