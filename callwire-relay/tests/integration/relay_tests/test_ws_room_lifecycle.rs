use std::time::Duration;

use callwire_core::{RelayErrorCode, RelayRequest, RelayResponse, RoomId, RoomStatus};

use crate::integration::{create_test_relay, init_tracing};
use crate::utils::{RawRelayClient, offer, spawn_relay};

#[tokio::test]
async fn test_ws_room_lifecycle() {
    init_tracing();

    let relay = create_test_relay();
    let addr = spawn_relay(relay.clone()).await.expect("Relay failed to start");
    let mut alice = RawRelayClient::connect(addr, "alice").await.unwrap();
    let room = RoomId::from("r1");

    let created = alice
        .call(RelayRequest::CreateRoom {
            request_id: 1,
            room_id: Some(room.clone()),
            duration: Duration::from_secs(900),
        })
        .await
        .unwrap();
    assert!(matches!(
        created,
        RelayResponse::Room { ref room, .. } if room.status == RoomStatus::Active
    ));

    let ended = alice
        .call(RelayRequest::EndRoom {
            request_id: 2,
            room_id: room.clone(),
        })
        .await
        .unwrap();
    assert!(matches!(
        ended,
        RelayResponse::Room { ref room, .. } if room.status == RoomStatus::Ended
    ));

    let rejected = alice
        .call(RelayRequest::Publish {
            request_id: 3,
            message: offer(&room, "alice", "o1"),
        })
        .await
        .unwrap();
    assert!(matches!(
        rejected,
        RelayResponse::Error {
            code: RelayErrorCode::RoomEnded,
            ..
        }
    ));
}
