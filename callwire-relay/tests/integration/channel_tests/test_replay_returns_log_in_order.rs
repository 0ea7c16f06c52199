use callwire_core::{SignalChannel, SignalKind};

use crate::integration::{create_bound_channel, init_tracing};
use crate::utils::{answer, candidate, offer};

#[tokio::test]
async fn test_replay_returns_log_in_order() {
    init_tracing();

    let (channel, _rooms, room) = create_bound_channel("r1").await;

    channel.publish(offer(&room, "alice", "o1")).await.unwrap();
    channel.publish(candidate(&room, "alice", "c1")).await.unwrap();
    channel.publish(answer(&room, "bob", "a1")).await.unwrap();

    let log = channel.replay(&room).await.expect("Replay failed");

    let kinds: Vec<SignalKind> = log.iter().map(|m| m.kind()).collect();
    assert_eq!(
        kinds,
        vec![SignalKind::Offer, SignalKind::IceCandidate, SignalKind::Answer]
    );

    let seqs: Vec<u64> = log.iter().map(|m| m.seq).collect();
    assert_eq!(seqs, vec![1, 2, 3]);
}
