use callwire_core::{IceCandidate, SignalingState};

use crate::integration::init_tracing;
use crate::utils::{FakeRtcConnection, local_stream, negotiator_on};

#[tokio::test]
async fn test_candidates_wait_for_remote_description() {
    init_tracing();

    let (alice_conn, _a) = FakeRtcConnection::standalone("alice");
    let (bob_conn, _b) = FakeRtcConnection::standalone("bob");
    let (mut alice, _ra) = negotiator_on("alice", alice_conn, 2);
    let (mut bob, _rb) = negotiator_on("bob", bob_conn.clone(), 2);
    alice.initialize(&local_stream()).await.unwrap();
    bob.initialize(&local_stream()).await.unwrap();

    for c in ["c1", "bad-c2", "c3"] {
        bob.add_remote_candidate(IceCandidate::new(c)).await.unwrap();
    }
    assert_eq!(bob.pending_candidate_count(), 3);
    assert!(bob_conn.applied_candidates().is_empty());

    let offer = alice.create_offer().await.unwrap();
    bob.handle_remote_offer(offer).await.unwrap();

    // flushed in arrival order; the rejected one is dropped
    assert_eq!(bob.pending_candidate_count(), 0);
    assert_eq!(bob_conn.applied_candidates(), ["c1", "c3"]);
    assert_eq!(bob.signaling_state(), SignalingState::Stable);

    bob.add_remote_candidate(IceCandidate::new("c4")).await.unwrap();
    assert_eq!(bob_conn.applied_candidates(), ["c1", "c3", "c4"]);
}
