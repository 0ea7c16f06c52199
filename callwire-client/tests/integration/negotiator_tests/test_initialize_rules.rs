use callwire_client::NegotiationError;
use callwire_core::{SdpKind, SessionDescription};

use crate::integration::init_tracing;
use crate::utils::{FakeRtcConnection, local_stream, negotiator_on};

#[tokio::test]
async fn test_offer_requires_initialize() {
    init_tracing();

    let (conn, _events) = FakeRtcConnection::standalone("alice");
    let (mut alice, _rx) = negotiator_on("alice", conn.clone(), 2);

    assert!(matches!(
        alice.create_offer().await,
        Err(NegotiationError::NotInitialized)
    ));
    assert_eq!(conn.offers_created(), 0);
}

#[tokio::test]
async fn test_initialize_twice_fails() {
    init_tracing();

    let (conn, _events) = FakeRtcConnection::standalone("alice");
    let (mut alice, _rx) = negotiator_on("alice", conn, 2);
    let stream = local_stream();

    alice.initialize(&stream).await.unwrap();
    assert!(matches!(
        alice.initialize(&stream).await,
        Err(NegotiationError::AlreadyInitialized)
    ));
    assert_eq!(alice.local_tracks().len(), 2);
}

#[tokio::test]
async fn test_answer_passed_as_offer_is_rejected() {
    init_tracing();

    let (conn, _events) = FakeRtcConnection::standalone("bob");
    let (mut bob, _rx) = negotiator_on("bob", conn, 2);
    bob.initialize(&local_stream()).await.unwrap();

    let result = bob
        .handle_remote_offer(SessionDescription::answer("not an offer"))
        .await;
    assert!(matches!(
        result,
        Err(NegotiationError::UnexpectedDescription {
            expected: SdpKind::Offer,
            actual: SdpKind::Answer,
        })
    ));
}
