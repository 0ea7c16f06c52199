use std::sync::Arc;

use callwire_client::{AnswerOutcome, Negotiator, WebRtcConnection};
use callwire_core::{IceServerConfig, ParticipantId, SignalingState};
use tokio::sync::{broadcast, mpsc};

use crate::integration::init_tracing;
use crate::utils::local_stream;

async fn webrtc_negotiator(name: &str) -> Negotiator {
    let (tx, _rx) = mpsc::unbounded_channel();
    let ice_servers: Vec<IceServerConfig> = Vec::new();
    let connection = WebRtcConnection::new(&ice_servers, tx)
        .await
        .expect("Failed to create peer connection");
    let (events, _) = broadcast::channel(16);
    Negotiator::new(ParticipantId::from(name), Arc::new(connection), 2, events)
}

#[tokio::test]
async fn test_offer_answer_reaches_stable() {
    init_tracing();

    let mut alice = webrtc_negotiator("alice").await;
    let mut bob = webrtc_negotiator("bob").await;
    alice.initialize(&local_stream()).await.unwrap();
    bob.initialize(&local_stream()).await.unwrap();

    let offer = alice.create_offer().await.unwrap();
    assert!(offer.sdp.contains("m=audio"));
    assert!(offer.sdp.contains("m=video"));
    assert_eq!(alice.signaling_state(), SignalingState::HaveLocalOffer);

    let answer = bob.handle_remote_offer(offer).await.unwrap();
    assert_eq!(bob.signaling_state(), SignalingState::Stable);
    assert!(bob.has_remote_description());

    assert_eq!(
        alice.handle_remote_answer(answer).await.unwrap(),
        AnswerOutcome::Applied
    );
    assert_eq!(alice.signaling_state(), SignalingState::Stable);

    alice.close().await;
    bob.close().await;
    assert_eq!(alice.signaling_state(), SignalingState::Closed);
}

#[tokio::test]
async fn test_garbage_sdp_is_rejected() {
    init_tracing();

    let mut bob = webrtc_negotiator("bob").await;
    bob.initialize(&local_stream()).await.unwrap();

    let result = bob
        .handle_remote_offer(callwire_core::SessionDescription::offer("not sdp"))
        .await;

    assert!(result.is_err());
    assert!(!bob.has_remote_description());
    bob.close().await;
}
