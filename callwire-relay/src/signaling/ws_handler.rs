use crate::signaling::RelayService;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Path, State, WebSocketUpgrade};
use axum::response::IntoResponse;
use callwire_core::{ParticipantId, RelayRequest, RelayResponse};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(participant): Path<String>,
    State(service): State<RelayService>,
) -> impl IntoResponse {
    let participant = ParticipantId::from(participant);

    ws.on_upgrade(move |socket| handle_socket(socket, participant, service))
}

async fn handle_socket(socket: WebSocket, participant: ParticipantId, service: RelayService) {
    info!("New WebSocket connection: {}", participant);

    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<RelayResponse>();

    let mut send_task = tokio::spawn(async move {
        while let Some(response) = rx.recv().await {
            let json = match serde_json::to_string(&response) {
                Ok(json) => json,
                Err(e) => {
                    error!("Failed to serialize relay response: {}", e);
                    continue;
                }
            };
            if sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    let mut recv_task = tokio::spawn({
        let service = service.clone();
        let participant = participant.clone();

        async move {
            let mut subscriptions = service.open_connection();

            while let Some(Ok(msg)) = receiver.next().await {
                match msg {
                    Message::Text(text) => match serde_json::from_str::<RelayRequest>(&text) {
                        Ok(request) => {
                            let response = service
                                .handle_request(&participant, request, &mut subscriptions, &tx)
                                .await;
                            if let Some(response) = response {
                                if tx.send(response).is_err() {
                                    break;
                                }
                            }
                        }
                        Err(e) => warn!("Invalid RelayRequest from {}: {:?}", participant, e),
                    },
                    Message::Close(_) => break,
                    _ => {}
                }
            }

            info!(
                "Dropping {} subscription(s) of {}",
                subscriptions.len(),
                participant
            );
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };

    info!("WebSocket disconnected: {}", participant);
}
