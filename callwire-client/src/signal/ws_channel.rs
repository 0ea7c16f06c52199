use async_trait::async_trait;
use callwire_core::{
    ChannelError, ParticipantId, RelayErrorCode, RelayRequest, RelayResponse, Room, RoomId,
    RoomStore, SignalChannel, SignalMessage, Subscription, SubscriptionId,
};
use futures::{SinkExt, StreamExt};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

struct Reply {
    response: RelayResponse,
    feed: Option<mpsc::UnboundedReceiver<SignalMessage>>,
}

/// State the socket reader shares with callers.
#[derive(Default)]
struct Shared {
    pending: Mutex<HashMap<u64, oneshot::Sender<Reply>>>,
    feeds: Mutex<HashMap<SubscriptionId, mpsc::UnboundedSender<SignalMessage>>>,
    closed: AtomicBool,
}

impl Shared {
    fn dispatch(&self, response: RelayResponse) {
        if let RelayResponse::Message {
            subscription,
            message,
        } = response
        {
            let Ok(feeds) = self.feeds.lock() else { return };
            match feeds.get(&subscription) {
                Some(tx) => {
                    let _ = tx.send(message);
                }
                None => debug!("Message for unknown {}", subscription),
            }
            return;
        }

        let Some(request_id) = response.request_id() else {
            return;
        };

        // register the feed before the caller sees the reply, so messages
        // right behind `Subscribed` are not lost
        let feed = match &response {
            RelayResponse::Subscribed { subscription, .. } => {
                let (tx, rx) = mpsc::unbounded_channel();
                if let Ok(mut feeds) = self.feeds.lock() {
                    feeds.insert(*subscription, tx);
                }
                Some(rx)
            }
            _ => None,
        };

        let waiter = self
            .pending
            .lock()
            .ok()
            .and_then(|mut pending| pending.remove(&request_id));
        match waiter {
            Some(tx) => {
                let _ = tx.send(Reply { response, feed });
            }
            None => warn!("Relay answered unknown request {}", request_id),
        }
    }

    fn shut_down(&self) {
        self.closed.store(true, Ordering::Release);
        if let Ok(mut pending) = self.pending.lock() {
            pending.clear();
        }
        if let Ok(mut feeds) = self.feeds.lock() {
            feeds.clear();
        }
    }
}

/// Signal channel and room store backed by a remote relay.
pub struct WsSignalChannel {
    participant: ParticipantId,
    outgoing: mpsc::UnboundedSender<RelayRequest>,
    shared: Arc<Shared>,
    next_request: AtomicU64,
    reader: JoinHandle<()>,
    writer: JoinHandle<()>,
}

impl WsSignalChannel {
    /// Connects to `base_url` (e.g. `ws://127.0.0.1:8787`) as `participant`.
    pub async fn connect(base_url: &str, participant: ParticipantId) -> Result<Self, ChannelError> {
        let url = format!("{}/ws/{}", base_url.trim_end_matches('/'), participant);
        let (ws, _) = connect_async(url.as_str())
            .await
            .map_err(|e| ChannelError::Transport(format!("connect to {}: {}", url, e)))?;
        info!("Connected to relay at {} as {}", url, participant);

        let (mut sender, mut receiver) = ws.split();
        let (outgoing, mut rx) = mpsc::unbounded_channel::<RelayRequest>();
        let shared = Arc::new(Shared::default());

        let writer = tokio::spawn(async move {
            while let Some(request) = rx.recv().await {
                let json = match serde_json::to_string(&request) {
                    Ok(json) => json,
                    Err(e) => {
                        error!("Failed to encode relay request: {}", e);
                        continue;
                    }
                };
                if sender.send(Message::Text(json)).await.is_err() {
                    break;
                }
            }
            let _ = sender.close().await;
        });

        let reader_shared = shared.clone();
        let reader = tokio::spawn(async move {
            while let Some(frame) = receiver.next().await {
                let text = match frame {
                    Ok(Message::Text(text)) => text,
                    Ok(Message::Close(_)) => break,
                    Ok(_) => continue,
                    Err(e) => {
                        warn!("Relay socket error: {}", e);
                        break;
                    }
                };
                match serde_json::from_str::<RelayResponse>(&text) {
                    Ok(response) => reader_shared.dispatch(response),
                    Err(e) => warn!("Unparseable relay frame: {}", e),
                }
            }
            info!("Relay connection closed");
            reader_shared.shut_down();
        });

        Ok(Self {
            participant,
            outgoing,
            shared,
            next_request: AtomicU64::new(1),
            reader,
            writer,
        })
    }

    pub fn participant(&self) -> &ParticipantId {
        &self.participant
    }

    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::Acquire)
    }

    async fn call(
        &self,
        room_id: Option<&RoomId>,
        build: impl FnOnce(u64) -> RelayRequest,
    ) -> Result<Reply, ChannelError> {
        if self.is_closed() {
            return Err(ChannelError::Closed);
        }

        let request_id = self.next_request.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        self.shared
            .pending
            .lock()
            .map_err(|_| ChannelError::Transport("request table poisoned".into()))?
            .insert(request_id, tx);

        if self.outgoing.send(build(request_id)).is_err() {
            self.forget(request_id);
            return Err(ChannelError::Closed);
        }

        let reply = match tokio::time::timeout(REQUEST_TIMEOUT, rx).await {
            Ok(Ok(reply)) => reply,
            Ok(Err(_)) => return Err(ChannelError::Closed),
            Err(_) => {
                self.forget(request_id);
                return Err(ChannelError::Transport(format!(
                    "request {} timed out",
                    request_id
                )));
            }
        };

        if let RelayResponse::Error { code, message, .. } = &reply.response {
            return Err(map_error(*code, room_id, message));
        }
        Ok(reply)
    }

    fn forget(&self, request_id: u64) {
        if let Ok(mut pending) = self.shared.pending.lock() {
            pending.remove(&request_id);
        }
    }
}

impl Drop for WsSignalChannel {
    fn drop(&mut self) {
        self.reader.abort();
        self.writer.abort();
    }
}

fn map_error(code: RelayErrorCode, room_id: Option<&RoomId>, message: &str) -> ChannelError {
    let room = || room_id.cloned().unwrap_or_else(|| RoomId::from("unknown"));
    match code {
        RelayErrorCode::RoomNotFound => ChannelError::RoomNotFound(room()),
        RelayErrorCode::RoomEnded => ChannelError::RoomEnded(room()),
        RelayErrorCode::RoomExists => ChannelError::RoomExists(room()),
        RelayErrorCode::BadRequest => ChannelError::Protocol(message.to_owned()),
        RelayErrorCode::Internal => ChannelError::Transport(message.to_owned()),
    }
}

fn unexpected(response: &RelayResponse) -> ChannelError {
    ChannelError::Protocol(format!("unexpected relay response: {:?}", response))
}

#[async_trait]
impl SignalChannel for WsSignalChannel {
    async fn publish(&self, message: SignalMessage) -> Result<u64, ChannelError> {
        let room_id = message.room_id.clone();
        let reply = self
            .call(Some(&room_id), |request_id| RelayRequest::Publish {
                request_id,
                message,
            })
            .await?;
        match reply.response {
            RelayResponse::Published { seq, .. } => Ok(seq),
            other => Err(unexpected(&other)),
        }
    }

    async fn replay(&self, room_id: &RoomId) -> Result<Vec<SignalMessage>, ChannelError> {
        let reply = self
            .call(Some(room_id), |request_id| RelayRequest::Replay {
                request_id,
                room_id: room_id.clone(),
            })
            .await?;
        match reply.response {
            RelayResponse::History { messages, .. } => Ok(messages),
            other => Err(unexpected(&other)),
        }
    }

    async fn subscribe(&self, room_id: &RoomId) -> Result<Subscription, ChannelError> {
        let reply = self
            .call(Some(room_id), |request_id| RelayRequest::Subscribe {
                request_id,
                room_id: room_id.clone(),
            })
            .await?;
        match (reply.response, reply.feed) {
            (RelayResponse::Subscribed { subscription, .. }, Some(messages)) => Ok(Subscription {
                id: subscription,
                room_id: room_id.clone(),
                messages,
            }),
            (other, _) => Err(unexpected(&other)),
        }
    }

    async fn unsubscribe(&self, subscription: SubscriptionId) -> Result<(), ChannelError> {
        if let Ok(mut feeds) = self.shared.feeds.lock() {
            feeds.remove(&subscription);
        }
        if self.is_closed() {
            return Ok(());
        }
        self.call(None, |request_id| RelayRequest::Unsubscribe {
            request_id,
            subscription,
        })
        .await?;
        Ok(())
    }
}

#[async_trait]
impl RoomStore for WsSignalChannel {
    async fn create_room(
        &self,
        room_id: Option<RoomId>,
        duration: Duration,
    ) -> Result<Room, ChannelError> {
        let requested = room_id.clone();
        let reply = self
            .call(requested.as_ref(), |request_id| RelayRequest::CreateRoom {
                request_id,
                room_id,
                duration,
            })
            .await?;
        match reply.response {
            RelayResponse::Room { room, .. } => Ok(room),
            other => Err(unexpected(&other)),
        }
    }

    async fn room(&self, room_id: &RoomId) -> Result<Room, ChannelError> {
        let reply = self
            .call(Some(room_id), |request_id| RelayRequest::RoomStatus {
                request_id,
                room_id: room_id.clone(),
            })
            .await?;
        match reply.response {
            RelayResponse::Room { room, .. } => Ok(room),
            other => Err(unexpected(&other)),
        }
    }

    async fn end_room(&self, room_id: &RoomId) -> Result<Room, ChannelError> {
        let reply = self
            .call(Some(room_id), |request_id| RelayRequest::EndRoom {
                request_id,
                room_id: room_id.clone(),
            })
            .await?;
        match reply.response {
            RelayResponse::Room { room, .. } => Ok(room),
            other => Err(unexpected(&other)),
        }
    }
}
