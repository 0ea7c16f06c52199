use crate::channel::MemorySignalChannel;
use crate::room::MemoryRoomStore;
use callwire_core::{
    ChannelError, ParticipantId, RelayErrorCode, RelayRequest, RelayResponse, RoomStore,
    SignalChannel, SubscriptionId,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

struct RelayInner {
    channel: Arc<MemorySignalChannel>,
    rooms: Arc<MemoryRoomStore>,
}

/// Serves the relay protocol for every connected participant.
#[derive(Clone)]
pub struct RelayService {
    inner: Arc<RelayInner>,
}

/// Subscriptions opened by one WebSocket connection. Dropping it stops the
/// forwarders and unregisters them from the channel.
pub struct ConnectionSubscriptions {
    channel: Arc<MemorySignalChannel>,
    forwarders: HashMap<SubscriptionId, JoinHandle<()>>,
}

impl ConnectionSubscriptions {
    pub fn len(&self) -> usize {
        self.forwarders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forwarders.is_empty()
    }

    fn remove(&mut self, subscription: SubscriptionId) {
        if let Some(handle) = self.forwarders.remove(&subscription) {
            handle.abort();
        }
        self.channel.remove_subscription(subscription);
    }
}

impl Drop for ConnectionSubscriptions {
    fn drop(&mut self) {
        for (subscription, handle) in self.forwarders.drain() {
            handle.abort();
            self.channel.remove_subscription(subscription);
        }
    }
}

impl RelayService {
    pub fn new(channel: Arc<MemorySignalChannel>, rooms: Arc<MemoryRoomStore>) -> Self {
        Self {
            inner: Arc::new(RelayInner { channel, rooms }),
        }
    }

    /// Relay whose channel refuses to publish into unknown or ended rooms.
    pub fn in_memory() -> Self {
        let rooms = Arc::new(MemoryRoomStore::new());
        let channel = Arc::new(MemorySignalChannel::with_rooms(rooms.clone()));
        Self::new(channel, rooms)
    }

    pub fn channel(&self) -> Arc<MemorySignalChannel> {
        self.inner.channel.clone()
    }

    pub fn rooms(&self) -> Arc<MemoryRoomStore> {
        self.inner.rooms.clone()
    }

    pub fn open_connection(&self) -> ConnectionSubscriptions {
        ConnectionSubscriptions {
            channel: self.inner.channel.clone(),
            forwarders: HashMap::new(),
        }
    }

    /// Executes one request on behalf of `participant`. Live messages for
    /// subscriptions opened here are pushed to `out`.
    ///
    /// Returns `None` when the reply was already queued on `out`: a
    /// subscription acknowledges itself so that no live message can overtake
    /// its `Subscribed` frame.
    pub async fn handle_request(
        &self,
        participant: &ParticipantId,
        request: RelayRequest,
        subscriptions: &mut ConnectionSubscriptions,
        out: &mpsc::UnboundedSender<RelayResponse>,
    ) -> Option<RelayResponse> {
        let request_id = request.request_id();

        let result = match request {
            RelayRequest::Publish { message, .. } => {
                if &message.sender != participant {
                    warn!(
                        "Participant {} tried to publish as {}",
                        participant, message.sender
                    );
                    return Some(RelayResponse::Error {
                        request_id,
                        code: RelayErrorCode::BadRequest,
                        message: "sender does not match connection".to_owned(),
                    });
                }
                self.inner
                    .channel
                    .publish(message)
                    .await
                    .map(|seq| RelayResponse::Published { request_id, seq })
            }

            RelayRequest::Replay { room_id, .. } => self
                .inner
                .channel
                .replay(&room_id)
                .await
                .map(|messages| RelayResponse::History {
                    request_id,
                    messages,
                }),

            RelayRequest::Subscribe { room_id, .. } => {
                match self.inner.channel.subscribe(&room_id).await {
                    Ok(subscription) => {
                        let id = subscription.id;
                        let ack = RelayResponse::Subscribed {
                            request_id,
                            subscription: id,
                        };
                        let handle = spawn_forwarder(ack, id, subscription.messages, out);
                        subscriptions.forwarders.insert(id, handle);
                        debug!("{} subscribed to room {} as {}", participant, room_id, id);
                        return None;
                    }
                    Err(e) => Err(e),
                }
            }

            RelayRequest::Unsubscribe { subscription, .. } => {
                subscriptions.remove(subscription);
                Ok(RelayResponse::Unsubscribed { request_id })
            }

            RelayRequest::CreateRoom {
                room_id, duration, ..
            } => self
                .inner
                .rooms
                .create_room(room_id, duration)
                .await
                .map(|room| RelayResponse::Room { request_id, room }),

            RelayRequest::RoomStatus { room_id, .. } => self
                .inner
                .rooms
                .room(&room_id)
                .await
                .map(|room| RelayResponse::Room { request_id, room }),

            RelayRequest::EndRoom { room_id, .. } => self
                .inner
                .rooms
                .end_room(&room_id)
                .await
                .map(|room| RelayResponse::Room { request_id, room }),
        };

        Some(result.unwrap_or_else(|e| error_response(request_id, e)))
    }
}

fn spawn_forwarder(
    ack: RelayResponse,
    subscription: SubscriptionId,
    mut messages: mpsc::UnboundedReceiver<callwire_core::SignalMessage>,
    out: &mpsc::UnboundedSender<RelayResponse>,
) -> JoinHandle<()> {
    let out = out.clone();
    // queued synchronously, ahead of anything the task forwards
    let acked = out.send(ack).is_ok();
    tokio::spawn(async move {
        if !acked {
            return;
        }
        while let Some(message) = messages.recv().await {
            if out
                .send(RelayResponse::Message {
                    subscription,
                    message,
                })
                .is_err()
            {
                break;
            }
        }
    })
}

fn error_response(request_id: u64, error: ChannelError) -> RelayResponse {
    let code = match &error {
        ChannelError::RoomNotFound(_) => RelayErrorCode::RoomNotFound,
        ChannelError::RoomEnded(_) => RelayErrorCode::RoomEnded,
        ChannelError::RoomExists(_) => RelayErrorCode::RoomExists,
        ChannelError::Protocol(_) => RelayErrorCode::BadRequest,
        ChannelError::Transport(_) | ChannelError::Closed => RelayErrorCode::Internal,
    };
    RelayResponse::Error {
        request_id,
        code,
        message: error.to_string(),
    }
}
