use crate::room::MemoryRoomStore;
use async_trait::async_trait;
use callwire_core::{
    ChannelError, RoomId, RoomStatus, SignalChannel, SignalMessage, Subscription, SubscriptionId,
};
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;
use tracing::{debug, info};

#[derive(Default)]
struct RoomLog {
    messages: Vec<SignalMessage>,
    subscribers: HashMap<SubscriptionId, mpsc::UnboundedSender<SignalMessage>>,
}

/// Ordered, in-process signal log with live fan-out.
///
/// When bound to a [`MemoryRoomStore`], publishing is refused for unknown
/// and ended rooms. Unbound channels accept any room id.
pub struct MemorySignalChannel {
    logs: DashMap<RoomId, RoomLog>,
    subscriptions: DashMap<SubscriptionId, RoomId>,
    next_subscription: AtomicU64,
    rooms: Option<Arc<MemoryRoomStore>>,
}

impl MemorySignalChannel {
    pub fn new() -> Self {
        Self {
            logs: DashMap::new(),
            subscriptions: DashMap::new(),
            next_subscription: AtomicU64::new(1),
            rooms: None,
        }
    }

    pub fn with_rooms(rooms: Arc<MemoryRoomStore>) -> Self {
        Self {
            rooms: Some(rooms),
            ..Self::new()
        }
    }

    fn check_room(&self, room_id: &RoomId, for_publish: bool) -> Result<(), ChannelError> {
        let Some(rooms) = &self.rooms else {
            return Ok(());
        };
        match rooms.status(room_id) {
            None => Err(ChannelError::RoomNotFound(room_id.clone())),
            Some(RoomStatus::Ended) if for_publish => Err(ChannelError::RoomEnded(room_id.clone())),
            Some(_) => Ok(()),
        }
    }

    /// Drops a registration without going through the async trait.
    pub fn remove_subscription(&self, subscription: SubscriptionId) {
        let Some((_, room_id)) = self.subscriptions.remove(&subscription) else {
            return;
        };
        if let Some(mut log) = self.logs.get_mut(&room_id) {
            log.subscribers.remove(&subscription);
        }
        debug!("Removed {} from room {}", subscription, room_id);
    }

    pub fn subscriber_count(&self, room_id: &RoomId) -> usize {
        self.logs
            .get(room_id)
            .map(|log| log.subscribers.len())
            .unwrap_or(0)
    }

    /// Live registrations across all rooms.
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn message_count(&self, room_id: &RoomId) -> usize {
        self.logs
            .get(room_id)
            .map(|log| log.messages.len())
            .unwrap_or(0)
    }
}

impl Default for MemorySignalChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SignalChannel for MemorySignalChannel {
    async fn publish(&self, mut message: SignalMessage) -> Result<u64, ChannelError> {
        self.check_room(&message.room_id, true)?;

        let mut log = self.logs.entry(message.room_id.clone()).or_default();
        let seq = log.messages.len() as u64 + 1;
        message.seq = seq;

        debug!(
            "Room {} <- {} from {} (seq {})",
            message.room_id,
            message.kind(),
            message.sender,
            seq
        );

        log.messages.push(message.clone());
        // unbounded sends never wait; closed receivers are pruned here
        let mut closed = Vec::new();
        log.subscribers.retain(|id, tx| {
            let open = tx.send(message.clone()).is_ok();
            if !open {
                closed.push(*id);
            }
            open
        });
        drop(log);

        for id in closed {
            self.subscriptions.remove(&id);
            debug!("Pruned closed subscription {}", id);
        }

        Ok(seq)
    }

    async fn replay(&self, room_id: &RoomId) -> Result<Vec<SignalMessage>, ChannelError> {
        self.check_room(room_id, false)?;

        Ok(self
            .logs
            .get(room_id)
            .map(|log| log.messages.clone())
            .unwrap_or_default())
    }

    async fn subscribe(&self, room_id: &RoomId) -> Result<Subscription, ChannelError> {
        self.check_room(room_id, false)?;

        let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = mpsc::unbounded_channel();

        self.logs
            .entry(room_id.clone())
            .or_default()
            .subscribers
            .insert(id, tx);
        self.subscriptions.insert(id, room_id.clone());

        info!("New subscription {} on room {}", id, room_id);

        Ok(Subscription {
            id,
            room_id: room_id.clone(),
            messages: rx,
        })
    }

    async fn unsubscribe(&self, subscription: SubscriptionId) -> Result<(), ChannelError> {
        self.remove_subscription(subscription);
        Ok(())
    }
}
