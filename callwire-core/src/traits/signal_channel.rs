use crate::error::ChannelError;
use crate::model::{RoomId, SignalMessage};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::mpsc;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Hash, Eq, PartialEq)]
#[serde(transparent)]
pub struct SubscriptionId(pub u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Live feed of a room's signal messages.
///
/// Dropping the receiver is not the same as unsubscribing: the channel keeps
/// the registration until [`SignalChannel::unsubscribe`] is called or it
/// notices the receiver is gone.
#[derive(Debug)]
pub struct Subscription {
    pub id: SubscriptionId,
    pub room_id: RoomId,
    pub messages: mpsc::UnboundedReceiver<SignalMessage>,
}

/// At-least-once, unordered message bus scoped to a room.
///
/// Implementations never deduplicate; consumers do.
#[async_trait]
pub trait SignalChannel: Send + Sync {
    /// Appends `message` to the room log and broadcasts it. Returns the
    /// sequence number assigned by the log. Must not wait for delivery.
    async fn publish(&self, message: SignalMessage) -> Result<u64, ChannelError>;

    /// Everything published to the room so far, oldest first.
    async fn replay(&self, room_id: &RoomId) -> Result<Vec<SignalMessage>, ChannelError>;

    /// Starts delivering messages published from now on.
    async fn subscribe(&self, room_id: &RoomId) -> Result<Subscription, ChannelError>;

    /// Stops delivery. Unknown or already removed ids are ignored.
    async fn unsubscribe(&self, subscription: SubscriptionId) -> Result<(), ChannelError>;
}
