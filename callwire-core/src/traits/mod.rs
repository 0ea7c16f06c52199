mod room_store;
mod signal_channel;

pub use room_store::RoomStore;
pub use signal_channel::{SignalChannel, Subscription, SubscriptionId};
