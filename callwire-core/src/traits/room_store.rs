use crate::error::ChannelError;
use crate::model::{Room, RoomId};
use async_trait::async_trait;
use std::time::Duration;

/// Persistent record of rooms and their lifecycle.
#[async_trait]
pub trait RoomStore: Send + Sync {
    /// Creates an active room. A fresh id is generated when `room_id` is
    /// `None`.
    async fn create_room(
        &self,
        room_id: Option<RoomId>,
        duration: Duration,
    ) -> Result<Room, ChannelError>;

    async fn room(&self, room_id: &RoomId) -> Result<Room, ChannelError>;

    /// Ends the room. Ending an already ended room returns it unchanged.
    async fn end_room(&self, room_id: &RoomId) -> Result<Room, ChannelError>;
}
