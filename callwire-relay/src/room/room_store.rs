use async_trait::async_trait;
use callwire_core::{ChannelError, Room, RoomId, RoomStatus, RoomStore};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::time::Duration;
use tracing::info;

/// Room directory kept in memory for the lifetime of the relay.
#[derive(Default)]
pub struct MemoryRoomStore {
    rooms: DashMap<RoomId, Room>,
}

impl MemoryRoomStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self, room_id: &RoomId) -> Option<RoomStatus> {
        self.rooms.get(room_id).map(|room| room.status)
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}

#[async_trait]
impl RoomStore for MemoryRoomStore {
    async fn create_room(
        &self,
        room_id: Option<RoomId>,
        duration: Duration,
    ) -> Result<Room, ChannelError> {
        let room_id = room_id.unwrap_or_default();

        match self.rooms.entry(room_id.clone()) {
            Entry::Occupied(_) => Err(ChannelError::RoomExists(room_id)),
            Entry::Vacant(slot) => {
                info!("Creating new room: {}", room_id);
                let room = Room::new(room_id, duration);
                slot.insert(room.clone());
                Ok(room)
            }
        }
    }

    async fn room(&self, room_id: &RoomId) -> Result<Room, ChannelError> {
        self.rooms
            .get(room_id)
            .map(|room| room.value().clone())
            .ok_or_else(|| ChannelError::RoomNotFound(room_id.clone()))
    }

    async fn end_room(&self, room_id: &RoomId) -> Result<Room, ChannelError> {
        let mut room = self
            .rooms
            .get_mut(room_id)
            .ok_or_else(|| ChannelError::RoomNotFound(room_id.clone()))?;

        if room.end() {
            info!("Room {} ended", room_id);
        }
        Ok(room.value().clone())
    }
}
