use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, SystemTime};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Hash, Eq, PartialEq)]
#[serde(transparent)]
pub struct RoomId(pub String);

impl RoomId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RoomId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for RoomId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for RoomId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    Active,
    Ended,
}

/// A two-party call. Created by the initiating participant before any
/// signaling happens; `Active -> Ended` is the only transition.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Room {
    pub id: RoomId,
    pub status: RoomStatus,
    pub created_at: SystemTime,
    pub ended_at: Option<SystemTime>,
    /// Nominal call length booked for the room.
    pub duration: Duration,
}

impl Room {
    pub fn new(id: RoomId, duration: Duration) -> Self {
        Self {
            id,
            status: RoomStatus::Active,
            created_at: SystemTime::now(),
            ended_at: None,
            duration,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == RoomStatus::Active
    }

    /// Marks the room as ended. Returns `false` if it already was.
    pub fn end(&mut self) -> bool {
        if self.status == RoomStatus::Ended {
            return false;
        }
        self.status = RoomStatus::Ended;
        self.ended_at = Some(SystemTime::now());
        true
    }
}
