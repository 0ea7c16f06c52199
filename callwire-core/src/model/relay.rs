use crate::model::room::{Room, RoomId};
use crate::model::signaling::SignalMessage;
use crate::traits::SubscriptionId;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Frames a participant sends to the signal relay over its WebSocket.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(tag = "op", content = "d", rename_all = "snake_case")]
pub enum RelayRequest {
    Publish {
        request_id: u64,
        message: SignalMessage,
    },
    Replay {
        request_id: u64,
        room_id: RoomId,
    },
    Subscribe {
        request_id: u64,
        room_id: RoomId,
    },
    Unsubscribe {
        request_id: u64,
        subscription: SubscriptionId,
    },
    CreateRoom {
        request_id: u64,
        room_id: Option<RoomId>,
        duration: Duration,
    },
    RoomStatus {
        request_id: u64,
        room_id: RoomId,
    },
    EndRoom {
        request_id: u64,
        room_id: RoomId,
    },
}

impl RelayRequest {
    pub fn request_id(&self) -> u64 {
        match self {
            Self::Publish { request_id, .. }
            | Self::Replay { request_id, .. }
            | Self::Subscribe { request_id, .. }
            | Self::Unsubscribe { request_id, .. }
            | Self::CreateRoom { request_id, .. }
            | Self::RoomStatus { request_id, .. }
            | Self::EndRoom { request_id, .. } => *request_id,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum RelayErrorCode {
    RoomNotFound,
    RoomEnded,
    RoomExists,
    BadRequest,
    Internal,
}

/// Frames the relay sends back. Everything except `Message` answers exactly
/// one request.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(tag = "op", content = "d", rename_all = "snake_case")]
pub enum RelayResponse {
    Published {
        request_id: u64,
        seq: u64,
    },
    History {
        request_id: u64,
        messages: Vec<SignalMessage>,
    },
    Subscribed {
        request_id: u64,
        subscription: SubscriptionId,
    },
    Unsubscribed {
        request_id: u64,
    },
    Room {
        request_id: u64,
        room: Room,
    },
    Error {
        request_id: u64,
        code: RelayErrorCode,
        message: String,
    },
    Message {
        subscription: SubscriptionId,
        message: SignalMessage,
    },
}

impl RelayResponse {
    pub fn request_id(&self) -> Option<u64> {
        match self {
            Self::Published { request_id, .. }
            | Self::History { request_id, .. }
            | Self::Subscribed { request_id, .. }
            | Self::Unsubscribed { request_id }
            | Self::Room { request_id, .. }
            | Self::Error { request_id, .. } => Some(*request_id),
            Self::Message { .. } => None,
        }
    }
}
