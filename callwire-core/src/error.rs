use crate::model::RoomId;
use thiserror::Error;

/// Failures of the signal channel or room store collaborators.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChannelError {
    #[error("room {0} does not exist")]
    RoomNotFound(RoomId),

    #[error("room {0} already exists")]
    RoomExists(RoomId),

    #[error("room {0} has ended")]
    RoomEnded(RoomId),

    #[error("signal transport failed: {0}")]
    Transport(String),

    #[error("relay rejected request: {0}")]
    Protocol(String),

    #[error("signal channel is closed")]
    Closed,
}

impl ChannelError {
    /// Permanent errors are never worth retrying.
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            Self::RoomNotFound(_) | Self::RoomExists(_) | Self::RoomEnded(_) | Self::Protocol(_)
        )
    }
}
