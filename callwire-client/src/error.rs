use callwire_core::{CaptureSource, ChannelError, MediaKind, RoomId, SdpKind, SignalingState};
use thiserror::Error;

/// Capture failures. Never retried automatically.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MediaError {
    #[error("permission to use the {device} was denied")]
    PermissionDenied { device: CaptureSource },

    #[error("no usable {device} is available")]
    DeviceUnavailable { device: CaptureSource },

    #[error("failed to capture from the {device}: {reason}")]
    Capture {
        device: CaptureSource,
        reason: String,
    },
}

/// Failures reported by the underlying peer connection.
#[derive(Debug, Error)]
pub enum RtcError {
    #[error("peer connection rejected the operation: {0}")]
    Rejected(String),

    #[error("peer connection is closed")]
    Closed,

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

#[derive(Debug, Error)]
pub enum NegotiationError {
    #[error("negotiator is already initialized")]
    AlreadyInitialized,

    #[error("negotiator has no local media bound")]
    NotInitialized,

    #[error("cannot {operation} while signaling state is {state}")]
    InvalidState {
        operation: &'static str,
        state: SignalingState,
    },

    #[error("expected an SDP {expected:?}, got {actual:?}")]
    UnexpectedDescription { expected: SdpKind, actual: SdpKind },

    #[error("track kind {actual} cannot replace a {expected} sender")]
    KindMismatch {
        expected: MediaKind,
        actual: MediaKind,
    },

    #[error("negotiator is closed")]
    Closed,

    #[error(transparent)]
    Rtc(#[from] RtcError),
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("room {0} has ended")]
    RoomEnded(RoomId),

    #[error("{0}")]
    InvalidRequest(&'static str),

    #[error("call session is no longer running")]
    Stopped,

    #[error(transparent)]
    Media(#[from] MediaError),

    #[error(transparent)]
    Negotiation(#[from] NegotiationError),

    #[error(transparent)]
    Channel(#[from] ChannelError),

    #[error(transparent)]
    Rtc(#[from] RtcError),
}
