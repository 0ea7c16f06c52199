mod media;
mod participant;
mod relay;
mod room;
mod signaling;
mod state;

pub use media::{CapturePreset, CaptureSource, MediaKind, Quality};
pub use participant::ParticipantId;
pub use relay::{RelayErrorCode, RelayRequest, RelayResponse};
pub use room::{Room, RoomId, RoomStatus};
pub use signaling::{
    IceCandidate, IceServerConfig, SdpKind, SessionDescription, SignalKind, SignalMessage,
    SignalPayload,
};
pub use state::{ConnectivityState, SignalingState};
