use crate::error::SessionError;
use crate::media::LocalTrack;
use crate::negotiator::TrackSwap;
use callwire_core::{ConnectivityState, SignalingState};
use tokio::sync::oneshot;

/// Requests from the [`CallSession`](super::CallSession) handle to its loop.
#[derive(Debug)]
pub enum SessionCommand {
    StartScreenShare {
        reply: oneshot::Sender<Result<TrackSwap, SessionError>>,
    },

    /// Switches the video sender back to the camera.
    StopScreenShare {
        reply: oneshot::Sender<Result<TrackSwap, SessionError>>,
    },

    /// User-initiated ICE restart.
    Restart { reply: oneshot::Sender<()> },

    Snapshot {
        reply: oneshot::Sender<SessionSnapshot>,
    },

    Leave,
}

/// Point-in-time view of a running session.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub signaling: SignalingState,
    pub connectivity: ConnectivityState,
    pub pending_candidates: usize,
    pub outbound_tracks: Vec<LocalTrack>,
    pub sharing_screen: bool,
    pub restarts_remaining: u32,
}
