use crate::media::RemoteTrack;
use callwire_core::{ConnectivityState, SignalingState};

/// Notifications for whoever renders the call.
#[derive(Debug, Clone, PartialEq)]
pub enum NegotiatorEvent {
    RemoteStream(RemoteTrack),
    ConnectivityChanged(ConnectivityState),
    SignalingChanged(SignalingState),
    /// Automatic recovery gave up.
    ConnectionLost { reason: String },
    Closed,
}
