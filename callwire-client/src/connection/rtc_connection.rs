use crate::error::RtcError;
use crate::media::{LocalTrack, RemoteTrack};
use async_trait::async_trait;
use callwire_core::{ConnectivityState, IceCandidate, IceServerConfig, MediaKind, SessionDescription};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Asynchronous notifications raised by a peer connection.
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionEvent {
    CandidateGathered(IceCandidate),
    Connectivity(ConnectivityState),
    RemoteTrack(RemoteTrack),
}

pub type ConnectionEventSender = mpsc::UnboundedSender<ConnectionEvent>;

/// The slice of a WebRTC peer connection the negotiator drives.
#[async_trait]
pub trait RtcConnection: Send + Sync {
    async fn add_track(&self, track: &LocalTrack) -> Result<(), RtcError>;

    /// Swaps the outgoing track of an existing `kind` sender in place.
    /// Returns `false` when no such sender exists.
    async fn replace_track(&self, kind: MediaKind, track: &LocalTrack) -> Result<bool, RtcError>;

    async fn create_offer(&self, ice_restart: bool) -> Result<SessionDescription, RtcError>;

    async fn create_answer(&self) -> Result<SessionDescription, RtcError>;

    async fn set_local_description(&self, description: &SessionDescription)
    -> Result<(), RtcError>;

    async fn set_remote_description(
        &self,
        description: &SessionDescription,
    ) -> Result<(), RtcError>;

    /// Discards a pending local offer and returns to `stable`.
    async fn rollback(&self) -> Result<(), RtcError>;

    async fn add_ice_candidate(&self, candidate: &IceCandidate) -> Result<(), RtcError>;

    async fn close(&self) -> Result<(), RtcError>;
}

/// Creates peer connections that report into `events`.
#[async_trait]
pub trait RtcConnector: Send + Sync {
    async fn connect(
        &self,
        ice_servers: &[IceServerConfig],
        events: ConnectionEventSender,
    ) -> Result<Arc<dyn RtcConnection>, RtcError>;
}
