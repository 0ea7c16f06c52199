use super::session_command::{SessionCommand, SessionSnapshot};
use crate::connection::ConnectionEvent;
use crate::error::SessionError;
use crate::media::{LocalStream, LocalTrack, MediaGateway};
use crate::negotiator::{CloseHandle, RestartDecision, TrackSwap};
use crate::protocol::SignalingProtocol;
use callwire_core::{MediaKind, SignalChannel, SignalMessage, Subscription};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Owns the negotiator for one membership and serializes everything that
/// touches it.
pub(crate) struct SessionActor {
    pub(crate) protocol: SignalingProtocol,
    pub(crate) channel: Arc<dyn SignalChannel>,
    pub(crate) subscription: Subscription,
    pub(crate) connection_events: mpsc::UnboundedReceiver<ConnectionEvent>,
    pub(crate) commands: mpsc::Receiver<SessionCommand>,
    pub(crate) media: Arc<MediaGateway>,
    pub(crate) local_stream: LocalStream,
    pub(crate) screen_track: Option<LocalTrack>,
    pub(crate) close: CloseHandle,
}

impl SessionActor {
    pub(crate) async fn run(mut self) {
        info!(
            "Session loop started for {} in room {}",
            self.protocol.participant(),
            self.protocol.room_id()
        );

        let mut signals_open = true;
        let mut connection_open = true;

        loop {
            tokio::select! {
                cmd = self.commands.recv() => {
                    match cmd {
                        Some(SessionCommand::Leave) => break,
                        Some(c) => self.handle_command(c).await,
                        None => {
                            info!("Command channel closed. Leaving call.");
                            break;
                        }
                    }
                }

                msg = self.subscription.messages.recv(), if signals_open => {
                    match msg {
                        Some(m) => self.handle_signal(m).await,
                        None => {
                            warn!("Signal subscription closed unexpectedly");
                            signals_open = false;
                        }
                    }
                }

                evt = self.connection_events.recv(), if connection_open => {
                    match evt {
                        Some(e) => self.handle_connection_event(e).await,
                        None => connection_open = false,
                    }
                }

                _ = self.close.closed() => break,
            }

            if self.close.is_closed() {
                break;
            }
            self.flush_pending_offer().await;
        }

        self.shutdown().await;
    }

    async fn handle_command(&mut self, cmd: SessionCommand) {
        match cmd {
            SessionCommand::StartScreenShare { reply } => {
                let _ = reply.send(self.start_screen_share().await);
            }
            SessionCommand::StopScreenShare { reply } => {
                let _ = reply.send(self.stop_screen_share().await);
            }
            SessionCommand::Restart { reply } => {
                info!("Manual ICE restart requested");
                self.protocol.negotiator_mut().request_restart();
                let _ = reply.send(());
            }
            SessionCommand::Snapshot { reply } => {
                let _ = reply.send(self.snapshot());
            }
            SessionCommand::Leave => {}
        }
    }

    async fn handle_signal(&mut self, message: SignalMessage) {
        if let Err(e) = self.protocol.handle_message(message).await {
            warn!("Failed to publish signaling response: {}", e);
        }
    }

    async fn handle_connection_event(&mut self, event: ConnectionEvent) {
        match event {
            ConnectionEvent::CandidateGathered(candidate) => {
                if let Err(e) = self.protocol.publish_candidate(candidate).await {
                    warn!("Failed to publish local candidate: {}", e);
                }
            }
            ConnectionEvent::Connectivity(state) => {
                let decision = self.protocol.negotiator_mut().on_connectivity_change(state);
                if decision != RestartDecision::NotNeeded {
                    debug!("Connectivity {} -> {:?}", state, decision);
                }
            }
            ConnectionEvent::RemoteTrack(track) => {
                info!("Remote {} track {} available", track.kind, track.id);
                self.protocol.negotiator().on_remote_track(track);
            }
        }
    }

    async fn flush_pending_offer(&mut self) {
        if !self.protocol.negotiator().has_pending_offer() {
            return;
        }
        match self.protocol.flush_pending_offer().await {
            Ok(true) => info!("Published pending offer"),
            Ok(false) => {}
            Err(e) => warn!("Failed to publish pending offer: {}", e),
        }
    }

    async fn start_screen_share(&mut self) -> Result<TrackSwap, SessionError> {
        if self.screen_track.is_some() {
            return Err(SessionError::InvalidRequest("screen share is already active"));
        }

        let screen = self.media.acquire_screen().await?;
        match self
            .protocol
            .negotiator_mut()
            .replace_outbound_track(MediaKind::Video, screen.clone())
            .await
        {
            Ok(swap) => {
                self.screen_track = Some(screen);
                Ok(swap)
            }
            Err(e) => {
                self.media.release_track(&screen);
                Err(e.into())
            }
        }
    }

    async fn stop_screen_share(&mut self) -> Result<TrackSwap, SessionError> {
        let Some(camera) = self.local_stream.video_track().cloned() else {
            return Err(SessionError::InvalidRequest("no camera track to switch back to"));
        };
        let Some(screen) = self.screen_track.take() else {
            return Err(SessionError::InvalidRequest("screen share is not active"));
        };

        let swap = self
            .protocol
            .negotiator_mut()
            .replace_outbound_track(MediaKind::Video, camera)
            .await;
        self.media.release_track(&screen);
        Ok(swap?)
    }

    fn snapshot(&self) -> SessionSnapshot {
        let negotiator = self.protocol.negotiator();
        SessionSnapshot {
            signaling: negotiator.signaling_state(),
            connectivity: negotiator.connectivity_state(),
            pending_candidates: negotiator.pending_candidate_count(),
            outbound_tracks: negotiator.local_tracks().to_vec(),
            sharing_screen: self.screen_track.is_some(),
            restarts_remaining: negotiator.restarts_remaining(),
        }
    }

    async fn shutdown(mut self) {
        self.protocol.negotiator_mut().close().await;

        if let Err(e) = self.channel.unsubscribe(self.subscription.id).await {
            warn!("Failed to unsubscribe {}: {}", self.subscription.id, e);
        }
        if let Some(screen) = self.screen_track.take() {
            self.media.release_track(&screen);
        }
        self.media.release(&self.local_stream);

        info!(
            "Session loop finished for {} in room {}",
            self.protocol.participant(),
            self.protocol.room_id()
        );
    }
}
