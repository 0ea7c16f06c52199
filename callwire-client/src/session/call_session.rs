use super::session_actor::SessionActor;
use super::session_command::{SessionCommand, SessionSnapshot};
use crate::config::ClientConfig;
use crate::connection::RtcConnector;
use crate::error::SessionError;
use crate::media::{LocalStream, MediaGateway};
use crate::negotiator::{CloseHandle, Negotiator, NegotiatorEvent, TrackSwap};
use crate::protocol::{BootstrapRole, SignalingProtocol};
use crate::signal::RetryingChannel;
use callwire_core::{ParticipantId, Room, RoomId, RoomStore, SignalChannel, Subscription};
use std::sync::{Arc, Mutex};
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Services a call is built from.
#[derive(Clone)]
pub struct SessionDeps {
    pub channel: Arc<dyn SignalChannel>,
    pub rooms: Arc<dyn RoomStore>,
    pub media: Arc<MediaGateway>,
    pub connector: Arc<dyn RtcConnector>,
}

/// One participant's membership in a room.
pub struct CallSession {
    room_id: RoomId,
    participant: ParticipantId,
    role: BootstrapRole,
    local_stream: LocalStream,
    rooms: Arc<dyn RoomStore>,
    commands: mpsc::Sender<SessionCommand>,
    events: broadcast::Sender<NegotiatorEvent>,
    first_events: Mutex<Option<broadcast::Receiver<NegotiatorEvent>>>,
    close: CloseHandle,
    task: JoinHandle<()>,
}

impl CallSession {
    /// Joins an active room: captures media, subscribes, replays the log and
    /// takes the offerer or answerer role.
    ///
    /// On failure nothing stays open.
    pub async fn join(
        room_id: RoomId,
        participant: ParticipantId,
        deps: SessionDeps,
        config: ClientConfig,
    ) -> Result<Self, SessionError> {
        let room = deps.rooms.room(&room_id).await?;
        if !room.is_active() {
            warn!("{} tried to join ended room {}", participant, room_id);
            return Err(SessionError::RoomEnded(room_id));
        }

        let channel: Arc<dyn SignalChannel> = if config.publish_retry.is_enabled() {
            Arc::new(RetryingChannel::new(
                deps.channel.clone(),
                config.publish_retry.clone(),
            ))
        } else {
            deps.channel.clone()
        };

        let local_stream = deps.media.acquire(config.quality).await?;

        let (connection_tx, connection_rx) = mpsc::unbounded_channel();
        let connection = match deps.connector.connect(&config.ice_servers, connection_tx).await {
            Ok(connection) => connection,
            Err(e) => {
                deps.media.release(&local_stream);
                return Err(e.into());
            }
        };

        let (events, first_events) = broadcast::channel(config.event_capacity.max(1));
        let negotiator = Negotiator::new(
            participant.clone(),
            connection,
            config.max_restart_attempts,
            events.clone(),
        );
        let close = negotiator.close_handle();
        let mut protocol = SignalingProtocol::new(room_id.clone(), channel.clone(), negotiator);

        let (subscription, role) = match start(&mut protocol, &channel, &local_stream).await {
            Ok(started) => started,
            Err(e) => {
                warn!("{} failed to join {}: {}", participant, room_id, e);
                protocol.negotiator_mut().close().await;
                deps.media.release(&local_stream);
                return Err(e);
            }
        };
        info!("{} joined room {} as {:?}", participant, room_id, role);

        let (commands, command_rx) = mpsc::channel(32);
        let actor = SessionActor {
            protocol,
            channel,
            subscription,
            connection_events: connection_rx,
            commands: command_rx,
            media: deps.media.clone(),
            local_stream: local_stream.clone(),
            screen_track: None,
            close: close.clone(),
        };
        let task = tokio::spawn(actor.run());

        Ok(Self {
            room_id,
            participant,
            role,
            local_stream,
            rooms: deps.rooms,
            commands,
            events,
            first_events: Mutex::new(Some(first_events)),
            close,
            task,
        })
    }

    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    pub fn participant(&self) -> &ParticipantId {
        &self.participant
    }

    pub fn role(&self) -> &BootstrapRole {
        &self.role
    }

    pub fn local_stream(&self) -> &LocalStream {
        &self.local_stream
    }

    /// Event feed. The first call returns a receiver holding everything
    /// emitted since join; later calls see only new events.
    pub fn events(&self) -> broadcast::Receiver<NegotiatorEvent> {
        if let Ok(mut first) = self.first_events.lock() {
            if let Some(rx) = first.take() {
                return rx;
            }
        }
        self.events.subscribe()
    }

    pub fn set_audio_enabled(&self, enabled: bool) {
        if let Some(track) = self.local_stream.audio_track() {
            track.set_enabled(enabled);
        }
    }

    /// Mutes or unmutes the camera.
    pub fn set_video_enabled(&self, enabled: bool) {
        if let Some(track) = self.local_stream.video_track() {
            track.set_enabled(enabled);
        }
    }

    pub async fn start_screen_share(&self) -> Result<TrackSwap, SessionError> {
        self.request(|reply| SessionCommand::StartScreenShare { reply })
            .await?
    }

    pub async fn stop_screen_share(&self) -> Result<TrackSwap, SessionError> {
        self.request(|reply| SessionCommand::StopScreenShare { reply })
            .await?
    }

    pub async fn restart(&self) -> Result<(), SessionError> {
        self.request(|reply| SessionCommand::Restart { reply }).await
    }

    pub async fn snapshot(&self) -> Result<SessionSnapshot, SessionError> {
        self.request(|reply| SessionCommand::Snapshot { reply }).await
    }

    pub fn is_closed(&self) -> bool {
        self.close.is_closed()
    }

    /// Leaves the room without ending it for the other participant.
    pub async fn leave(self) {
        info!("{} leaving room {}", self.participant, self.room_id);
        self.close.close().await;
        let _ = self.commands.send(SessionCommand::Leave).await;
        if let Err(e) = self.task.await {
            warn!("Session task ended abnormally: {}", e);
        }
    }

    /// Ends the room for everyone, then leaves.
    pub async fn end_call(self) -> Result<Room, SessionError> {
        let ended = self.rooms.end_room(&self.room_id).await;
        self.leave().await;
        Ok(ended?)
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> SessionCommand,
    ) -> Result<T, SessionError> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(build(tx))
            .await
            .map_err(|_| SessionError::Stopped)?;
        rx.await.map_err(|_| SessionError::Stopped)
    }
}

async fn start(
    protocol: &mut SignalingProtocol,
    channel: &Arc<dyn SignalChannel>,
    stream: &LocalStream,
) -> Result<(Subscription, BootstrapRole), SessionError> {
    protocol.negotiator_mut().initialize(stream).await?;

    let room_id = protocol.room_id().clone();
    let subscription = channel.subscribe(&room_id).await?;

    let history = match channel.replay(&room_id).await {
        Ok(history) => history,
        Err(e) => {
            drop_subscription(channel, &subscription).await;
            return Err(e.into());
        }
    };

    match protocol.bootstrap(history).await {
        Ok(role) => Ok((subscription, role)),
        Err(e) => {
            drop_subscription(channel, &subscription).await;
            Err(e)
        }
    }
}

async fn drop_subscription(channel: &Arc<dyn SignalChannel>, subscription: &Subscription) {
    if let Err(e) = channel.unsubscribe(subscription.id).await {
        warn!("Failed to unsubscribe {}: {}", subscription.id, e);
    }
}
