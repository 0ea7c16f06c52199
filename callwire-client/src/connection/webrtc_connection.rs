use super::rtc_connection::{ConnectionEvent, ConnectionEventSender, RtcConnection, RtcConnector};
use crate::error::RtcError;
use crate::media::{LocalTrack, RemoteTrack};
use anyhow::{Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use callwire_core::{
    ConnectivityState, IceCandidate, IceServerConfig, MediaKind, SdpKind, SessionDescription,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info, warn};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::{MIME_TYPE_OPUS, MIME_TYPE_VP8, MediaEngine};
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_connection_state::RTCIceConnectionState;
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::media::Sample;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::offer_answer_options::RTCOfferOptions;
use webrtc::peer_connection::sdp::sdp_type::RTCSdpType;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::rtp_transceiver::RTCRtpTransceiver;
use webrtc::rtp_transceiver::rtp_codec::{RTCRtpCodecCapability, RTPCodecType};
use webrtc::rtp_transceiver::rtp_receiver::RTCRtpReceiver;
use webrtc::rtp_transceiver::rtp_sender::RTCRtpSender;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;
use webrtc::track::track_remote::TrackRemote;

/// Builds [`WebRtcConnection`]s on the webrtc-rs stack.
#[derive(Debug, Default, Clone)]
pub struct WebRtcConnector;

#[async_trait]
impl RtcConnector for WebRtcConnector {
    async fn connect(
        &self,
        ice_servers: &[IceServerConfig],
        events: ConnectionEventSender,
    ) -> Result<Arc<dyn RtcConnection>, RtcError> {
        let connection = WebRtcConnection::new(ice_servers, events).await?;
        Ok(Arc::new(connection))
    }
}

struct OutboundTrack {
    sender: Arc<RTCRtpSender>,
    track: Arc<TrackLocalStaticSample>,
}

pub struct WebRtcConnection {
    peer_connection: Arc<RTCPeerConnection>,
    outbound: Mutex<HashMap<MediaKind, OutboundTrack>>,
}

impl WebRtcConnection {
    pub async fn new(ice_servers: &[IceServerConfig], events: ConnectionEventSender) -> Result<Self> {
        let mut m = MediaEngine::default();
        m.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut m)?;

        let api = APIBuilder::new()
            .with_media_engine(m)
            .with_interceptor_registry(registry)
            .build();

        let rtc_config = RTCConfiguration {
            ice_servers: ice_servers
                .iter()
                .map(|server| RTCIceServer {
                    urls: server.urls.clone(),
                    username: server.username.clone().unwrap_or_default(),
                    credential: server.credential.clone().unwrap_or_default(),
                })
                .collect(),
            ..Default::default()
        };

        let peer_connection = Arc::new(
            api.new_peer_connection(rtc_config)
                .await
                .context("Failed to create peer connection")?,
        );

        let state_tx = events.clone();
        peer_connection.on_ice_connection_state_change(Box::new(
            move |s: RTCIceConnectionState| {
                let tx = state_tx.clone();
                Box::pin(async move {
                    let Some(state) = connectivity_from(s) else {
                        return;
                    };
                    info!("ICE connection state changed: {}", state);
                    let _ = tx.send(ConnectionEvent::Connectivity(state));
                })
            },
        ));

        let ice_tx = events.clone();
        peer_connection.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let tx = ice_tx.clone();
            Box::pin(async move {
                let Some(candidate) = c else { return };
                let Ok(init) = candidate.to_json() else {
                    return;
                };
                let _ = tx.send(ConnectionEvent::CandidateGathered(IceCandidate {
                    candidate: init.candidate,
                    sdp_mid: init.sdp_mid,
                    sdp_m_line_index: init.sdp_mline_index,
                }));
            })
        }));

        let track_tx = events;
        peer_connection.on_track(Box::new(
            move |track: Arc<TrackRemote>,
                  _receiver: Arc<RTCRtpReceiver>,
                  _transceiver: Arc<RTCRtpTransceiver>| {
                let tx = track_tx.clone();
                Box::pin(async move {
                    let kind = match track.kind() {
                        RTPCodecType::Audio => MediaKind::Audio,
                        _ => MediaKind::Video,
                    };
                    debug!("Remote {} track {} arrived", kind, track.id());
                    let _ = tx.send(ConnectionEvent::RemoteTrack(RemoteTrack {
                        id: track.id(),
                        stream_id: track.stream_id(),
                        kind,
                    }));
                })
            },
        ));

        Ok(Self {
            peer_connection,
            outbound: Mutex::new(HashMap::new()),
        })
    }

    /// Feeds one encoded media frame into the sender for `kind`.
    pub async fn write_sample(&self, kind: MediaKind, data: Bytes, duration: Duration) -> Result<()> {
        let track = self
            .outbound
            .lock()
            .map_err(|_| anyhow::anyhow!("outbound track table poisoned"))?
            .get(&kind)
            .map(|outbound| outbound.track.clone())
            .with_context(|| format!("No outbound {} track", kind))?;

        track
            .write_sample(&Sample {
                data,
                duration,
                ..Default::default()
            })
            .await
            .context("Failed to write media sample")?;
        Ok(())
    }

    fn sample_track(track: &LocalTrack) -> Arc<TrackLocalStaticSample> {
        let mime_type = match track.kind() {
            MediaKind::Audio => MIME_TYPE_OPUS,
            MediaKind::Video => MIME_TYPE_VP8,
        };
        Arc::new(TrackLocalStaticSample::new(
            RTCRtpCodecCapability {
                mime_type: mime_type.to_owned(),
                ..Default::default()
            },
            track.id().to_owned(),
            "callwire".to_owned(),
        ))
    }

    fn store(&self, kind: MediaKind, outbound: OutboundTrack) -> Result<()> {
        self.outbound
            .lock()
            .map_err(|_| anyhow::anyhow!("outbound track table poisoned"))?
            .insert(kind, outbound);
        Ok(())
    }
}

#[async_trait]
impl RtcConnection for WebRtcConnection {
    async fn add_track(&self, track: &LocalTrack) -> Result<(), RtcError> {
        let local = Self::sample_track(track);
        let sender = self
            .peer_connection
            .add_track(Arc::clone(&local) as Arc<dyn TrackLocal + Send + Sync>)
            .await
            .context("Failed to add local track")?;
        self.store(
            track.kind(),
            OutboundTrack {
                sender,
                track: local,
            },
        )?;
        Ok(())
    }

    async fn replace_track(&self, kind: MediaKind, track: &LocalTrack) -> Result<bool, RtcError> {
        let sender = self
            .outbound
            .lock()
            .map_err(|_| RtcError::Rejected("outbound track table poisoned".into()))?
            .get(&kind)
            .map(|outbound| outbound.sender.clone());
        let Some(sender) = sender else {
            return Ok(false);
        };

        let local = Self::sample_track(track);
        sender
            .replace_track(Some(Arc::clone(&local) as Arc<dyn TrackLocal + Send + Sync>))
            .await
            .context("Failed to replace outbound track")?;
        self.store(
            kind,
            OutboundTrack {
                sender,
                track: local,
            },
        )?;
        Ok(true)
    }

    async fn create_offer(&self, ice_restart: bool) -> Result<SessionDescription, RtcError> {
        let options = ice_restart.then(|| RTCOfferOptions {
            ice_restart: true,
            ..Default::default()
        });
        let offer = self
            .peer_connection
            .create_offer(options)
            .await
            .context("Failed to create SDP offer")?;
        Ok(SessionDescription::offer(offer.sdp))
    }

    async fn create_answer(&self) -> Result<SessionDescription, RtcError> {
        let answer = self
            .peer_connection
            .create_answer(None)
            .await
            .context("Failed to create SDP answer")?;
        Ok(SessionDescription::answer(answer.sdp))
    }

    async fn set_local_description(
        &self,
        description: &SessionDescription,
    ) -> Result<(), RtcError> {
        let desc = to_rtc_description(description)?;
        self.peer_connection
            .set_local_description(desc)
            .await
            .context("Failed to set local description")?;
        Ok(())
    }

    async fn set_remote_description(
        &self,
        description: &SessionDescription,
    ) -> Result<(), RtcError> {
        let desc = to_rtc_description(description)?;
        self.peer_connection
            .set_remote_description(desc)
            .await
            .context("Failed to set remote description")?;
        Ok(())
    }

    async fn rollback(&self) -> Result<(), RtcError> {
        // webrtc-rs rejects a rollback without an SDP body, so the pending
        // offer is resubmitted under the rollback type.
        let Some(mut pending) = self.peer_connection.pending_local_description().await else {
            return Ok(());
        };
        pending.sdp_type = RTCSdpType::Rollback;
        self.peer_connection
            .set_local_description(pending)
            .await
            .context("Failed to roll back local offer")?;
        Ok(())
    }

    async fn add_ice_candidate(&self, candidate: &IceCandidate) -> Result<(), RtcError> {
        self.peer_connection
            .add_ice_candidate(RTCIceCandidateInit {
                candidate: candidate.candidate.clone(),
                sdp_mid: candidate.sdp_mid.clone(),
                sdp_mline_index: candidate.sdp_m_line_index,
                ..Default::default()
            })
            .await
            .context("Failed to add ICE candidate")?;
        Ok(())
    }

    async fn close(&self) -> Result<(), RtcError> {
        if let Err(e) = self.peer_connection.close().await {
            warn!("Peer connection close reported an error: {}", e);
            return Err(RtcError::Backend(e.into()));
        }
        Ok(())
    }
}

fn to_rtc_description(description: &SessionDescription) -> Result<RTCSessionDescription> {
    let desc = match description.kind {
        SdpKind::Offer => RTCSessionDescription::offer(description.sdp.clone()),
        SdpKind::Answer => RTCSessionDescription::answer(description.sdp.clone()),
    };
    desc.context("Malformed session description")
}

fn connectivity_from(state: RTCIceConnectionState) -> Option<ConnectivityState> {
    let state = match state {
        RTCIceConnectionState::New => ConnectivityState::New,
        RTCIceConnectionState::Checking => ConnectivityState::Checking,
        RTCIceConnectionState::Connected => ConnectivityState::Connected,
        RTCIceConnectionState::Completed => ConnectivityState::Completed,
        RTCIceConnectionState::Disconnected => ConnectivityState::Disconnected,
        RTCIceConnectionState::Failed => ConnectivityState::Failed,
        RTCIceConnectionState::Closed => ConnectivityState::Closed,
        RTCIceConnectionState::Unspecified => return None,
    };
    Some(state)
}
