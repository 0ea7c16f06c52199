use super::candidate_queue::CandidateQueue;
use super::close_handle::CloseHandle;
use super::events::NegotiatorEvent;
use super::restart::{RestartBudget, RestartDecision};
use crate::connection::RtcConnection;
use crate::error::NegotiationError;
use crate::media::{LocalStream, LocalTrack, RemoteTrack};
use callwire_core::{
    ConnectivityState, IceCandidate, MediaKind, ParticipantId, SdpKind, SessionDescription,
    SignalingState,
};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// How a track swap was carried out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackSwap {
    /// An existing sender now carries the new track. No renegotiation.
    Replaced,
    /// A new sender was added; an offer is pending.
    Added,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerOutcome {
    Applied,
    /// No local offer was outstanding.
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OfferPurpose {
    Initial,
    Renegotiation,
    Restart,
}

/// Offer/answer state machine around one peer connection.
///
/// All mutation goes through `&mut self`, so the owner serializes remote
/// input and local requests. Only [`CloseHandle`] may act concurrently.
pub struct Negotiator {
    participant: ParticipantId,
    connection: Arc<dyn RtcConnection>,
    close: CloseHandle,
    events: broadcast::Sender<NegotiatorEvent>,
    initialized: bool,
    local_tracks: Vec<LocalTrack>,
    signaling: SignalingState,
    connectivity: ConnectivityState,
    has_remote_description: bool,
    pending_candidates: CandidateQueue,
    outstanding_offer: Option<OfferPurpose>,
    renegotiation_needed: bool,
    restart_pending: bool,
    restart_budget: RestartBudget,
}

impl Negotiator {
    pub fn new(
        participant: ParticipantId,
        connection: Arc<dyn RtcConnection>,
        max_restart_attempts: u32,
        events: broadcast::Sender<NegotiatorEvent>,
    ) -> Self {
        let close = CloseHandle::new(connection.clone(), events.clone());
        Self {
            participant,
            connection,
            close,
            events,
            initialized: false,
            local_tracks: Vec::new(),
            signaling: SignalingState::Stable,
            connectivity: ConnectivityState::New,
            has_remote_description: false,
            pending_candidates: CandidateQueue::default(),
            outstanding_offer: None,
            renegotiation_needed: false,
            restart_pending: false,
            restart_budget: RestartBudget::new(max_restart_attempts),
        }
    }

    pub fn participant(&self) -> &ParticipantId {
        &self.participant
    }

    pub fn close_handle(&self) -> CloseHandle {
        self.close.clone()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<NegotiatorEvent> {
        self.events.subscribe()
    }

    pub fn is_closed(&self) -> bool {
        self.close.is_closed()
    }

    pub fn signaling_state(&self) -> SignalingState {
        if self.is_closed() {
            SignalingState::Closed
        } else {
            self.signaling
        }
    }

    pub fn connectivity_state(&self) -> ConnectivityState {
        self.connectivity
    }

    pub fn has_remote_description(&self) -> bool {
        self.has_remote_description
    }

    pub fn pending_candidate_count(&self) -> usize {
        self.pending_candidates.len()
    }

    pub fn local_tracks(&self) -> &[LocalTrack] {
        &self.local_tracks
    }

    pub fn restarts_remaining(&self) -> u32 {
        self.restart_budget.remaining()
    }

    /// Binds local media to the connection. Must precede any exchange.
    pub async fn initialize(&mut self, stream: &LocalStream) -> Result<(), NegotiationError> {
        self.ensure_open()?;
        if self.initialized {
            return Err(NegotiationError::AlreadyInitialized);
        }

        for track in stream.tracks() {
            self.connection.add_track(track).await?;
            self.ensure_open()?;
            self.close.own(track);
            self.local_tracks.push(track.clone());
        }
        self.initialized = true;

        info!(
            "{} bound {} local tracks",
            self.participant,
            self.local_tracks.len()
        );
        Ok(())
    }

    /// Produces a local offer and applies it. Valid only in `stable`.
    pub async fn create_offer(&mut self) -> Result<SessionDescription, NegotiationError> {
        self.make_offer(OfferPurpose::Initial).await
    }

    /// Answers a remote offer, rolling back our own outstanding offer first.
    pub async fn handle_remote_offer(
        &mut self,
        offer: SessionDescription,
    ) -> Result<SessionDescription, NegotiationError> {
        self.ensure_open()?;
        self.ensure_initialized()?;
        expect_kind(&offer, SdpKind::Offer)?;

        if self.signaling == SignalingState::HaveLocalOffer {
            info!("{}: glare, rolling back local offer", self.participant);
            self.connection.rollback().await?;
            self.ensure_open()?;
            match self.outstanding_offer.take() {
                Some(OfferPurpose::Renegotiation) => self.renegotiation_needed = true,
                Some(OfferPurpose::Restart) => self.restart_pending = true,
                _ => {}
            }
            self.set_signaling(SignalingState::Stable);
        }

        self.connection.set_remote_description(&offer).await?;
        self.ensure_open()?;
        self.has_remote_description = true;
        self.set_signaling(SignalingState::HaveRemoteOffer);
        self.flush_candidates().await?;

        let answer = self.connection.create_answer().await?;
        self.ensure_open()?;
        self.connection.set_local_description(&answer).await?;
        self.ensure_open()?;
        self.set_signaling(SignalingState::Stable);

        debug!("{}: answered remote offer", self.participant);
        Ok(answer)
    }

    /// Applies a remote answer. Stale answers are ignored, not errors.
    pub async fn handle_remote_answer(
        &mut self,
        answer: SessionDescription,
    ) -> Result<AnswerOutcome, NegotiationError> {
        self.ensure_open()?;
        expect_kind(&answer, SdpKind::Answer)?;

        if self.signaling != SignalingState::HaveLocalOffer {
            debug!(
                "{}: ignoring answer in state {}",
                self.participant, self.signaling
            );
            return Ok(AnswerOutcome::Ignored);
        }

        self.connection.set_remote_description(&answer).await?;
        self.ensure_open()?;
        self.has_remote_description = true;
        self.outstanding_offer = None;
        self.set_signaling(SignalingState::Stable);
        self.flush_candidates().await?;

        debug!("{}: remote answer applied", self.participant);
        Ok(AnswerOutcome::Applied)
    }

    /// Applies a remote candidate, or queues it until a remote description
    /// exists. A candidate the connection rejects is logged and dropped.
    pub async fn add_remote_candidate(
        &mut self,
        candidate: IceCandidate,
    ) -> Result<(), NegotiationError> {
        self.ensure_open()?;

        if !self.has_remote_description {
            debug!(
                "{}: queueing candidate until a remote description arrives",
                self.participant
            );
            self.pending_candidates.push(candidate);
            return Ok(());
        }

        self.apply_candidate(&candidate).await;
        self.ensure_open()
    }

    /// Swaps the outgoing `kind` track, adding a sender if none exists.
    pub async fn replace_outbound_track(
        &mut self,
        kind: MediaKind,
        track: LocalTrack,
    ) -> Result<TrackSwap, NegotiationError> {
        self.ensure_open()?;
        self.ensure_initialized()?;
        if track.kind() != kind {
            return Err(NegotiationError::KindMismatch {
                expected: kind,
                actual: track.kind(),
            });
        }

        let swap = if self.connection.replace_track(kind, &track).await? {
            TrackSwap::Replaced
        } else {
            self.ensure_open()?;
            self.connection.add_track(&track).await?;
            self.renegotiation_needed = true;
            TrackSwap::Added
        };
        self.ensure_open()?;

        self.close.own(&track);
        self.local_tracks.retain(|t| t.kind() != kind);
        self.local_tracks.push(track);

        info!("{}: outbound {} track {:?}", self.participant, kind, swap);
        Ok(swap)
    }

    /// Feeds an observed connectivity change.
    ///
    /// Each transition into `failed` spends one restart attempt; reaching
    /// `connected` or `completed` refills the budget.
    pub fn on_connectivity_change(&mut self, state: ConnectivityState) -> RestartDecision {
        if self.is_closed() || state == self.connectivity {
            return RestartDecision::NotNeeded;
        }
        self.connectivity = state;
        self.emit(NegotiatorEvent::ConnectivityChanged(state));

        if state.is_connected() {
            self.restart_budget.refill();
            return RestartDecision::NotNeeded;
        }
        if state != ConnectivityState::Failed {
            return RestartDecision::NotNeeded;
        }

        if self.restart_budget.try_consume() {
            info!(
                "{}: connectivity failed, scheduling ICE restart ({} left)",
                self.participant,
                self.restart_budget.remaining()
            );
            self.restart_pending = true;
            RestartDecision::Scheduled
        } else {
            warn!("{}: connectivity failed, no restarts left", self.participant);
            self.restart_pending = false;
            self.emit(NegotiatorEvent::ConnectionLost {
                reason: "ICE restart attempts exhausted".into(),
            });
            RestartDecision::Exhausted
        }
    }

    pub fn on_remote_track(&self, track: RemoteTrack) {
        if self.is_closed() {
            return;
        }
        self.emit(NegotiatorEvent::RemoteStream(track));
    }

    /// Requests an ICE restart outside the automatic budget.
    pub fn request_restart(&mut self) {
        if !self.is_closed() {
            self.restart_pending = true;
        }
    }

    pub fn has_pending_offer(&self) -> bool {
        self.restart_pending || self.renegotiation_needed
    }

    /// Creates the restart or renegotiation offer that is due, if any.
    ///
    /// Returns `None` while another exchange is in flight; the work stays
    /// queued until signaling is stable again.
    pub async fn pending_offer(&mut self) -> Result<Option<SessionDescription>, NegotiationError> {
        if self.is_closed() || self.signaling != SignalingState::Stable {
            return Ok(None);
        }

        let purpose = if self.restart_pending {
            OfferPurpose::Restart
        } else if self.renegotiation_needed {
            OfferPurpose::Renegotiation
        } else {
            return Ok(None);
        };

        match self.make_offer(purpose).await {
            Ok(offer) => Ok(Some(offer)),
            Err(e) if purpose == OfferPurpose::Restart && !self.is_closed() => {
                warn!("{}: ICE restart offer failed: {}", self.participant, e);
                self.restart_pending = false;
                self.emit(NegotiatorEvent::ConnectionLost {
                    reason: format!("ICE restart failed: {}", e),
                });
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    /// Drops our outstanding offer, e.g. when it could not be delivered.
    pub async fn abandon_local_offer(&mut self) -> Result<(), NegotiationError> {
        self.ensure_open()?;
        if self.signaling != SignalingState::HaveLocalOffer {
            return Ok(());
        }
        self.connection.rollback().await?;
        self.ensure_open()?;
        let purpose = self.outstanding_offer.take();
        self.set_signaling(SignalingState::Stable);
        match purpose {
            Some(OfferPurpose::Renegotiation) => self.renegotiation_needed = true,
            // the restart already spent its attempt; retrying here would bypass the budget
            Some(OfferPurpose::Restart) => {
                warn!("{}: ICE restart offer could not be delivered", self.participant);
                self.restart_pending = false;
                self.emit(NegotiatorEvent::ConnectionLost {
                    reason: "ICE restart offer could not be delivered".to_string(),
                });
            }
            _ => {}
        }
        Ok(())
    }

    pub async fn close(&mut self) {
        self.close.close().await;
        self.signaling = SignalingState::Closed;
        self.pending_candidates.drain();
        self.restart_pending = false;
        self.renegotiation_needed = false;
    }

    async fn make_offer(
        &mut self,
        purpose: OfferPurpose,
    ) -> Result<SessionDescription, NegotiationError> {
        self.ensure_open()?;
        self.ensure_initialized()?;
        if self.signaling != SignalingState::Stable {
            return Err(NegotiationError::InvalidState {
                operation: "create an offer",
                state: self.signaling,
            });
        }

        let ice_restart = purpose == OfferPurpose::Restart;
        let offer = self.connection.create_offer(ice_restart).await?;
        self.ensure_open()?;
        self.connection.set_local_description(&offer).await?;
        self.ensure_open()?;

        match purpose {
            OfferPurpose::Restart => self.restart_pending = false,
            OfferPurpose::Renegotiation => self.renegotiation_needed = false,
            OfferPurpose::Initial => {}
        }
        self.outstanding_offer = Some(purpose);
        self.set_signaling(SignalingState::HaveLocalOffer);

        debug!("{}: created {:?} offer", self.participant, purpose);
        Ok(offer)
    }

    async fn flush_candidates(&mut self) -> Result<(), NegotiationError> {
        let queued = self.pending_candidates.drain();
        if !queued.is_empty() {
            debug!(
                "{}: applying {} queued candidates",
                self.participant,
                queued.len()
            );
        }
        for candidate in queued {
            self.apply_candidate(&candidate).await;
            self.ensure_open()?;
        }
        Ok(())
    }

    async fn apply_candidate(&self, candidate: &IceCandidate) {
        if let Err(e) = self.connection.add_ice_candidate(candidate).await {
            warn!("{}: failed to add ICE candidate: {}", self.participant, e);
        }
    }

    fn set_signaling(&mut self, state: SignalingState) {
        if self.signaling == state {
            return;
        }
        self.signaling = state;
        self.emit(NegotiatorEvent::SignalingChanged(state));
    }

    fn emit(&self, event: NegotiatorEvent) {
        // no receivers is fine
        let _ = self.events.send(event);
    }

    fn ensure_open(&self) -> Result<(), NegotiationError> {
        if self.is_closed() {
            return Err(NegotiationError::Closed);
        }
        Ok(())
    }

    fn ensure_initialized(&self) -> Result<(), NegotiationError> {
        if !self.initialized {
            return Err(NegotiationError::NotInitialized);
        }
        Ok(())
    }
}

fn expect_kind(description: &SessionDescription, expected: SdpKind) -> Result<(), NegotiationError> {
    if description.kind != expected {
        return Err(NegotiationError::UnexpectedDescription {
            expected,
            actual: description.kind,
        });
    }
    Ok(())
}
