use crate::error::SessionError;
use crate::negotiator::{AnswerOutcome, Negotiator};
use crate::protocol::seen::SeenMessages;
use callwire_core::{
    ChannelError, IceCandidate, ParticipantId, RoomId, SessionDescription, SignalChannel,
    SignalMessage, SignalPayload, SignalingState,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Which side of the first exchange this membership took.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapRole {
    /// The log held no offer; we published one.
    Offerer,
    /// We answered the latest offer from `remote`.
    Answerer { remote: ParticipantId },
    /// The log already held our own offer; waiting for its answer.
    AwaitingAnswer,
}

/// Routes room messages into a [`Negotiator`] and publishes its output.
///
/// Negotiation failures on remote input are logged and dropped. Only
/// channel failures are returned to the caller.
pub struct SignalingProtocol {
    room_id: RoomId,
    channel: Arc<dyn SignalChannel>,
    negotiator: Negotiator,
    seen: SeenMessages,
    outstanding_offer_seq: Option<u64>,
}

impl SignalingProtocol {
    pub fn new(
        room_id: RoomId,
        channel: Arc<dyn SignalChannel>,
        negotiator: Negotiator,
    ) -> Self {
        Self {
            room_id,
            channel,
            negotiator,
            seen: SeenMessages::default(),
            outstanding_offer_seq: None,
        }
    }

    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    pub fn participant(&self) -> &ParticipantId {
        self.negotiator.participant()
    }

    pub fn negotiator(&self) -> &Negotiator {
        &self.negotiator
    }

    pub fn negotiator_mut(&mut self) -> &mut Negotiator {
        &mut self.negotiator
    }

    /// Decides the initial role from the replayed room log.
    pub async fn bootstrap(
        &mut self,
        history: Vec<SignalMessage>,
    ) -> Result<BootstrapRole, SessionError> {
        for message in &history {
            self.seen.insert(message);
        }

        let me = self.participant().clone();
        let latest_remote_offer = history
            .iter()
            .filter(|m| !m.is_from(&me))
            .filter_map(|m| match &m.payload {
                SignalPayload::Offer(offer) => Some((m, offer)),
                _ => None,
            })
            .next_back();

        if let Some((offer_message, offer)) = latest_remote_offer {
            let remote = offer_message.sender.clone();
            info!(
                "{} joins {} as answerer to {} (offer seq {})",
                me, self.room_id, remote, offer_message.seq
            );

            match self.negotiator.handle_remote_offer(offer.clone()).await {
                Ok(answer) => {
                    self.publish(SignalPayload::Answer(answer)).await?;
                }
                Err(e) => warn!("{}: could not answer replayed offer: {}", me, e),
            }

            // candidates from an earlier ICE session are rejected by the
            // connection and dropped in apply_candidate
            let candidates = history.iter().filter(|m| m.is_from(&remote));
            for message in candidates {
                if let SignalPayload::IceCandidate(candidate) = &message.payload {
                    self.apply_candidate(candidate.clone()).await;
                }
            }
            return Ok(BootstrapRole::Answerer { remote });
        }

        let own_offer = history
            .iter()
            .any(|m| m.is_from(&me) && matches!(m.payload, SignalPayload::Offer(_)));
        if own_offer {
            info!("{} already offered in {}, waiting for an answer", me, self.room_id);
            return Ok(BootstrapRole::AwaitingAnswer);
        }

        info!("{} joins {} as offerer", me, self.room_id);
        let offer = self.negotiator.create_offer().await?;
        self.publish_offer(offer).await?;
        Ok(BootstrapRole::Offerer)
    }

    /// Handles one live message from the room subscription.
    pub async fn handle_message(&mut self, message: SignalMessage) -> Result<(), ChannelError> {
        if message.room_id != self.room_id || message.is_from(self.participant()) {
            return Ok(());
        }
        if let Some(receiver) = &message.receiver {
            if receiver != self.participant() {
                return Ok(());
            }
        }
        if !self.seen.insert(&message) {
            debug!(
                "{}: duplicate {} from {}",
                self.participant(),
                message.kind(),
                message.sender
            );
            return Ok(());
        }

        match message.payload {
            SignalPayload::Offer(offer) => {
                if self.keeps_own_offer(message.seq) {
                    info!(
                        "{}: glare with {}, keeping our earlier offer",
                        self.participant(),
                        message.sender
                    );
                    return Ok(());
                }
                match self.negotiator.handle_remote_offer(offer).await {
                    Ok(answer) => {
                        self.outstanding_offer_seq = None;
                        self.publish(SignalPayload::Answer(answer)).await?;
                    }
                    Err(e) => warn!(
                        "{}: failed to handle offer from {}: {}",
                        self.participant(),
                        message.sender,
                        e
                    ),
                }
            }
            SignalPayload::Answer(answer) => {
                match self.negotiator.handle_remote_answer(answer).await {
                    Ok(AnswerOutcome::Applied) => self.outstanding_offer_seq = None,
                    Ok(AnswerOutcome::Ignored) => {}
                    Err(e) => warn!(
                        "{}: failed to apply answer from {}: {}",
                        self.participant(),
                        message.sender,
                        e
                    ),
                }
            }
            SignalPayload::IceCandidate(candidate) => self.apply_candidate(candidate).await,
        }
        Ok(())
    }

    pub async fn publish_candidate(&self, candidate: IceCandidate) -> Result<u64, ChannelError> {
        self.publish(SignalPayload::IceCandidate(candidate)).await
    }

    /// Publishes a due restart or renegotiation offer.
    pub async fn flush_pending_offer(&mut self) -> Result<bool, SessionError> {
        let Some(offer) = self.negotiator.pending_offer().await? else {
            return Ok(false);
        };
        self.publish_offer(offer).await?;
        Ok(true)
    }

    async fn publish_offer(&mut self, offer: SessionDescription) -> Result<u64, ChannelError> {
        match self.publish(SignalPayload::Offer(offer)).await {
            Ok(seq) => {
                self.outstanding_offer_seq = Some(seq);
                Ok(seq)
            }
            Err(e) => {
                if let Err(rollback) = self.negotiator.abandon_local_offer().await {
                    warn!("{}: failed to drop undelivered offer: {}", self.participant(), rollback);
                }
                Err(e)
            }
        }
    }

    async fn publish(&self, payload: SignalPayload) -> Result<u64, ChannelError> {
        let message = SignalMessage::new(self.room_id.clone(), self.participant().clone(), payload);
        let kind = message.kind();
        let seq = self.channel.publish(message).await?;
        debug!("{}: published {} (seq {})", self.participant(), kind, seq);
        Ok(seq)
    }

    async fn apply_candidate(&mut self, candidate: IceCandidate) {
        if let Err(e) = self.negotiator.add_remote_candidate(candidate).await {
            warn!("{}: dropped remote candidate: {}", self.participant(), e);
        }
    }

    fn keeps_own_offer(&self, remote_seq: u64) -> bool {
        if self.negotiator.signaling_state() != SignalingState::HaveLocalOffer {
            return false;
        }
        matches!(self.outstanding_offer_seq, Some(own) if own < remote_seq)
    }
}
