use callwire_core::{
    IceCandidate, ParticipantId, RoomId, SessionDescription, SignalKind, SignalMessage,
    SignalPayload,
};

pub fn offer(room: &RoomId, sender: &str, sdp: &str) -> SignalMessage {
    SignalMessage::new(
        room.clone(),
        ParticipantId::from(sender),
        SignalPayload::Offer(SessionDescription::offer(sdp)),
    )
}

pub fn answer(room: &RoomId, sender: &str, sdp: &str) -> SignalMessage {
    SignalMessage::new(
        room.clone(),
        ParticipantId::from(sender),
        SignalPayload::Answer(SessionDescription::answer(sdp)),
    )
}

pub fn candidate(room: &RoomId, sender: &str, candidate: &str) -> SignalMessage {
    SignalMessage::new(
        room.clone(),
        ParticipantId::from(sender),
        SignalPayload::IceCandidate(IceCandidate::new(candidate)),
    )
}

/// Same message as stored in the log at position `seq`.
pub fn with_seq(mut message: SignalMessage, seq: u64) -> SignalMessage {
    message.seq = seq;
    message
}

pub fn count_kind(log: &[SignalMessage], sender: &str, kind: SignalKind) -> usize {
    log.iter()
        .filter(|m| m.sender.as_str() == sender && m.kind() == kind)
        .count()
}
