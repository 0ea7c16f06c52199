use callwire_core::{ParticipantId, SignalMessage, SignalPayload};
use std::collections::HashSet;

/// Dedup set keyed by sender and payload.
///
/// The channel delivers at least once, and the same message can show up
/// both in a replay and on the live feed.
#[derive(Debug, Default)]
pub struct SeenMessages {
    seen: HashSet<(ParticipantId, SignalPayload)>,
}

impl SeenMessages {
    /// Records `message`. Returns `false` if it was already recorded.
    pub fn insert(&mut self, message: &SignalMessage) -> bool {
        self.seen
            .insert((message.sender.clone(), message.payload.clone()))
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
