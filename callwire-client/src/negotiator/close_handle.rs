use super::events::NegotiatorEvent;
use crate::connection::RtcConnection;
use crate::media::LocalTrack;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{Notify, broadcast};
use tracing::{info, warn};

struct CloseState {
    closed: AtomicBool,
    notify: Notify,
    connection: Arc<dyn RtcConnection>,
    tracks: Mutex<Vec<LocalTrack>>,
    events: broadcast::Sender<NegotiatorEvent>,
}

/// Cancels a negotiator from outside its owner.
///
/// Closing is idempotent. In-flight negotiator operations notice the flag
/// after their next await and return without touching state.
#[derive(Clone)]
pub struct CloseHandle {
    state: Arc<CloseState>,
}

impl CloseHandle {
    pub(crate) fn new(
        connection: Arc<dyn RtcConnection>,
        events: broadcast::Sender<NegotiatorEvent>,
    ) -> Self {
        Self {
            state: Arc::new(CloseState {
                closed: AtomicBool::new(false),
                notify: Notify::new(),
                connection,
                tracks: Mutex::new(Vec::new()),
                events,
            }),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.state.closed.load(Ordering::Acquire)
    }

    pub async fn close(&self) {
        if self.state.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        info!("Closing negotiator");
        self.state.notify.notify_waiters();

        for track in self.take_tracks() {
            track.stop();
        }
        if let Err(e) = self.state.connection.close().await {
            warn!("Error while closing peer connection: {}", e);
        }
        let _ = self.state.events.send(NegotiatorEvent::Closed);
    }

    /// Resolves once [`close`](Self::close) has been called.
    pub async fn closed(&self) {
        loop {
            let notified = self.state.notify.notified();
            if self.is_closed() {
                return;
            }
            notified.await;
        }
    }

    /// Registers a track to be stopped on close.
    pub(crate) fn own(&self, track: &LocalTrack) {
        if self.is_closed() {
            track.stop();
            return;
        }
        if let Ok(mut tracks) = self.state.tracks.lock() {
            if !tracks.contains(track) {
                tracks.push(track.clone());
            }
        }
    }

    fn take_tracks(&self) -> Vec<LocalTrack> {
        match self.state.tracks.lock() {
            Ok(mut tracks) => std::mem::take(&mut *tracks),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }
}
