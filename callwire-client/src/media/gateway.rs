use super::track::{LocalStream, LocalTrack};
use crate::error::MediaError;
use async_trait::async_trait;
use callwire_core::{CapturePreset, CaptureSource, Quality};
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

/// Platform capture layer.
///
/// Tracks returned by `open` must release their device from the stop hook
/// (see [`LocalTrack::with_stop_hook`]).
#[async_trait]
pub trait CaptureBackend: Send + Sync {
    async fn open(
        &self,
        source: CaptureSource,
        preset: CapturePreset,
    ) -> Result<LocalTrack, MediaError>;
}

/// Owns every capture device used by a call.
pub struct MediaGateway {
    backend: Arc<dyn CaptureBackend>,
    acquired: Mutex<Vec<LocalTrack>>,
}

impl MediaGateway {
    pub fn new(backend: Arc<dyn CaptureBackend>) -> Self {
        Self {
            backend,
            acquired: Mutex::new(Vec::new()),
        }
    }

    /// Captures microphone and camera at the given quality.
    ///
    /// Either both devices are returned or neither stays open.
    pub async fn acquire(&self, quality: Quality) -> Result<LocalStream, MediaError> {
        let preset = quality.preset();
        info!(
            "Acquiring local media at {}x{}@{}",
            preset.width, preset.height, preset.frame_rate
        );

        let microphone = self.backend.open(CaptureSource::Microphone, preset).await?;
        let camera = match self.backend.open(CaptureSource::Camera, preset).await {
            Ok(track) => track,
            Err(e) => {
                warn!("Camera capture failed, releasing microphone: {}", e);
                microphone.stop();
                return Err(e);
            }
        };

        self.remember(&microphone);
        self.remember(&camera);
        Ok(LocalStream::new(vec![microphone, camera]))
    }

    /// Captures the screen as a video track.
    pub async fn acquire_screen(&self) -> Result<LocalTrack, MediaError> {
        let track = self
            .backend
            .open(CaptureSource::Screen, Quality::High.preset())
            .await?;
        info!("Screen capture started: {}", track.label());
        self.remember(&track);
        Ok(track)
    }

    pub fn release(&self, stream: &LocalStream) {
        for track in stream.tracks() {
            self.release_track(track);
        }
    }

    pub fn release_track(&self, track: &LocalTrack) {
        if track.stop() {
            info!("Released {} ({})", track.source(), track.label());
        }
        self.forget(track);
    }

    /// Stops everything still open.
    pub fn release_all(&self) {
        let tracks = match self.acquired.lock() {
            Ok(mut acquired) => std::mem::take(&mut *acquired),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        };
        for track in tracks {
            if track.stop() {
                info!("Released {} ({})", track.source(), track.label());
            }
        }
    }

    pub fn active_tracks(&self) -> usize {
        self.acquired
            .lock()
            .map(|acquired| acquired.iter().filter(|t| !t.is_stopped()).count())
            .unwrap_or(0)
    }

    fn remember(&self, track: &LocalTrack) {
        if let Ok(mut acquired) = self.acquired.lock() {
            acquired.push(track.clone());
        }
    }

    fn forget(&self, track: &LocalTrack) {
        if let Ok(mut acquired) = self.acquired.lock() {
            acquired.retain(|t| t != track);
        }
    }
}
