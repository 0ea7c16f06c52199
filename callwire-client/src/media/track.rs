use callwire_core::{CaptureSource, MediaKind};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

type StopHook = Box<dyn Fn() + Send + Sync>;

struct TrackInner {
    id: String,
    source: CaptureSource,
    label: String,
    enabled: AtomicBool,
    stopped: AtomicBool,
    on_stop: Option<StopHook>,
}

/// Handle to a captured local track.
///
/// Clones share state: muting or stopping through any clone is seen by all
/// of them. The stop hook runs at most once.
#[derive(Clone)]
pub struct LocalTrack {
    inner: Arc<TrackInner>,
}

impl LocalTrack {
    pub fn new(source: CaptureSource, label: impl Into<String>) -> Self {
        Self::build(source, label.into(), None)
    }

    /// Track whose `hook` releases the underlying device.
    pub fn with_stop_hook(
        source: CaptureSource,
        label: impl Into<String>,
        hook: impl Fn() + Send + Sync + 'static,
    ) -> Self {
        Self::build(source, label.into(), Some(Box::new(hook)))
    }

    fn build(source: CaptureSource, label: String, on_stop: Option<StopHook>) -> Self {
        Self {
            inner: Arc::new(TrackInner {
                id: uuid::Uuid::new_v4().to_string(),
                source,
                label,
                enabled: AtomicBool::new(true),
                stopped: AtomicBool::new(false),
                on_stop,
            }),
        }
    }

    pub fn id(&self) -> &str {
        &self.inner.id
    }

    pub fn kind(&self) -> MediaKind {
        self.inner.source.kind()
    }

    pub fn source(&self) -> CaptureSource {
        self.inner.source
    }

    pub fn label(&self) -> &str {
        &self.inner.label
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.enabled.load(Ordering::Acquire)
    }

    /// Mutes or unmutes without renegotiating.
    pub fn set_enabled(&self, enabled: bool) {
        self.inner.enabled.store(enabled, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.inner.stopped.load(Ordering::Acquire)
    }

    /// Stops the track. Returns `false` if it was already stopped.
    pub fn stop(&self) -> bool {
        if self.inner.stopped.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.inner.enabled.store(false, Ordering::Release);
        if let Some(hook) = &self.inner.on_stop {
            hook();
        }
        true
    }
}

impl PartialEq for LocalTrack {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl Eq for LocalTrack {}

impl fmt::Debug for LocalTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalTrack")
            .field("id", &self.inner.id)
            .field("source", &self.inner.source)
            .field("label", &self.inner.label)
            .field("enabled", &self.is_enabled())
            .field("stopped", &self.is_stopped())
            .finish()
    }
}

/// Microphone and camera captured together for one call.
#[derive(Debug, Clone)]
pub struct LocalStream {
    id: String,
    tracks: Vec<LocalTrack>,
}

impl LocalStream {
    pub fn new(tracks: Vec<LocalTrack>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            tracks,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn tracks(&self) -> &[LocalTrack] {
        &self.tracks
    }

    pub fn track(&self, kind: MediaKind) -> Option<&LocalTrack> {
        self.tracks.iter().find(|t| t.kind() == kind)
    }

    pub fn audio_track(&self) -> Option<&LocalTrack> {
        self.track(MediaKind::Audio)
    }

    pub fn video_track(&self) -> Option<&LocalTrack> {
        self.track(MediaKind::Video)
    }

    pub fn is_stopped(&self) -> bool {
        self.tracks.iter().all(LocalTrack::is_stopped)
    }
}

/// Inbound media announced by the peer connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTrack {
    pub id: String,
    pub stream_id: String,
    pub kind: MediaKind,
}
