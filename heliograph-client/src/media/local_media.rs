use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use heliograph_core::model::MediaKind;
use webrtc::track::track_local::TrackLocal;

/// One captured local track plus its shared mute flag. The capture
/// collaborator keeps a clone of the flag and stops feeding samples while it
/// is false; the transport keeps running either way.
#[derive(Clone)]
pub struct LocalTrack {
    kind: MediaKind,
    track: Arc<dyn TrackLocal + Send + Sync>,
    enabled: Arc<AtomicBool>,
}

impl LocalTrack {
    pub fn new(kind: MediaKind, track: Arc<dyn TrackLocal + Send + Sync>) -> Self {
        Self {
            kind,
            track,
            enabled: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    pub fn handle(&self) -> Arc<dyn TrackLocal + Send + Sync> {
        self.track.clone()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    pub fn enabled_flag(&self) -> Arc<AtomicBool> {
        self.enabled.clone()
    }
}

/// The UI-supplied media bundle. Shared by every peer link (tracks are added
/// to each connection); never owned by any of them.
#[derive(Clone, Default)]
pub struct LocalMediaSource {
    tracks: Vec<LocalTrack>,
}

impl LocalMediaSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_track(mut self, kind: MediaKind, track: Arc<dyn TrackLocal + Send + Sync>) -> Self {
        self.tracks.push(LocalTrack::new(kind, track));
        self
    }

    pub fn tracks(&self) -> &[LocalTrack] {
        &self.tracks
    }

    pub fn set_enabled(&self, kind: MediaKind, enabled: bool) {
        for track in self.tracks.iter().filter(|t| t.kind == kind) {
            track.enabled.store(enabled, Ordering::Release);
        }
    }

    pub fn is_enabled(&self, kind: MediaKind) -> bool {
        self.tracks
            .iter()
            .filter(|t| t.kind == kind)
            .all(|t| t.is_enabled())
    }
}
