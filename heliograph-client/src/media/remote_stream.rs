use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use heliograph_core::model::{MediaKind, ParticipantId};
use tracing::debug;
use webrtc::rtp_transceiver::rtp_codec::RTPCodecType;
use webrtc::track::track_remote::TrackRemote;

/// One incoming track within a [`RemoteStream`]. `enabled` mirrors the
/// sender's declared intent; frames may keep arriving while it is false and
/// the playback collaborator is expected to honour the flag.
pub struct RemoteTrack {
    id: String,
    kind: MediaKind,
    track: Arc<TrackRemote>,
    enabled: AtomicBool,
}

impl RemoteTrack {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    pub fn handle(&self) -> Arc<TrackRemote> {
        self.track.clone()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }
}

/// The single per-peer stream object remote tracks attach to. Owned by the
/// peer's link; released when the link closes.
pub struct RemoteStream {
    participant_id: ParticipantId,
    tracks: Mutex<Vec<Arc<RemoteTrack>>>,
}

impl std::fmt::Debug for RemoteStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteStream")
            .field("participant_id", &self.participant_id)
            .field("tracks", &self.track_count())
            .finish()
    }
}

impl RemoteStream {
    pub fn new(participant_id: ParticipantId) -> Self {
        Self {
            participant_id,
            tracks: Mutex::new(Vec::new()),
        }
    }

    pub fn participant_id(&self) -> &ParticipantId {
        &self.participant_id
    }

    /// Attach a transport track. Idempotent by track id; returns false when
    /// the track was already present.
    pub fn attach(&self, track: Arc<TrackRemote>) -> bool {
        let kind = match track.kind() {
            RTPCodecType::Audio => MediaKind::Audio,
            RTPCodecType::Video => MediaKind::Video,
            RTPCodecType::Unspecified => {
                debug!(participant = %self.participant_id, "ignoring track of unspecified kind");
                return false;
            }
        };

        let id = track.id();
        let mut tracks = self.tracks.lock().unwrap_or_else(|e| e.into_inner());
        if tracks.iter().any(|t| t.id == id) {
            debug!(participant = %self.participant_id, track = %id, "track already attached");
            return false;
        }

        tracks.push(Arc::new(RemoteTrack {
            id,
            kind,
            track,
            enabled: AtomicBool::new(true),
        }));
        true
    }

    /// Mirror the sender's enable flag onto every track of the kind.
    pub fn set_enabled(&self, kind: MediaKind, enabled: bool) {
        let tracks = self.tracks.lock().unwrap_or_else(|e| e.into_inner());
        for track in tracks.iter().filter(|t| t.kind == kind) {
            track.enabled.store(enabled, Ordering::Release);
        }
    }

    pub fn tracks(&self) -> Vec<Arc<RemoteTrack>> {
        self.tracks
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn track_count(&self) -> usize {
        self.tracks.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}
