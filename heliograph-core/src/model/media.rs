use serde::{Deserialize, Serialize};

use crate::model::participant::ParticipantId;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Hash, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Audio,
    Video,
}

/// Enable/disable flags for one participant's tracks. Last writer wins per
/// track kind.
#[derive(Debug, Serialize, Deserialize, Clone, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantMediaState {
    pub participant_id: ParticipantId,
    pub audio_enabled: bool,
    pub video_enabled: bool,
}

impl ParticipantMediaState {
    pub fn new(participant_id: ParticipantId) -> Self {
        Self {
            participant_id,
            audio_enabled: true,
            video_enabled: true,
        }
    }

    pub fn enabled(&self, kind: MediaKind) -> bool {
        match kind {
            MediaKind::Audio => self.audio_enabled,
            MediaKind::Video => self.video_enabled,
        }
    }

    pub fn set_enabled(&mut self, kind: MediaKind, enabled: bool) {
        match kind {
            MediaKind::Audio => self.audio_enabled = enabled,
            MediaKind::Video => self.video_enabled = enabled,
        }
    }
}
