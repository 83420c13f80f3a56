use std::collections::HashMap;

use heliograph_core::model::{MediaKind, ParticipantId, ParticipantMediaState};

/// Local and remote enable/disable flags per participant. Last writer wins
/// per `(participant, kind)`; messages from different peers are independent,
/// so no cross-peer ordering is needed.
pub struct MediaStateSync {
    local: ParticipantMediaState,
    remote: HashMap<ParticipantId, ParticipantMediaState>,
}

impl MediaStateSync {
    pub fn new(local_id: ParticipantId) -> Self {
        Self {
            local: ParticipantMediaState::new(local_id),
            remote: HashMap::new(),
        }
    }

    pub fn local(&self) -> &ParticipantMediaState {
        &self.local
    }

    /// Record a local toggle. Returns false when it was a no-op.
    pub fn set_local(&mut self, kind: MediaKind, enabled: bool) -> bool {
        if self.local.enabled(kind) == enabled {
            return false;
        }
        self.local.set_enabled(kind, enabled);
        true
    }

    /// Record a remote participant's announcement and return the updated
    /// state.
    pub fn on_remote(
        &mut self,
        participant_id: ParticipantId,
        kind: MediaKind,
        enabled: bool,
    ) -> ParticipantMediaState {
        let state = self
            .remote
            .entry(participant_id.clone())
            .or_insert_with(|| ParticipantMediaState::new(participant_id));
        state.set_enabled(kind, enabled);
        state.clone()
    }

    pub fn remote(&self, participant_id: &ParticipantId) -> Option<&ParticipantMediaState> {
        self.remote.get(participant_id)
    }

    pub fn forget(&mut self, participant_id: &ParticipantId) {
        self.remote.remove(participant_id);
    }
}
