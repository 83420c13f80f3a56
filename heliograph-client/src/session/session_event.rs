use std::sync::Arc;

use heliograph_core::model::{ParticipantId, ParticipantInfo, ParticipantMediaState};

use crate::media::RemoteStream;

/// What the UI collaborator sees. Everything else stays inside the core.
#[derive(Debug)]
pub enum SessionEvent {
    ParticipantJoined {
        info: ParticipantInfo,
    },
    ParticipantLeft {
        participant_id: ParticipantId,
    },
    /// The first remote track for this peer landed; the stream accretes
    /// further tracks in place.
    RemoteStreamAttached {
        participant_id: ParticipantId,
        stream: Arc<RemoteStream>,
    },
    RemoteMediaStateChanged {
        state: ParticipantMediaState,
    },
    /// The link to this peer reached the connected state.
    PeerConnected {
        participant_id: ParticipantId,
    },
    /// Non-fatal: the link is being restarted or recreated.
    PeerReconnecting {
        participant_id: ParticipantId,
    },
    /// Recreate attempts are exhausted; no further retries for this peer
    /// until membership changes.
    PeerUnreachable {
        participant_id: ParticipantId,
    },
    /// The signaling socket died: the whole session is over, offer rejoin.
    SignalingLost,
    Closed,
}
