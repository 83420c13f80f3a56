use std::sync::Arc;

use heliograph_core::model::{IceCandidate, ParticipantId};
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::track::track_remote::TrackRemote;

/// Transport callbacks re-entering the session actor. `epoch` identifies
/// the link instance the callback was registered on, so events from a
/// replaced link are discarded instead of corrupting its successor.
pub enum LinkEvent {
    StateChanged {
        peer: ParticipantId,
        epoch: u64,
        state: RTCPeerConnectionState,
    },
    LocalCandidate {
        peer: ParticipantId,
        epoch: u64,
        candidate: IceCandidate,
    },
    RemoteTrack {
        peer: ParticipantId,
        epoch: u64,
        track: Arc<TrackRemote>,
    },
}
