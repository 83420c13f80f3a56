use serde::{Deserialize, Serialize};

use crate::model::media::MediaKind;
use crate::model::participant::{ParticipantId, ParticipantInfo};
use crate::model::room::RoomId;

/// SDP-equivalent session description. Opaque to the relay; only the peers
/// interpret it.
#[derive(Debug, Serialize, Deserialize, Clone, Eq, PartialEq)]
pub struct SessionDescription {
    pub kind: SdpKind,
    pub sdp: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum SdpKind {
    Offer,
    Answer,
}

/// One ICE candidate. Buffered by the receiving peer until its remote
/// description is applied, then consumed exactly once.
#[derive(Debug, Serialize, Deserialize, Clone, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IceCandidate {
    pub candidate: String,
    pub sdp_mid: Option<String>,
    pub sdp_m_line_index: Option<u16>,
}

/// Message envelope exchanged over the signaling connection. `type` and
/// `payload` come from the flattened [`SignalPayload`]; targeted kinds
/// additionally carry `targetParticipantId`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SignalMessage {
    pub room_id: RoomId,
    pub from: ParticipantInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_participant_id: Option<ParticipantId>,
    #[serde(flatten)]
    pub payload: SignalPayload,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(
    tag = "type",
    content = "payload",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum SignalPayload {
    Join {},
    MembershipSnapshot { members: Vec<ParticipantInfo> },
    MemberJoined {},
    MemberLeft {},
    Offer { description: SessionDescription },
    Answer { description: SessionDescription },
    IceCandidate { candidate: IceCandidate },
    MediaState { track_kind: MediaKind, enabled: bool },
    RoomClosed {},
    Heartbeat {},
}

impl SignalMessage {
    pub fn new(room_id: RoomId, from: ParticipantInfo, payload: SignalPayload) -> Self {
        Self {
            room_id,
            from,
            target_participant_id: None,
            payload,
        }
    }

    pub fn targeted(
        room_id: RoomId,
        from: ParticipantInfo,
        target: ParticipantId,
        payload: SignalPayload,
    ) -> Self {
        Self {
            room_id,
            from,
            target_participant_id: Some(target),
            payload,
        }
    }
}

impl SignalPayload {
    /// Wire name of the kind, for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            SignalPayload::Join {} => "join",
            SignalPayload::MembershipSnapshot { .. } => "membership-snapshot",
            SignalPayload::MemberJoined {} => "member-joined",
            SignalPayload::MemberLeft {} => "member-left",
            SignalPayload::Offer { .. } => "offer",
            SignalPayload::Answer { .. } => "answer",
            SignalPayload::IceCandidate { .. } => "ice-candidate",
            SignalPayload::MediaState { .. } => "media-state",
            SignalPayload::RoomClosed {} => "room-closed",
            SignalPayload::Heartbeat {} => "heartbeat",
        }
    }

    /// Targeted kinds are forwarded to exactly one recipient; everything
    /// else the relay either broadcasts or consumes itself.
    pub fn is_targeted(&self) -> bool {
        matches!(
            self,
            SignalPayload::Offer { .. }
                | SignalPayload::Answer { .. }
                | SignalPayload::IceCandidate { .. }
        )
    }
}
