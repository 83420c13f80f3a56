use heliograph_core::model::{
    IceCandidate, MediaKind, ParticipantId, ParticipantInfo, RoomId, SdpKind, SessionDescription,
    SignalMessage, SignalPayload,
};

pub fn offer(room: &RoomId, from: &ParticipantInfo, target: &ParticipantId) -> SignalMessage {
    SignalMessage::targeted(
        room.clone(),
        from.clone(),
        target.clone(),
        SignalPayload::Offer {
            description: SessionDescription {
                kind: SdpKind::Offer,
                sdp: format!("v=0 offer-from-{}", from.display_name),
            },
        },
    )
}

pub fn answer(room: &RoomId, from: &ParticipantInfo, target: &ParticipantId) -> SignalMessage {
    SignalMessage::targeted(
        room.clone(),
        from.clone(),
        target.clone(),
        SignalPayload::Answer {
            description: SessionDescription {
                kind: SdpKind::Answer,
                sdp: format!("v=0 answer-from-{}", from.display_name),
            },
        },
    )
}

pub fn candidate(
    room: &RoomId,
    from: &ParticipantInfo,
    target: &ParticipantId,
    n: u32,
) -> SignalMessage {
    SignalMessage::targeted(
        room.clone(),
        from.clone(),
        target.clone(),
        SignalPayload::IceCandidate {
            candidate: IceCandidate {
                candidate: format!("candidate:{n} 1 UDP {n} 192.0.2.1 5000 typ host"),
                sdp_mid: Some("0".into()),
                sdp_m_line_index: Some(0),
            },
        },
    )
}

pub fn media_state(
    room: &RoomId,
    from: &ParticipantInfo,
    kind: MediaKind,
    enabled: bool,
) -> SignalMessage {
    SignalMessage::new(
        room.clone(),
        from.clone(),
        SignalPayload::MediaState {
            track_kind: kind,
            enabled,
        },
    )
}

pub fn heartbeat_reply(room: &RoomId, from: &ParticipantInfo) -> SignalMessage {
    SignalMessage::new(room.clone(), from.clone(), SignalPayload::Heartbeat {})
}
