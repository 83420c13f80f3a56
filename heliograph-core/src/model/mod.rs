mod media;
mod participant;
mod room;
mod signaling;

pub use media::{MediaKind, ParticipantMediaState};
pub use participant::{ParticipantId, ParticipantInfo};
pub use room::RoomId;
pub use signaling::{IceCandidate, SdpKind, SessionDescription, SignalMessage, SignalPayload};
