use heliograph_core::model::{ParticipantId, ParticipantInfo, SignalMessage};
use tokio::sync::mpsc;

/// Commands entering a room's event loop from the socket layer. The loop is
/// the only writer of room membership.
#[derive(Debug)]
pub enum RoomCommand {
    /// A participant's signaling socket announced this room. The outbox is
    /// the socket's send queue; dropping it orphans the socket.
    Join {
        info: ParticipantInfo,
        outbox: mpsc::UnboundedSender<SignalMessage>,
    },

    /// A message from a registered member to be routed within the room.
    /// `sender` is the id the socket authenticated as; it must match
    /// `message.from`.
    Route {
        sender: ParticipantId,
        message: SignalMessage,
    },

    /// The participant's socket closed (cleanly or not).
    Leave { participant_id: ParticipantId },

    /// The owning collaborator ended the session: notify everyone and shut
    /// the room down.
    Close,
}
