pub mod error;
pub mod media;
pub mod peer;
pub mod reconnect;
pub mod session;
pub mod signaling;

pub use error::SessionError;
pub use media::{LocalMediaSource, MediaStateSync, RemoteStream};
pub use peer::{CandidateBuffer, LinkState, PeerConnectionManager, PeerLink, SignalingRole};
pub use reconnect::ReconnectionSupervisor;
pub use session::{ReconnectPolicy, RoomSession, SessionConfig, SessionEvent};
