pub mod config;
mod room_session;
mod session_event;

pub use config::{ReconnectPolicy, SessionConfig};
pub use room_session::RoomSession;
pub use session_event::SessionEvent;
