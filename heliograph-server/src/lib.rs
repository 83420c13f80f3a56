pub mod config;
pub mod room;
pub mod signaling;

pub use config::RelayConfig;
pub use room::{Room, RoomCommand, RoomRegistry};
pub use signaling::{router, ws_handler};
