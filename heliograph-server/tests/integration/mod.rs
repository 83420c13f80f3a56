pub mod connection_tests;
pub mod multi_peer_tests;

use heliograph_server::{RelayConfig, RoomRegistry};
use tracing::Level;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .try_init();
}

pub fn test_registry() -> RoomRegistry {
    RoomRegistry::new(RelayConfig::default())
}
