mod ws_handler;

pub use ws_handler::*;

use axum::Router;
use axum::routing::get;

use crate::room::RoomRegistry;

/// Build the relay's HTTP surface: a single WebSocket endpoint per
/// signaling connection.
pub fn router(registry: RoomRegistry) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .with_state(registry)
}
