use std::sync::Arc;

use dashmap::DashMap;
use heliograph_core::model::RoomId;
use tokio::sync::mpsc;
use tracing::info;

use crate::config::RelayConfig;
use crate::room::{Room, RoomCommand};

const ROOM_COMMAND_BUFFER: usize = 256;

/// Owns the map of live rooms. Each room runs on its own task and mutates
/// its membership alone; the registry only hands out command senders, so
/// operations on different rooms never contend.
#[derive(Clone)]
pub struct RoomRegistry {
    rooms: Arc<DashMap<RoomId, mpsc::Sender<RoomCommand>>>,
    config: RelayConfig,
}

impl RoomRegistry {
    pub fn new(config: RelayConfig) -> Self {
        Self {
            rooms: Arc::new(DashMap::new()),
            config,
        }
    }

    /// Get the command sender for a room, spawning the room if it does not
    /// exist yet.
    pub fn sender(&self, room_id: &RoomId) -> mpsc::Sender<RoomCommand> {
        self.rooms
            .entry(room_id.clone())
            .or_insert_with(|| {
                info!(room = %room_id, "creating room");
                let (tx, rx) = mpsc::channel(ROOM_COMMAND_BUFFER);
                let room = Room::new(
                    room_id.clone(),
                    rx,
                    self.rooms.clone(),
                    self.config.clone(),
                );
                tokio::spawn(room.run());
                tx
            })
            .clone()
    }

    /// Deliver a command, re-spawning the room once if its task already shut
    /// down between lookup and send (it removes itself on emptiness).
    pub async fn submit(&self, room_id: &RoomId, command: RoomCommand) -> bool {
        let tx = self.sender(room_id);
        match tx.send(command).await {
            Ok(()) => true,
            Err(mpsc::error::SendError(command)) => {
                self.rooms.remove(room_id);
                self.sender(room_id).send(command).await.is_ok()
            }
        }
    }

    /// End a session: members receive `room-closed` and their sockets drain
    /// shut.
    pub async fn close_room(&self, room_id: &RoomId) {
        let sender = self.rooms.get(room_id).map(|entry| entry.value().clone());
        if let Some(tx) = sender {
            let _ = tx.send(RoomCommand::Close).await;
        }
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn has_room(&self, room_id: &RoomId) -> bool {
        self.rooms.contains_key(room_id)
    }
}
