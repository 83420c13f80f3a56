use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use heliograph_core::model::{
    ParticipantId, ParticipantInfo, RoomId, SignalMessage, SignalPayload,
};
use tokio::sync::mpsc;
use tokio::time::{self, Instant};
use tracing::{debug, info, warn};

use crate::config::RelayConfig;
use crate::room::room_command::RoomCommand;

struct Member {
    info: ParticipantInfo,
    outbox: mpsc::UnboundedSender<SignalMessage>,
    /// Set when a heartbeat is sent, cleared by the reply. Still set at the
    /// next tick means the socket is presumed dead.
    awaiting_pong: bool,
}

/// One room's membership and routing state. All mutation happens inside
/// [`Room::run`], one event at a time, so joins, leaves and routes can never
/// race each other within a room.
pub struct Room {
    id: RoomId,
    members: HashMap<ParticipantId, Member>,
    command_rx: mpsc::Receiver<RoomCommand>,
    registry: Arc<DashMap<RoomId, mpsc::Sender<RoomCommand>>>,
    config: RelayConfig,
    /// A room only self-destructs on emptiness after it has hosted someone.
    hosted: bool,
}

impl Room {
    pub(crate) fn new(
        id: RoomId,
        command_rx: mpsc::Receiver<RoomCommand>,
        registry: Arc<DashMap<RoomId, mpsc::Sender<RoomCommand>>>,
        config: RelayConfig,
    ) -> Self {
        Self {
            id,
            members: HashMap::new(),
            command_rx,
            registry,
            config,
            hosted: false,
        }
    }

    pub async fn run(mut self) {
        info!(room = %self.id, "room event loop started");

        let mut heartbeat = time::interval_at(
            Instant::now() + self.config.heartbeat_interval,
            self.config.heartbeat_interval,
        );

        loop {
            tokio::select! {
                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(RoomCommand::Close) => {
                            self.close_room();
                            break;
                        }
                        Some(cmd) => self.handle_command(cmd),
                        None => {
                            info!(room = %self.id, "command channel closed, shutting down room");
                            break;
                        }
                    }
                }

                _ = heartbeat.tick() => self.sweep_heartbeats(),
            }

            if self.hosted && self.members.is_empty() {
                info!(room = %self.id, "last member left, dropping room");
                break;
            }
        }

        self.registry.remove(&self.id);
        info!(room = %self.id, "room event loop finished");
    }

    fn handle_command(&mut self, cmd: RoomCommand) {
        match cmd {
            RoomCommand::Join { info, outbox } => self.handle_join(info, outbox),
            RoomCommand::Route { sender, message } => self.handle_route(sender, message),
            RoomCommand::Leave { participant_id } => {
                self.remove_member(&participant_id, true);
            }
            // Close is intercepted by the run loop.
            RoomCommand::Close => {}
        }
    }

    fn handle_join(
        &mut self,
        info: ParticipantInfo,
        outbox: mpsc::UnboundedSender<SignalMessage>,
    ) {
        let participant_id = info.participant_id.clone();
        info!(room = %self.id, participant = %participant_id, "participant joining");
        self.hosted = true;

        let member = Member {
            info: info.clone(),
            outbox,
            awaiting_pong: false,
        };

        // At most one live socket per (room, participant): a re-join replaces
        // the entry, and the orphaned outbox closes the old socket's sender.
        if self.members.insert(participant_id.clone(), member).is_some() {
            warn!(
                room = %self.id,
                participant = %participant_id,
                "duplicate join, replacing previous socket"
            );
        }

        let others: Vec<ParticipantInfo> = self
            .members
            .values()
            .filter(|m| m.info.participant_id != participant_id)
            .map(|m| m.info.clone())
            .collect();

        self.send_to(
            &participant_id,
            SignalMessage::new(
                self.id.clone(),
                ParticipantInfo::relay(),
                SignalPayload::MembershipSnapshot { members: others },
            ),
        );

        self.broadcast_except(
            &participant_id,
            SignalMessage::new(self.id.clone(), info, SignalPayload::MemberJoined {}),
        );
    }

    fn handle_route(&mut self, sender: ParticipantId, message: SignalMessage) {
        if !self.members.contains_key(&sender) {
            debug!(room = %self.id, participant = %sender, "route from non-member, ignoring");
            return;
        }

        // The socket layer authenticated `sender`; a mismatching envelope is
        // a protocol violation fatal to that socket only.
        if message.from.participant_id != sender {
            warn!(
                room = %self.id,
                participant = %sender,
                claimed = %message.from.participant_id,
                "sender spoofed envelope identity, disconnecting"
            );
            self.remove_member(&sender, true);
            return;
        }

        if message.payload.is_targeted() {
            let Some(target) = message.target_participant_id.clone() else {
                warn!(
                    room = %self.id,
                    participant = %sender,
                    kind = message.payload.kind(),
                    "targeted message without a target, disconnecting"
                );
                self.remove_member(&sender, true);
                return;
            };

            // Target already gone is not an error: its member-left is either
            // delivered or on the way.
            if self.members.contains_key(&target) {
                self.send_to(&target, message);
            } else {
                debug!(
                    room = %self.id,
                    target = %target,
                    kind = message.payload.kind(),
                    "dropping message for departed peer"
                );
            }
            return;
        }

        match message.payload {
            SignalPayload::MediaState { .. } => self.broadcast_except(&sender, message),
            SignalPayload::Heartbeat {} => {
                if let Some(member) = self.members.get_mut(&sender) {
                    member.awaiting_pong = false;
                }
            }
            // Relay-originated kinds (and a second join) have no business
            // arriving from a client.
            _ => {
                warn!(
                    room = %self.id,
                    participant = %sender,
                    kind = message.payload.kind(),
                    "protocol violation, disconnecting"
                );
                self.remove_member(&sender, true);
            }
        }
    }

    fn sweep_heartbeats(&mut self) {
        let dead: Vec<ParticipantId> = self
            .members
            .iter()
            .filter(|(_, m)| m.awaiting_pong)
            .map(|(id, _)| id.clone())
            .collect();

        for participant_id in dead {
            warn!(room = %self.id, participant = %participant_id, "missed heartbeat, disconnecting");
            self.remove_member(&participant_id, true);
        }

        let probe = SignalMessage::new(
            self.id.clone(),
            ParticipantInfo::relay(),
            SignalPayload::Heartbeat {},
        );
        for member in self.members.values_mut() {
            member.awaiting_pong = true;
            if member.outbox.send(probe.clone()).is_err() {
                debug!(
                    room = %self.id,
                    participant = %member.info.participant_id,
                    "outbox closed while probing"
                );
            }
        }
    }

    fn close_room(&mut self) {
        info!(room = %self.id, "closing room");
        let notice = SignalMessage::new(
            self.id.clone(),
            ParticipantInfo::relay(),
            SignalPayload::RoomClosed {},
        );
        for member in self.members.values() {
            let _ = member.outbox.send(notice.clone());
        }
        // Dropping the outboxes ends every socket's send task once the
        // queued notice has flushed.
        self.members.clear();
    }

    fn remove_member(&mut self, participant_id: &ParticipantId, notify: bool) {
        let Some(member) = self.members.remove(participant_id) else {
            return;
        };
        info!(room = %self.id, participant = %participant_id, "participant left");

        if notify {
            self.broadcast_except(
                participant_id,
                SignalMessage::new(self.id.clone(), member.info, SignalPayload::MemberLeft {}),
            );
        }
    }

    fn send_to(&self, participant_id: &ParticipantId, message: SignalMessage) {
        let Some(member) = self.members.get(participant_id) else {
            return;
        };
        if member.outbox.send(message).is_err() {
            debug!(
                room = %self.id,
                participant = %participant_id,
                "outbox closed, message dropped"
            );
        }
    }

    fn broadcast_except(&self, except: &ParticipantId, message: SignalMessage) {
        for (participant_id, member) in &self.members {
            if participant_id == except {
                continue;
            }
            if member.outbox.send(message.clone()).is_err() {
                debug!(
                    room = %self.id,
                    participant = %participant_id,
                    "outbox closed during broadcast"
                );
            }
        }
    }
}
