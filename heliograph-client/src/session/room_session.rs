use std::collections::HashMap;

use heliograph_core::model::{
    MediaKind, ParticipantId, ParticipantInfo, RoomId, SignalMessage, SignalPayload,
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;

use crate::error::SessionError;
use crate::media::{LocalMediaSource, MediaStateSync};
use crate::peer::{LinkEvent, LinkState, PeerConnectionManager};
use crate::reconnect::{ReconnectionSupervisor, RecoveryTick};
use crate::session::config::SessionConfig;
use crate::session::session_event::SessionEvent;
use crate::signaling::SignalingChannel;

#[derive(Debug)]
enum SessionCommand {
    SetMediaEnabled { kind: MediaKind, enabled: bool },
    Leave,
}

/// Handle to a joined room. Dropping it (or calling [`RoomSession::leave`])
/// ends the session: every peer link and the signaling socket are torn down
/// together.
pub struct RoomSession {
    commands: mpsc::UnboundedSender<SessionCommand>,
}

impl RoomSession {
    /// Connect to the relay, announce the room, and start the session
    /// actor. Events for the UI collaborator arrive on the returned
    /// receiver.
    pub async fn join(
        config: SessionConfig,
        relay_url: &str,
        room_id: RoomId,
        identity: ParticipantInfo,
        local_media: LocalMediaSource,
    ) -> Result<(Self, mpsc::UnboundedReceiver<SessionEvent>), SessionError> {
        let (signaling, inbound) =
            SignalingChannel::connect(relay_url, config.connect_timeout).await?;
        signaling.send(SignalMessage::new(
            room_id.clone(),
            identity.clone(),
            SignalPayload::Join {},
        ))?;

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (link_tx, link_rx) = mpsc::unbounded_channel();
        let (tick_tx, tick_rx) = mpsc::unbounded_channel();

        let manager = PeerConnectionManager::new(
            room_id.clone(),
            identity.clone(),
            config.clone(),
            local_media.clone(),
            link_tx,
            signaling.clone(),
        );
        let supervisor = ReconnectionSupervisor::new(config.reconnect.clone(), tick_tx);
        let media_sync = MediaStateSync::new(identity.participant_id.clone());

        let actor = SessionActor {
            room_id,
            identity,
            signaling,
            manager,
            supervisor,
            media_sync,
            local_media,
            roster: HashMap::new(),
            events: event_tx,
            inbound,
            link_events: link_rx,
            ticks: tick_rx,
            commands: command_rx,
        };
        tokio::spawn(actor.run());

        Ok((
            Self {
                commands: command_tx,
            },
            event_rx,
        ))
    }

    /// Toggle the local audio or video track; the new state is broadcast to
    /// the room.
    pub fn set_media_enabled(&self, kind: MediaKind, enabled: bool) -> Result<(), SessionError> {
        self.commands
            .send(SessionCommand::SetMediaEnabled { kind, enabled })
            .map_err(|_| SessionError::Closed)
    }

    pub fn leave(&self) -> Result<(), SessionError> {
        self.commands
            .send(SessionCommand::Leave)
            .map_err(|_| SessionError::Closed)
    }
}

enum Flow {
    Continue,
    Stop,
}

/// The single writer over all per-room client state. Every mutation —
/// membership, link lifecycle, media flags — happens on this task, one
/// event at a time; transport callbacks and timers merely queue events
/// here.
struct SessionActor {
    room_id: RoomId,
    identity: ParticipantInfo,
    signaling: SignalingChannel,
    manager: PeerConnectionManager,
    supervisor: ReconnectionSupervisor,
    media_sync: MediaStateSync,
    local_media: LocalMediaSource,
    /// Known room members, kept for recreates after a link was torn down.
    roster: HashMap<ParticipantId, ParticipantInfo>,
    events: mpsc::UnboundedSender<SessionEvent>,
    inbound: mpsc::UnboundedReceiver<SignalMessage>,
    link_events: mpsc::UnboundedReceiver<LinkEvent>,
    ticks: mpsc::UnboundedReceiver<RecoveryTick>,
    commands: mpsc::UnboundedReceiver<SessionCommand>,
}

impl SessionActor {
    async fn run(mut self) {
        info!(room = %self.room_id, me = %self.identity.participant_id, "session started");

        loop {
            let flow = tokio::select! {
                msg = self.inbound.recv() => match msg {
                    Some(msg) => self.handle_signal(msg).await,
                    None => {
                        warn!(room = %self.room_id, "signaling channel lost");
                        self.teardown().await;
                        self.emit(SessionEvent::SignalingLost);
                        Flow::Stop
                    }
                },

                Some(event) = self.link_events.recv() => self.handle_link_event(event).await,

                Some(tick) = self.ticks.recv() => self.handle_tick(tick).await,

                cmd = self.commands.recv() => match cmd {
                    Some(SessionCommand::SetMediaEnabled { kind, enabled }) => {
                        self.handle_set_media(kind, enabled);
                        Flow::Continue
                    }
                    Some(SessionCommand::Leave) | None => {
                        info!(room = %self.room_id, "leaving room");
                        self.teardown().await;
                        self.emit(SessionEvent::Closed);
                        Flow::Stop
                    }
                },
            };

            if matches!(flow, Flow::Stop) {
                break;
            }
        }

        info!(room = %self.room_id, "session finished");
    }

    async fn handle_signal(&mut self, msg: SignalMessage) -> Flow {
        if msg.room_id != self.room_id {
            debug!(room = %msg.room_id, "message for another room, dropping");
            return Flow::Continue;
        }

        match msg.payload {
            SignalPayload::MembershipSnapshot { members } => {
                info!(room = %self.room_id, count = members.len(), "membership snapshot");
                for member in members {
                    self.admit(member).await;
                }
            }

            SignalPayload::MemberJoined {} => {
                self.admit(msg.from).await;
            }

            SignalPayload::MemberLeft {} => {
                self.depart(&msg.from.participant_id).await;
            }

            SignalPayload::Offer { description } => {
                self.manager.handle_offer(msg.from, &description).await;
            }

            SignalPayload::Answer { description } => {
                self.manager
                    .handle_answer(&msg.from.participant_id, &description)
                    .await;
            }

            SignalPayload::IceCandidate { candidate } => {
                self.manager
                    .handle_candidate(&msg.from.participant_id, candidate)
                    .await;
            }

            SignalPayload::MediaState {
                track_kind,
                enabled,
            } => {
                let peer = msg.from.participant_id;
                let state = self.media_sync.on_remote(peer.clone(), track_kind, enabled);
                // Playback reflects sender intent even while frames keep
                // arriving.
                if let Some(stream) = self.manager.announced_stream(&peer) {
                    stream.set_enabled(track_kind, enabled);
                }
                self.emit(SessionEvent::RemoteMediaStateChanged { state });
            }

            SignalPayload::Heartbeat {} => {
                let reply = SignalMessage::new(
                    self.room_id.clone(),
                    self.identity.clone(),
                    SignalPayload::Heartbeat {},
                );
                if self.signaling.send(reply).is_err() {
                    debug!(room = %self.room_id, "heartbeat reply dropped, channel closed");
                }
            }

            SignalPayload::RoomClosed {} => {
                info!(room = %self.room_id, "room closed by the relay");
                self.teardown().await;
                self.emit(SessionEvent::Closed);
                return Flow::Stop;
            }

            SignalPayload::Join {} => {
                debug!(room = %self.room_id, "unexpected join echo, dropping");
            }
        }

        Flow::Continue
    }

    /// A member is (newly) visible: track it and make sure a link exists.
    async fn admit(&mut self, member: ParticipantInfo) {
        let peer = member.participant_id.clone();
        if peer == self.identity.participant_id {
            return;
        }
        if self.roster.insert(peer, member.clone()).is_none() {
            self.emit(SessionEvent::ParticipantJoined {
                info: member.clone(),
            });
        }
        self.manager.ensure_link(member).await;
    }

    async fn depart(&mut self, peer: &ParticipantId) {
        if self.roster.remove(peer).is_none() {
            return;
        }
        self.supervisor.forget(peer);
        self.media_sync.forget(peer);
        self.manager.remove_link(peer).await;
        self.emit(SessionEvent::ParticipantLeft {
            participant_id: peer.clone(),
        });
    }

    async fn handle_link_event(&mut self, event: LinkEvent) -> Flow {
        match event {
            LinkEvent::StateChanged { peer, epoch, state } => {
                if !self.manager.epoch_matches(&peer, epoch) {
                    debug!(peer = %peer, "state change from a stale link, dropping");
                    return Flow::Continue;
                }
                self.handle_transport_state(peer, epoch, state).await;
            }

            LinkEvent::LocalCandidate {
                peer,
                epoch,
                candidate,
            } => {
                if self.manager.epoch_matches(&peer, epoch) {
                    self.manager
                        .send_targeted(peer, SignalPayload::IceCandidate { candidate });
                }
            }

            LinkEvent::RemoteTrack { peer, epoch, track } => {
                if !self.manager.epoch_matches(&peer, epoch) {
                    return Flow::Continue;
                }
                let announced = self.manager.attach_remote_track(&peer, track);

                // A stream that predates this peer's media-state messages
                // still ends up mirroring them.
                if let (Some(stream), Some(state)) = (
                    self.manager.announced_stream(&peer),
                    self.media_sync.remote(&peer),
                ) {
                    stream.set_enabled(MediaKind::Audio, state.audio_enabled);
                    stream.set_enabled(MediaKind::Video, state.video_enabled);
                }

                if let Some(stream) = announced {
                    self.emit(SessionEvent::RemoteStreamAttached {
                        participant_id: peer,
                        stream,
                    });
                }
            }
        }
        Flow::Continue
    }

    async fn handle_transport_state(
        &mut self,
        peer: ParticipantId,
        epoch: u64,
        state: RTCPeerConnectionState,
    ) {
        let link_state = self.manager.link_state(&peer);

        match state {
            RTCPeerConnectionState::Connected => {
                let eligible = matches!(
                    link_state,
                    Some(LinkState::Answered)
                        | Some(LinkState::Disconnected)
                        | Some(LinkState::Recovering)
                );
                if eligible && self.manager.apply_transition(&peer, LinkState::Connected) {
                    self.supervisor.on_connected(&peer);
                    // The peer may have missed earlier toggles; re-announce.
                    self.broadcast_local_media_state();
                    self.emit(SessionEvent::PeerConnected {
                        participant_id: peer,
                    });
                }
            }

            RTCPeerConnectionState::Disconnected | RTCPeerConnectionState::Failed => {
                match link_state {
                    Some(LinkState::Connected) => {
                        // Transient until proven otherwise: the supervisor
                        // waits out the grace period before acting.
                        self.manager.apply_transition(&peer, LinkState::Disconnected);
                        self.supervisor.on_disconnected(peer.clone(), epoch);
                        self.emit(SessionEvent::PeerReconnecting {
                            participant_id: peer,
                        });
                    }
                    // Never got connected at all: skip the restart stage and
                    // go straight to close + recreate.
                    Some(LinkState::OfferSent) | Some(LinkState::Answered)
                        if state == RTCPeerConnectionState::Failed =>
                    {
                        warn!(peer = %peer, "initial negotiation failed");
                        self.fail_and_reschedule(peer).await;
                    }
                    _ => {}
                }
            }

            _ => {}
        }
    }

    async fn handle_tick(&mut self, tick: RecoveryTick) -> Flow {
        match tick {
            RecoveryTick::GraceExpired { peer, epoch } => {
                if self.manager.epoch_matches(&peer, epoch)
                    && self.manager.link_state(&peer) == Some(LinkState::Disconnected)
                {
                    info!(peer = %peer, "grace expired, attempting ICE restart");
                    self.manager.apply_transition(&peer, LinkState::Recovering);
                    if self.manager.issue_restart(&peer).await {
                        self.supervisor.on_restart_issued(peer, epoch);
                    } else {
                        self.fail_and_reschedule(peer).await;
                    }
                }
            }

            RecoveryTick::RestartExpired { peer, epoch } => {
                if self.manager.epoch_matches(&peer, epoch)
                    && self.manager.link_state(&peer) == Some(LinkState::Recovering)
                {
                    warn!(peer = %peer, "ICE restart did not reconnect in time");
                    self.manager.apply_transition(&peer, LinkState::Failed);
                    self.fail_and_reschedule(peer).await;
                }
            }

            RecoveryTick::RecreateDue { peer } => {
                if let Some(member) = self.roster.get(&peer).cloned() {
                    if !self.manager.has_link(&peer) {
                        info!(peer = %peer, "recreating peer link");
                        self.manager.ensure_link(member).await;
                    }
                }
            }
        }
        Flow::Continue
    }

    /// Close the link and arm the recreate backoff; past the attempt cap
    /// the peer is reported unreachable instead.
    async fn fail_and_reschedule(&mut self, peer: ParticipantId) {
        self.manager.remove_link(&peer).await;
        match self.supervisor.schedule_recreate(peer.clone()) {
            Some(_) => self.emit(SessionEvent::PeerReconnecting {
                participant_id: peer,
            }),
            None => self.emit(SessionEvent::PeerUnreachable {
                participant_id: peer,
            }),
        }
    }

    fn handle_set_media(&mut self, kind: MediaKind, enabled: bool) {
        if !self.media_sync.set_local(kind, enabled) {
            return;
        }
        self.local_media.set_enabled(kind, enabled);
        self.send_media_state(kind, enabled);
    }

    fn broadcast_local_media_state(&self) {
        for kind in [MediaKind::Audio, MediaKind::Video] {
            self.send_media_state(kind, self.media_sync.local().enabled(kind));
        }
    }

    fn send_media_state(&self, kind: MediaKind, enabled: bool) {
        let msg = SignalMessage::new(
            self.room_id.clone(),
            self.identity.clone(),
            SignalPayload::MediaState {
                track_kind: kind,
                enabled,
            },
        );
        if self.signaling.send(msg).is_err() {
            debug!(room = %self.room_id, "media state dropped, channel closed");
        }
    }

    /// Total teardown: every link and all per-peer state go together, and
    /// the signaling socket follows when the actor drops its sender.
    async fn teardown(&mut self) {
        self.manager.close_all().await;
        self.roster.clear();
    }

    fn emit(&self, event: SessionEvent) {
        let _ = self.events.send(event);
    }
}
