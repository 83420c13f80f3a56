use std::collections::HashMap;
use std::sync::Arc;

use heliograph_core::model::{
    IceCandidate, ParticipantId, ParticipantInfo, RoomId, SessionDescription, SignalMessage,
    SignalPayload,
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use webrtc::track::track_remote::TrackRemote;

use crate::error::SessionError;
use crate::media::{LocalMediaSource, RemoteStream};
use crate::peer::link::{LinkState, PeerLink, SignalingRole};
use crate::peer::link_event::LinkEvent;
use crate::session::config::SessionConfig;
use crate::signaling::SignalingChannel;

/// The local participant's mesh. Owns every [`PeerLink`] and is their only
/// creator and destroyer, so "at most one link per peer" holds by
/// construction: teardown always completes before a replacement is made.
pub struct PeerConnectionManager {
    room_id: RoomId,
    local: ParticipantInfo,
    config: SessionConfig,
    local_media: LocalMediaSource,
    links: HashMap<ParticipantId, PeerLink>,
    link_events: mpsc::UnboundedSender<LinkEvent>,
    signaling: SignalingChannel,
    next_epoch: u64,
}

impl PeerConnectionManager {
    pub fn new(
        room_id: RoomId,
        local: ParticipantInfo,
        config: SessionConfig,
        local_media: LocalMediaSource,
        link_events: mpsc::UnboundedSender<LinkEvent>,
        signaling: SignalingChannel,
    ) -> Self {
        Self {
            room_id,
            local,
            config,
            local_media,
            links: HashMap::new(),
            link_events,
            signaling,
            next_epoch: 0,
        }
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    pub fn has_link(&self, peer: &ParticipantId) -> bool {
        self.links.contains_key(peer)
    }

    pub fn link_state(&self, peer: &ParticipantId) -> Option<LinkState> {
        self.links.get(peer).map(|l| l.state())
    }

    /// True when the event belongs to the current link instance for the
    /// peer; stale epochs come from replaced links and must be ignored.
    pub fn epoch_matches(&self, peer: &ParticipantId, epoch: u64) -> bool {
        self.links.get(peer).is_some_and(|l| l.epoch() == epoch)
    }

    /// Create a link to a newly discovered member, unless one exists. The
    /// id order decides who offers, so both sides agree without racing.
    pub async fn ensure_link(&mut self, remote: ParticipantInfo) {
        let peer_id = remote.participant_id.clone();
        if peer_id == self.local.participant_id || self.links.contains_key(&peer_id) {
            return;
        }

        let role = SignalingRole::for_pair(&self.local.participant_id, &peer_id);
        info!(peer = %peer_id, ?role, "creating peer link");

        match self.create_link(remote, role).await {
            Ok(link) => {
                self.links.insert(peer_id.clone(), link);
            }
            Err(e) => {
                warn!(peer = %peer_id, "failed to create peer link: {e}");
                return;
            }
        }

        if role == SignalingRole::Caller {
            self.start_negotiation(&peer_id).await;
        }
    }

    async fn create_link(
        &mut self,
        remote: ParticipantInfo,
        role: SignalingRole,
    ) -> Result<PeerLink, SessionError> {
        self.next_epoch += 1;
        PeerLink::connect(
            remote,
            role,
            self.next_epoch,
            &self.config,
            &self.local_media,
            self.link_events.clone(),
        )
        .await
    }

    async fn start_negotiation(&mut self, peer_id: &ParticipantId) {
        let offer = {
            let Some(link) = self.links.get_mut(peer_id) else {
                return;
            };
            match link.create_offer(false).await {
                Ok(offer) => {
                    link.transition(LinkState::OfferSent);
                    offer
                }
                Err(e) => {
                    warn!(peer = %peer_id, "failed to create offer: {e}");
                    return;
                }
            }
        };
        self.send_targeted(peer_id.clone(), SignalPayload::Offer { description: offer });
    }

    /// Incoming offer. Three cases: no link (fresh callee), a link mid
    /// recovery (ICE-restart renegotiation in place), or any other live
    /// link (last offer wins: tear down, then answer on a fresh link).
    pub async fn handle_offer(&mut self, from: ParticipantInfo, description: &SessionDescription) {
        let peer_id = from.participant_id.clone();

        if let Some(link) = self.links.get_mut(&peer_id) {
            if matches!(
                link.state(),
                LinkState::Disconnected | LinkState::Recovering
            ) {
                debug!(peer = %peer_id, "applying restart offer in place");
                let answer = match link.accept_offer(description).await {
                    Ok(answer) => answer,
                    Err(e) => {
                        warn!(peer = %peer_id, "restart renegotiation failed: {e}");
                        return;
                    }
                };
                self.send_targeted(peer_id, SignalPayload::Answer {
                    description: answer,
                });
                return;
            }

            info!(peer = %peer_id, state = %link.state(), "offer for live link, replacing");
            self.remove_link(&peer_id).await;
        }

        let mut link = match self.create_link(from, SignalingRole::Callee).await {
            Ok(link) => link,
            Err(e) => {
                warn!(peer = %peer_id, "failed to create callee link: {e}");
                return;
            }
        };

        match link.accept_offer(description).await {
            Ok(answer) => {
                link.transition(LinkState::Answered);
                self.links.insert(peer_id.clone(), link);
                self.send_targeted(peer_id, SignalPayload::Answer {
                    description: answer,
                });
            }
            Err(e) => {
                warn!(peer = %peer_id, "failed to answer offer: {e}");
                link.close().await;
            }
        }
    }

    pub async fn handle_answer(&mut self, from: &ParticipantId, description: &SessionDescription) {
        let Some(link) = self.links.get_mut(from) else {
            debug!(peer = %from, "answer for unknown link, dropping");
            return;
        };

        match link.state() {
            LinkState::OfferSent => {
                if let Err(e) = link.apply_answer(description).await {
                    warn!(peer = %from, "failed to apply answer: {e}");
                    return;
                }
                link.transition(LinkState::Answered);
            }
            // Restart answer: the transport reports connected on its own.
            LinkState::Recovering => {
                if let Err(e) = link.apply_answer(description).await {
                    warn!(peer = %from, "failed to apply restart answer: {e}");
                }
            }
            state => {
                warn!(peer = %from, %state, "unexpected answer, dropping");
            }
        }
    }

    pub async fn handle_candidate(&mut self, from: &ParticipantId, candidate: IceCandidate) {
        let Some(link) = self.links.get_mut(from) else {
            // The peer may already be gone; candidates are loss tolerant.
            debug!(peer = %from, "candidate for unknown link, dropping");
            return;
        };
        link.add_candidate(candidate).await;
    }

    /// Renegotiate a recovering link without tearing it down. Returns false
    /// when the restart could not even be issued.
    pub async fn issue_restart(&mut self, peer: &ParticipantId) -> bool {
        let offer = {
            let Some(link) = self.links.get_mut(peer) else {
                return false;
            };
            if link.state() != LinkState::Recovering {
                return false;
            }
            match link.create_offer(true).await {
                Ok(offer) => offer,
                Err(e) => {
                    warn!(peer = %peer, "ICE restart failed to start: {e}");
                    return false;
                }
            }
        };
        self.send_targeted(peer.clone(), SignalPayload::Offer { description: offer });
        true
    }

    pub fn apply_transition(&mut self, peer: &ParticipantId, next: LinkState) -> bool {
        self.links
            .get_mut(peer)
            .is_some_and(|link| link.transition(next))
    }

    pub fn attach_remote_track(
        &mut self,
        peer: &ParticipantId,
        track: Arc<TrackRemote>,
    ) -> Option<Arc<RemoteStream>> {
        self.links.get_mut(peer)?.attach_remote_track(track)
    }

    pub fn announced_stream(&self, peer: &ParticipantId) -> Option<Arc<RemoteStream>> {
        self.links.get(peer)?.announced_stream()
    }

    /// Close and drop the link. Used for departures and for the failure
    /// path before a recreate.
    pub async fn remove_link(&mut self, peer: &ParticipantId) -> bool {
        let Some(mut link) = self.links.remove(peer) else {
            return false;
        };
        link.close().await;
        true
    }

    /// Total teardown, e.g. on leave or signaling loss. Nothing survives.
    pub async fn close_all(&mut self) {
        for (_, mut link) in self.links.drain() {
            link.close().await;
        }
    }

    pub fn send_targeted(&self, target: ParticipantId, payload: SignalPayload) {
        let msg = SignalMessage::targeted(
            self.room_id.clone(),
            self.local.clone(),
            target.clone(),
            payload,
        );
        if self.signaling.send(msg).is_err() {
            debug!(peer = %target, "signaling channel closed, message dropped");
        }
    }
}
