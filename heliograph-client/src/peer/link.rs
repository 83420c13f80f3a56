use std::fmt;
use std::sync::Arc;

use heliograph_core::model::{
    IceCandidate, ParticipantId, ParticipantInfo, SdpKind, SessionDescription,
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::api::setting_engine::SettingEngine;
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::offer_answer_options::RTCOfferOptions;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;

use crate::error::SessionError;
use crate::media::{LocalMediaSource, RemoteStream};
use crate::peer::candidate_buffer::CandidateBuffer;
use crate::peer::link_event::LinkEvent;
use crate::session::config::SessionConfig;

/// Which side of the pair sends the offer. Decided from the ids alone, so
/// both sides agree without coordination and simultaneous-offer glare cannot
/// arise.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum SignalingRole {
    Caller,
    Callee,
}

impl SignalingRole {
    pub fn for_pair(local: &ParticipantId, remote: &ParticipantId) -> Self {
        if local < remote {
            SignalingRole::Caller
        } else {
            SignalingRole::Callee
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum LinkState {
    New,
    OfferSent,
    Answered,
    Connected,
    Disconnected,
    Recovering,
    Failed,
    Closed,
}

impl LinkState {
    /// The legal transition table. Everything else is a bug in the caller
    /// and is refused.
    pub fn can_transition(self, next: LinkState) -> bool {
        use LinkState::*;
        matches!(
            (self, next),
            (New, OfferSent)
                | (New, Answered)
                | (OfferSent, Answered)
                | (Answered, Connected)
                | (Connected, Disconnected)
                | (Disconnected, Connected)
                | (Disconnected, Recovering)
                | (Recovering, Connected)
                | (Recovering, Failed)
                | (Failed, Closed)
                | (New, Closed)
                | (OfferSent, Closed)
                | (Answered, Closed)
                | (Connected, Closed)
                | (Disconnected, Closed)
                | (Recovering, Closed)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, LinkState::Failed | LinkState::Closed)
    }
}

impl fmt::Display for LinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// One negotiated connection to one remote participant. All state mutation
/// goes through [`PeerLink::transition`], driven by the session actor; the
/// transport's callbacks only post [`LinkEvent`]s back to that actor.
pub struct PeerLink {
    remote: ParticipantInfo,
    role: SignalingRole,
    state: LinkState,
    /// Instance counter for this peer; guards against timers and callbacks
    /// left over from a replaced link.
    epoch: u64,
    negotiating: bool,
    pc: Arc<RTCPeerConnection>,
    candidates: CandidateBuffer,
    remote_stream: Arc<RemoteStream>,
    stream_announced: bool,
}

impl PeerLink {
    /// Build the transport, attach the shared local tracks, and wire its
    /// callbacks into the session actor's event channel.
    pub async fn connect(
        remote: ParticipantInfo,
        role: SignalingRole,
        epoch: u64,
        config: &SessionConfig,
        local_media: &LocalMediaSource,
        events: mpsc::UnboundedSender<LinkEvent>,
    ) -> Result<Self, SessionError> {
        let mut media_engine = MediaEngine::default();
        media_engine.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut media_engine)?;

        let mut setting_engine = SettingEngine::default();
        if config.include_loopback_candidates {
            setting_engine.set_include_loopback_candidate(true);
        }

        let api = APIBuilder::new()
            .with_media_engine(media_engine)
            .with_interceptor_registry(registry)
            .with_setting_engine(setting_engine)
            .build();

        let rtc_config = RTCConfiguration {
            ice_servers: if config.ice_servers.is_empty() {
                vec![]
            } else {
                vec![RTCIceServer {
                    urls: config.ice_servers.clone(),
                    ..Default::default()
                }]
            },
            ..Default::default()
        };

        let pc = Arc::new(api.new_peer_connection(rtc_config).await?);

        for track in local_media.tracks() {
            pc.add_track(track.handle()).await?;
        }

        let peer_id = remote.participant_id.clone();

        let state_events = events.clone();
        let state_peer = peer_id.clone();
        pc.on_peer_connection_state_change(Box::new(move |state| {
            let events = state_events.clone();
            let peer = state_peer.clone();
            Box::pin(async move {
                debug!(%peer, ?state, "transport state changed");
                let _ = events.send(LinkEvent::StateChanged { peer, epoch, state });
            })
        }));

        let ice_events = events.clone();
        let ice_peer = peer_id.clone();
        pc.on_ice_candidate(Box::new(move |candidate: Option<RTCIceCandidate>| {
            let events = ice_events.clone();
            let peer = ice_peer.clone();
            Box::pin(async move {
                let Some(candidate) = candidate else { return };
                let Ok(init) = candidate.to_json() else {
                    return;
                };
                let candidate = IceCandidate {
                    candidate: init.candidate,
                    sdp_mid: init.sdp_mid,
                    sdp_m_line_index: init.sdp_mline_index,
                };
                let _ = events.send(LinkEvent::LocalCandidate {
                    peer,
                    epoch,
                    candidate,
                });
            })
        }));

        let track_events = events;
        let track_peer = peer_id.clone();
        pc.on_track(Box::new(move |track, _receiver, _transceiver| {
            let events = track_events.clone();
            let peer = track_peer.clone();
            Box::pin(async move {
                let _ = events.send(LinkEvent::RemoteTrack { peer, epoch, track });
            })
        }));

        Ok(Self {
            remote_stream: Arc::new(RemoteStream::new(peer_id)),
            remote,
            role,
            state: LinkState::New,
            epoch,
            negotiating: false,
            pc,
            candidates: CandidateBuffer::new(),
            stream_announced: false,
        })
    }

    pub fn remote(&self) -> &ParticipantInfo {
        &self.remote
    }

    pub fn role(&self) -> SignalingRole {
        self.role
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn remote_stream(&self) -> Arc<RemoteStream> {
        self.remote_stream.clone()
    }

    /// The remote stream, once at least one track has landed on it.
    pub fn announced_stream(&self) -> Option<Arc<RemoteStream>> {
        self.stream_announced.then(|| self.remote_stream.clone())
    }

    /// Apply a state transition. Illegal transitions are refused with a
    /// warning so a stale event can never corrupt the machine.
    pub fn transition(&mut self, next: LinkState) -> bool {
        if !self.state.can_transition(next) {
            warn!(
                peer = %self.remote.participant_id,
                from = %self.state,
                to = %next,
                "refusing illegal link transition"
            );
            return false;
        }
        info!(
            peer = %self.remote.participant_id,
            from = %self.state,
            to = %next,
            "link transition"
        );
        self.state = next;
        if matches!(next, LinkState::Connected) {
            self.negotiating = false;
        }
        true
    }

    /// Caller side: produce the local offer. `restart` renegotiates the
    /// existing transport paths without tearing the link down.
    pub async fn create_offer(&mut self, restart: bool) -> Result<SessionDescription, SessionError> {
        if self.negotiating {
            warn!(
                peer = %self.remote.participant_id,
                "negotiation already in flight, rejecting second attempt"
            );
            return Err(SessionError::NegotiationInFlight);
        }
        self.negotiating = true;

        let options = restart.then(|| RTCOfferOptions {
            ice_restart: true,
            ..Default::default()
        });

        let offer = match self.offer_inner(options).await {
            Ok(offer) => offer,
            Err(e) => {
                self.negotiating = false;
                return Err(e);
            }
        };
        Ok(offer)
    }

    async fn offer_inner(
        &mut self,
        options: Option<RTCOfferOptions>,
    ) -> Result<SessionDescription, SessionError> {
        let offer = self.pc.create_offer(options).await?;
        self.pc.set_local_description(offer.clone()).await?;
        Ok(SessionDescription {
            kind: SdpKind::Offer,
            sdp: offer.sdp,
        })
    }

    /// Callee side: apply the remote offer and produce the answer. Flushes
    /// the candidate buffer as soon as the remote description lands.
    pub async fn accept_offer(
        &mut self,
        description: &SessionDescription,
    ) -> Result<SessionDescription, SessionError> {
        if self.negotiating {
            warn!(
                peer = %self.remote.participant_id,
                "negotiation already in flight, rejecting remote offer"
            );
            return Err(SessionError::NegotiationInFlight);
        }
        self.negotiating = true;

        let result = self.answer_inner(description).await;
        self.negotiating = false;
        result
    }

    async fn answer_inner(
        &mut self,
        description: &SessionDescription,
    ) -> Result<SessionDescription, SessionError> {
        let offer = RTCSessionDescription::offer(description.sdp.clone())?;
        self.pc.set_remote_description(offer).await?;
        self.flush_candidates().await;

        let answer = self.pc.create_answer(None).await?;
        self.pc.set_local_description(answer.clone()).await?;
        Ok(SessionDescription {
            kind: SdpKind::Answer,
            sdp: answer.sdp,
        })
    }

    /// Caller side: the remote answer completes the round-trip.
    pub async fn apply_answer(
        &mut self,
        description: &SessionDescription,
    ) -> Result<(), SessionError> {
        let answer = RTCSessionDescription::answer(description.sdp.clone())?;
        self.pc.set_remote_description(answer).await?;
        self.negotiating = false;
        self.flush_candidates().await;
        Ok(())
    }

    /// Buffer or apply one remote candidate, depending on whether the
    /// remote description has landed yet.
    pub async fn add_candidate(&mut self, candidate: IceCandidate) {
        if let Some(candidate) = self.candidates.absorb(candidate) {
            self.apply_candidate(candidate).await;
        }
    }

    async fn flush_candidates(&mut self) {
        let buffered = self.candidates.flush();
        if buffered.is_empty() {
            return;
        }
        debug!(
            peer = %self.remote.participant_id,
            count = buffered.len(),
            "applying buffered candidates"
        );
        for candidate in buffered {
            self.apply_candidate(candidate).await;
        }
    }

    /// ICE tolerates candidate loss: an apply failure is logged and the
    /// candidate dropped, never retried and never fatal to the link.
    async fn apply_candidate(&self, candidate: IceCandidate) {
        let init = RTCIceCandidateInit {
            candidate: candidate.candidate,
            sdp_mid: candidate.sdp_mid,
            sdp_mline_index: candidate.sdp_m_line_index,
            username_fragment: None,
        };
        if let Err(e) = self.pc.add_ice_candidate(init).await {
            warn!(
                peer = %self.remote.participant_id,
                "failed to apply ICE candidate, dropping: {e}"
            );
        }
    }

    /// Announce the remote stream the first time a track lands on it.
    /// Returns the stream when this call was the announcement.
    pub fn attach_remote_track(
        &mut self,
        track: Arc<webrtc::track::track_remote::TrackRemote>,
    ) -> Option<Arc<RemoteStream>> {
        self.remote_stream.attach(track);
        if self.stream_announced {
            None
        } else {
            self.stream_announced = true;
            Some(self.remote_stream.clone())
        }
    }

    /// Terminal teardown: close the transport and drop whatever was still
    /// buffered.
    pub async fn close(&mut self) {
        if self.state == LinkState::Closed {
            return;
        }
        self.transition(LinkState::Closed);
        self.candidates = CandidateBuffer::new();
        if let Err(e) = self.pc.close().await {
            debug!(
                peer = %self.remote.participant_id,
                "error closing peer connection: {e}"
            );
        }
    }
}
