use std::collections::HashMap;

use heliograph_core::model::ParticipantId;
use tokio::sync::mpsc;
use tokio::time::{self, Duration};
use tracing::{debug, info};

use crate::session::config::ReconnectPolicy;

/// Timer expiries feeding back into the session actor, which re-checks the
/// link's current state and epoch before acting — an expired timer for a
/// link that already healed or was replaced is a no-op.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum RecoveryTick {
    /// The transient-disconnect grace ran out.
    GraceExpired { peer: ParticipantId, epoch: u64 },
    /// The ICE restart did not get back to connected in time.
    RestartExpired { peer: ParticipantId, epoch: u64 },
    /// The backoff delay before recreating a closed link elapsed.
    RecreateDue { peer: ParticipantId },
}

/// Drives the disconnect → restart → recreate escalation per peer. All it
/// does is arm timers and count attempts; the session actor owns the links
/// and performs the actual transitions.
pub struct ReconnectionSupervisor {
    policy: ReconnectPolicy,
    attempts: HashMap<ParticipantId, u32>,
    ticks: mpsc::UnboundedSender<RecoveryTick>,
}

impl ReconnectionSupervisor {
    pub fn new(policy: ReconnectPolicy, ticks: mpsc::UnboundedSender<RecoveryTick>) -> Self {
        Self {
            policy,
            attempts: HashMap::new(),
            ticks,
        }
    }

    /// A link reported `disconnected`: give the transport a grace period to
    /// heal on its own before escalating.
    pub fn on_disconnected(&self, peer: ParticipantId, epoch: u64) {
        debug!(peer = %peer, grace = ?self.policy.disconnect_grace, "arming disconnect grace timer");
        self.arm(
            self.policy.disconnect_grace,
            RecoveryTick::GraceExpired { peer, epoch },
        );
    }

    /// An ICE restart went out: bound how long it may take.
    pub fn on_restart_issued(&self, peer: ParticipantId, epoch: u64) {
        self.arm(
            self.policy.restart_window,
            RecoveryTick::RestartExpired { peer, epoch },
        );
    }

    /// Restart failed, the link is being closed. Returns the backoff delay
    /// armed before the recreate, or `None` once the peer has exhausted its
    /// attempts and should be reported unreachable instead.
    pub fn schedule_recreate(&mut self, peer: ParticipantId) -> Option<Duration> {
        let attempt = self.attempts.entry(peer.clone()).or_insert(0);
        *attempt += 1;

        if *attempt > self.policy.max_attempts {
            info!(peer = %peer, attempts = *attempt - 1, "recreate attempts exhausted");
            return None;
        }

        let delay = self.policy.recreate_delay_for(*attempt);
        info!(peer = %peer, attempt = *attempt, ?delay, "scheduling link recreate");
        self.arm(delay, RecoveryTick::RecreateDue { peer });
        Some(delay)
    }

    /// The peer made it back to connected: its slate is clean.
    pub fn on_connected(&mut self, peer: &ParticipantId) {
        self.attempts.remove(peer);
    }

    /// The peer left the room; stop counting against it.
    pub fn forget(&mut self, peer: &ParticipantId) {
        self.attempts.remove(peer);
    }

    fn arm(&self, delay: Duration, tick: RecoveryTick) {
        let ticks = self.ticks.clone();
        tokio::spawn(async move {
            time::sleep(delay).await;
            let _ = ticks.send(tick);
        });
    }
}
