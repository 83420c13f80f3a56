use std::time::Duration;

/// Client-side tunables for one room session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// STUN/TURN urls handed to every peer connection.
    pub ice_servers: Vec<String>,
    /// Signaling socket connect timeout.
    pub connect_timeout: Duration,
    /// Gather loopback host candidates too. Off in production; needed when
    /// peers share a machine, as in the integration tests.
    pub include_loopback_candidates: bool,
    pub reconnect: ReconnectPolicy,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ice_servers: vec![],
            connect_timeout: Duration::from_secs(5),
            include_loopback_candidates: false,
            reconnect: ReconnectPolicy::default(),
        }
    }
}

/// Escalation policy for a peer link that reports `disconnected`:
/// wait out the grace period, then ICE-restart in place, then close and
/// recreate with exponentially growing delays until the attempt cap.
#[derive(Debug, Clone)]
pub struct ReconnectPolicy {
    /// Transient-disconnect grace before any action is taken.
    pub disconnect_grace: Duration,
    /// How long an ICE restart may take to get back to connected.
    pub restart_window: Duration,
    /// Base delay before recreating a closed link.
    pub recreate_delay: Duration,
    /// Ceiling for the exponential recreate delay.
    pub max_delay: Duration,
    /// Recreate attempts per peer before declaring it unreachable.
    pub max_attempts: u32,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            disconnect_grace: Duration::from_secs(5),
            restart_window: Duration::from_secs(5),
            recreate_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(30),
            max_attempts: 5,
        }
    }
}

impl ReconnectPolicy {
    /// Delay before recreate attempt `attempt` (1-based): doubles each time,
    /// capped at `max_delay`.
    pub fn recreate_delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.recreate_delay
            .saturating_mul(1u32 << exponent)
            .min(self.max_delay)
    }
}
