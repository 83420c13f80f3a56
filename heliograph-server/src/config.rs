use std::time::Duration;

/// Relay-side tunables. One instance is shared by every room the registry
/// spawns.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Liveness probe interval. A member that has not answered the previous
    /// probe by the next tick is treated as disconnected.
    pub heartbeat_interval: Duration,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval: Duration::from_secs(30),
        }
    }
}
