use huddle_core::IceServerConfig;
use std::time::Duration;

/// Knobs shared by both orchestrator roles.
#[derive(Debug, Clone)]
pub struct PeerConfig {
    pub ice_servers: Vec<IceServerConfig>,
    /// Gathering counts as done once no candidate arrived for this long.
    pub quiet_period: Duration,
    /// Hard upper bound on waiting for candidates.
    pub gathering_cap: Duration,
    /// Bound on a player's wait for the host's answer.
    pub join_timeout: Duration,
    pub channel_label: String,
}

impl PeerConfig {
    pub fn with_ice_servers(mut self, ice_servers: Vec<IceServerConfig>) -> Self {
        self.ice_servers = ice_servers;
        self
    }
}

impl Default for PeerConfig {
    fn default() -> Self {
        Self {
            ice_servers: vec![IceServerConfig::stun([
                "stun:stun.l.google.com:19302",
                "stun:stun1.l.google.com:19302",
            ])],
            quiet_period: Duration::from_secs(1),
            gathering_cap: Duration::from_secs(10),
            join_timeout: Duration::from_secs(30),
            channel_label: "player-data".to_owned(),
        }
    }
}
