use clap::Parser;
use huddle_core::IceServerConfig;
use std::net::SocketAddr;
use std::time::Duration;

pub const DEFAULT_STUN: &str = "stun:stun.l.google.com:19302";

#[derive(Debug, Clone, Parser)]
#[command(name = "huddle-server")]
#[command(about = "Signaling relay and room directory for huddle sessions")]
pub struct ServerConfig {
    #[arg(long, env = "HUDDLE_BIND", default_value = "0.0.0.0:3000")]
    pub bind: SocketAddr,

    /// Upper bound on a player's wait for the host's answer.
    #[arg(long, env = "HUDDLE_JOIN_TIMEOUT_SECS", default_value_t = 30)]
    pub join_timeout_secs: u64,

    #[arg(long = "ice-url", env = "HUDDLE_ICE_URLS", value_delimiter = ',')]
    pub ice_urls: Vec<String>,

    #[arg(long, env = "HUDDLE_ICE_USERNAME")]
    pub ice_username: Option<String>,

    #[arg(long, env = "HUDDLE_ICE_CREDENTIAL")]
    pub ice_credential: Option<String>,
}

impl ServerConfig {
    pub fn join_timeout(&self) -> Duration {
        Duration::from_secs(self.join_timeout_secs)
    }

    pub fn ice_servers(&self) -> Vec<IceServerConfig> {
        if self.ice_urls.is_empty() {
            return vec![IceServerConfig::stun([DEFAULT_STUN])];
        }

        vec![IceServerConfig {
            urls: self.ice_urls.clone(),
            username: self.ice_username.clone(),
            credential: self.ice_credential.clone(),
        }]
    }
}
