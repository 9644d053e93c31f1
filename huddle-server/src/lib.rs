pub mod config;
pub mod directory;
pub mod http;
pub mod logging;
pub mod relay;

pub use config::ServerConfig;
pub use directory::{MemoryDirectory, RoomDirectory};
pub use http::router;
pub use relay::{Listener, SignalingRelay, Subscription};

use huddle_core::IceServerConfig;
use std::sync::Arc;
use std::time::Duration;

/// Shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub relay: SignalingRelay,
    pub directory: Arc<dyn RoomDirectory>,
    pub join_timeout: Duration,
    pub ice_servers: Arc<Vec<IceServerConfig>>,
}

impl AppState {
    pub fn new(
        directory: Arc<dyn RoomDirectory>,
        join_timeout: Duration,
        ice_servers: Vec<IceServerConfig>,
    ) -> Self {
        Self {
            relay: SignalingRelay::new(),
            directory,
            join_timeout,
            ice_servers: Arc::new(ice_servers),
        }
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(
            Arc::new(MemoryDirectory::new()),
            config.join_timeout(),
            config.ice_servers(),
        )
    }
}
