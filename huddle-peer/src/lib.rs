pub mod config;
pub mod gather;
pub mod host;
pub mod link;
pub mod player;
pub mod session;
pub mod signaling;
pub mod view;

pub use config::PeerConfig;
pub use host::{HostHandle, HostOrchestrator};
pub use link::{AudioTrack, LinkEvent, LinkFactory, PeerLink, RtcLinkFactory, SessionId};
pub use player::{PlayerHandle, PlayerOrchestrator};
pub use session::{Orchestrator, Session};
pub use signaling::{HostFeed, HttpSignaling, SignalingClient};
pub use view::{PlayerState, RoomView, SessionStatus};
