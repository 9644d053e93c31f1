use crate::config::PeerConfig;
use crate::host::{HostHandle, HostOrchestrator};
use crate::link::{AudioTrack, LinkFactory};
use crate::player::{PlayerHandle, PlayerOrchestrator};
use crate::signaling::SignalingClient;
use crate::view::RoomView;
use async_trait::async_trait;
use huddle_core::{Result, RoomId, UserId, UserRecord};
use std::sync::Arc;
use tokio::sync::watch;

/// What the UI layer may ask of a session, whichever role it plays.
///
/// Everything except the profile update is fire-and-forget: an error only
/// means the session loop is gone.
#[async_trait]
pub trait Orchestrator: Send + Sync {
    fn send_position_update(&self, x: f64, y: f64, z: f64) -> Result<()>;

    fn send_message(&self, text: &str) -> Result<()>;

    async fn update_user_info_change(
        &self,
        name: &str,
        color: &str,
        user_id: UserId,
    ) -> Result<UserRecord>;

    fn handle_my_media_stream(&self, track: Option<AudioTrack>) -> Result<()>;

    fn view(&self) -> watch::Receiver<RoomView>;
}

#[async_trait]
impl Orchestrator for HostHandle {
    fn send_position_update(&self, x: f64, y: f64, z: f64) -> Result<()> {
        HostHandle::send_position_update(self, x, y, z)
    }

    fn send_message(&self, text: &str) -> Result<()> {
        HostHandle::send_message(self, text)
    }

    async fn update_user_info_change(
        &self,
        name: &str,
        color: &str,
        user_id: UserId,
    ) -> Result<UserRecord> {
        HostHandle::update_user_info_change(self, name, color, user_id).await
    }

    fn handle_my_media_stream(&self, track: Option<AudioTrack>) -> Result<()> {
        HostHandle::handle_my_media_stream(self, track)
    }

    fn view(&self) -> watch::Receiver<RoomView> {
        HostHandle::view(self)
    }
}

#[async_trait]
impl Orchestrator for PlayerHandle {
    fn send_position_update(&self, x: f64, y: f64, z: f64) -> Result<()> {
        PlayerHandle::send_position_update(self, x, y, z)
    }

    fn send_message(&self, text: &str) -> Result<()> {
        PlayerHandle::send_message(self, text)
    }

    async fn update_user_info_change(
        &self,
        name: &str,
        color: &str,
        user_id: UserId,
    ) -> Result<UserRecord> {
        PlayerHandle::update_user_info_change(self, name, color, user_id).await
    }

    fn handle_my_media_stream(&self, track: Option<AudioTrack>) -> Result<()> {
        PlayerHandle::handle_my_media_stream(self, track)
    }

    fn view(&self) -> watch::Receiver<RoomView> {
        PlayerHandle::view(self)
    }
}

/// The role is chosen once, at construction.
#[derive(Clone)]
pub enum Session {
    Host(HostHandle),
    Player(PlayerHandle),
}

impl Session {
    pub async fn host(
        config: PeerConfig,
        signaling: Arc<dyn SignalingClient>,
        factory: Arc<dyn LinkFactory>,
    ) -> Result<Self> {
        HostOrchestrator::start(config, signaling, factory)
            .await
            .map(Session::Host)
    }

    pub async fn join(
        config: PeerConfig,
        signaling: Arc<dyn SignalingClient>,
        factory: Arc<dyn LinkFactory>,
        room: RoomId,
    ) -> Result<Self> {
        PlayerOrchestrator::join(config, signaling, factory, room)
            .await
            .map(Session::Player)
    }

    pub fn room(&self) -> RoomId {
        match self {
            Session::Host(host) => host.room(),
            Session::Player(player) => player.room(),
        }
    }

    pub fn is_host(&self) -> bool {
        matches!(self, Session::Host(_))
    }

    fn orchestrator(&self) -> &dyn Orchestrator {
        match self {
            Session::Host(host) => host,
            Session::Player(player) => player,
        }
    }

    /// Ends the session. A host closes every player link and releases the room.
    pub fn close(&self) {
        match self {
            Session::Host(host) => host.shutdown(),
            Session::Player(player) => player.leave(),
        }
    }
}

#[async_trait]
impl Orchestrator for Session {
    fn send_position_update(&self, x: f64, y: f64, z: f64) -> Result<()> {
        self.orchestrator().send_position_update(x, y, z)
    }

    fn send_message(&self, text: &str) -> Result<()> {
        self.orchestrator().send_message(text)
    }

    async fn update_user_info_change(
        &self,
        name: &str,
        color: &str,
        user_id: UserId,
    ) -> Result<UserRecord> {
        self.orchestrator()
            .update_user_info_change(name, color, user_id)
            .await
    }

    fn handle_my_media_stream(&self, track: Option<AudioTrack>) -> Result<()> {
        self.orchestrator().handle_my_media_stream(track)
    }

    fn view(&self) -> watch::Receiver<RoomView> {
        self.orchestrator().view()
    }
}
