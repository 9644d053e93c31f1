//! How orchestrators reach the relay and the room directory.

mod http;
mod sse;

pub use http::HttpSignaling;
pub use sse::{SseDecoder, SseFrame};

use async_trait::async_trait;
use huddle_core::{
    ChatMessage, JoinOffer, ProfileUpdate, Result, RoomId, RoomState, UserId, UserRecord,
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// A freshly opened room plus the stream of join offers addressed to it.
/// Dropping the feed stops listening, which tears the room down server side.
pub struct HostFeed {
    pub room: RoomState,
    pub offers: mpsc::UnboundedReceiver<JoinOffer>,
    reader: Option<JoinHandle<()>>,
}

impl HostFeed {
    pub fn new(room: RoomState, offers: mpsc::UnboundedReceiver<JoinOffer>) -> Self {
        Self {
            room,
            offers,
            reader: None,
        }
    }

    pub(crate) fn with_reader(mut self, reader: JoinHandle<()>) -> Self {
        self.reader = Some(reader);
        self
    }
}

impl Drop for HostFeed {
    fn drop(&mut self) {
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
    }
}

#[async_trait]
pub trait SignalingClient: Send + Sync + 'static {
    /// The user every call acts as.
    fn me(&self) -> UserId;

    async fn host_room(&self) -> Result<HostFeed>;

    async fn send_answer(&self, player: &UserId, sdp: &str) -> Result<()>;

    /// Turns down a pending join so the player sees a conflict.
    async fn reject_join(&self, player: &UserId) -> Result<()>;

    async fn attach_player(&self, room: &RoomId, player: &UserId) -> Result<UserRecord>;

    async fn detach_player(&self, room: &RoomId, player: &UserId) -> Result<UserRecord>;

    /// Returns the room snapshot whose host member carries the answer.
    async fn join_room(&self, room: &RoomId, sdp: &str) -> Result<RoomState>;

    async fn update_profile(&self, update: &ProfileUpdate) -> Result<UserRecord>;

    async fn record_message(&self, room: &RoomId, message: &ChatMessage) -> Result<()>;
}
