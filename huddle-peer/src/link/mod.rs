//! Transport seam between the orchestrators and the peer connection.

mod rtc;

pub use rtc::{RtcLink, RtcLinkFactory};

use async_trait::async_trait;
use huddle_core::UserId;
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;
use webrtc::track::track_local::TrackLocal;

pub type AudioTrack = Arc<dyn TrackLocal + Send + Sync>;

/// One negotiation attempt with one player. The epoch tells a replaced
/// session's late events apart from the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId {
    pub player: UserId,
    pub epoch: u64,
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.player, self.epoch)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Host,
    Player,
}

/// Events a link pushes into its orchestrator's loop.
#[derive(Debug, Clone, PartialEq)]
pub enum LinkEvent {
    Open(SessionId),
    Message(SessionId, String),
    Closed(SessionId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatherSignal {
    Candidate,
    Complete,
}

pub struct NewLink {
    pub link: Arc<dyn PeerLink>,
    pub gathering: mpsc::UnboundedReceiver<GatherSignal>,
}

/// A single peer connection carrying one ordered, reliable text channel.
///
/// Negotiation blobs are opaque strings: whatever the remote side produced
/// from its own `local_description`.
#[async_trait]
pub trait PeerLink: Send + Sync {
    /// Offering side: opens the data channel and sets a local offer.
    async fn create_offer(&self, label: &str) -> anyhow::Result<()>;

    /// Answering side: applies the remote offer and sets a local answer.
    async fn accept_offer(&self, offer: &str) -> anyhow::Result<()>;

    async fn apply_answer(&self, answer: &str) -> anyhow::Result<()>;

    /// The local description with every candidate gathered so far.
    async fn local_description(&self) -> anyhow::Result<String>;

    fn is_open(&self) -> bool;

    async fn send(&self, text: &str) -> anyhow::Result<()>;

    /// Swaps the outbound audio in place; `None` mutes.
    async fn set_audio_track(&self, track: Option<AudioTrack>) -> anyhow::Result<()>;

    async fn close(&self) -> anyhow::Result<()>;
}

#[async_trait]
pub trait LinkFactory: Send + Sync {
    async fn connect(
        &self,
        id: SessionId,
        role: Role,
        events: mpsc::UnboundedSender<LinkEvent>,
    ) -> anyhow::Result<NewLink>;
}
