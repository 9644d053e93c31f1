//! Host side of the star: one link per player, fan-out of every frame.

use crate::config::PeerConfig;
use crate::gather::settle;
use crate::link::{
    AudioTrack, GatherSignal, LinkEvent, LinkFactory, NewLink, PeerLink, Role, SessionId,
};
use crate::signaling::{HostFeed, SignalingClient};
use crate::view::{RoomView, SessionStatus};
use huddle_core::{
    AppEvent, AppMessage, HuddleError, JoinOffer, ProfileUpdate, Result, RoomId, UserId,
    UserRecord,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Commands accepted by the host loop.
pub enum HostCommand {
    Position([f64; 3]),
    Chat(String),
    /// Announce a profile that is already persisted.
    UserInfo(UserRecord),
    Media(Option<AudioTrack>),
    Evict(UserId),
    Shutdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    Negotiating,
    Connected,
}

struct PeerSession {
    id: SessionId,
    link: Arc<dyn PeerLink>,
    state: SessionState,
    negotiation: JoinHandle<()>,
}

struct NegotiationFailed {
    id: SessionId,
    error: HuddleError,
}

pub struct HostOrchestrator {
    me: UserId,
    room: RoomId,
    config: PeerConfig,
    signaling: Arc<dyn SignalingClient>,
    factory: Arc<dyn LinkFactory>,
    feed: HostFeed,
    accepting: bool,
    sessions: HashMap<UserId, PeerSession>,
    next_epoch: u64,
    mic: Option<AudioTrack>,
    view: watch::Sender<RoomView>,
    command_rx: mpsc::UnboundedReceiver<HostCommand>,
    link_tx: mpsc::UnboundedSender<LinkEvent>,
    link_rx: mpsc::UnboundedReceiver<LinkEvent>,
    failure_tx: mpsc::UnboundedSender<NegotiationFailed>,
    failure_rx: mpsc::UnboundedReceiver<NegotiationFailed>,
}

impl HostOrchestrator {
    /// Opens a room and starts serving join offers for it.
    pub async fn start(
        config: PeerConfig,
        signaling: Arc<dyn SignalingClient>,
        factory: Arc<dyn LinkFactory>,
    ) -> Result<HostHandle> {
        let feed = signaling.host_room().await?;
        let me = signaling.me();
        let room = feed.room.id;

        let (view, view_rx) = watch::channel(RoomView::from_state(
            &feed.room,
            SessionStatus::Connected,
        ));
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (link_tx, link_rx) = mpsc::unbounded_channel();
        let (failure_tx, failure_rx) = mpsc::unbounded_channel();

        let host = Self {
            me,
            room,
            config,
            signaling: signaling.clone(),
            factory,
            feed,
            accepting: true,
            sessions: HashMap::new(),
            next_epoch: 0,
            mic: None,
            view,
            command_rx,
            link_tx,
            link_rx,
            failure_tx,
            failure_rx,
        };
        tokio::spawn(host.run());

        Ok(HostHandle {
            me,
            room,
            commands: command_tx,
            view: view_rx,
            signaling,
        })
    }

    async fn run(mut self) {
        info!("Host loop for room {} started", self.room);

        loop {
            tokio::select! {
                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(HostCommand::Shutdown) | None => break,
                        Some(c) => self.handle_command(c).await,
                    }
                }

                offer = self.feed.offers.recv(), if self.accepting => {
                    match offer {
                        Some(o) => self.handle_offer(o).await,
                        None => {
                            warn!("Join offers for room {} stopped", self.room);
                            self.accepting = false;
                        }
                    }
                }

                Some(evt) = self.link_rx.recv() => self.handle_link_event(evt).await,

                Some(failure) = self.failure_rx.recv() => {
                    warn!("Negotiation with {} failed: {}", failure.id, failure.error);
                    if self.is_current(&failure.id) {
                        self.discard(&failure.id.player).await;
                    }
                }
            }
        }

        let players: Vec<UserId> = self.sessions.keys().copied().collect();
        for player in players {
            self.discard(&player).await;
        }
        self.view.send_modify(|v| v.status = SessionStatus::Closed);
        info!("Host loop for room {} finished", self.room);
    }

    async fn handle_command(&mut self, cmd: HostCommand) {
        match cmd {
            HostCommand::Position(position) => {
                self.view.send_modify(|v| v.set_position(&self.me, position));
                let msg = AppMessage::new(self.me, AppEvent::PositionUpdate { position });
                self.broadcast(&msg, None).await;
            }
            HostCommand::Chat(message) => {
                let msg = AppMessage::new(self.me, AppEvent::ChatMessage { message });
                self.record_chat(&msg).await;
                self.view.send_modify(|v| v.apply(&msg));
                self.broadcast(&msg, None).await;
            }
            HostCommand::UserInfo(user) => {
                self.view.send_modify(|v| v.upsert(user.clone()));
                let msg = AppMessage::new(self.me, AppEvent::UserInfoChange { user });
                self.broadcast(&msg, None).await;
            }
            HostCommand::Media(track) => {
                let mic = track.is_some();
                self.mic = track.clone();
                for session in self.sessions.values() {
                    if let Err(e) = session.link.set_audio_track(track.clone()).await {
                        warn!("Failed to swap audio for {}: {:#}", session.id, e);
                    }
                }
                self.view.send_modify(|v| v.set_mic(&self.me, mic));
                let msg = AppMessage::new(self.me, AppEvent::MicToggle { mic });
                self.broadcast(&msg, None).await;
            }
            HostCommand::Evict(player) => {
                info!("Evicting {}", player);
                self.end_session(&player).await;
            }
            HostCommand::Shutdown => {}
        }
    }

    async fn handle_offer(&mut self, offer: JoinOffer) {
        let player = offer.id;
        if self.sessions.contains_key(&player) {
            warn!("Rejecting join: {}", HuddleError::SessionExists(player));
            if let Err(e) = self.signaling.reject_join(&player).await {
                warn!("Failed to reject {}: {}", player, e);
            }
            return;
        }

        self.next_epoch += 1;
        let id = SessionId {
            player,
            epoch: self.next_epoch,
        };

        let NewLink { link, gathering } = match self
            .factory
            .connect(id, Role::Host, self.link_tx.clone())
            .await
        {
            Ok(new_link) => new_link,
            Err(e) => {
                error!("Failed to create link for {}: {:#}", id, e);
                return;
            }
        };

        if let Some(track) = &self.mic {
            if let Err(e) = link.set_audio_track(Some(track.clone())).await {
                warn!("Failed to attach audio for {}: {:#}", id, e);
            }
        }

        let negotiation = tokio::spawn(answer_offer(
            id,
            link.clone(),
            gathering,
            offer.sdp,
            self.signaling.clone(),
            self.config.clone(),
            self.failure_tx.clone(),
        ));

        info!("Negotiating with {}", id);
        self.sessions.insert(
            player,
            PeerSession {
                id,
                link,
                state: SessionState::Negotiating,
                negotiation,
            },
        );
    }

    async fn handle_link_event(&mut self, event: LinkEvent) {
        match event {
            LinkEvent::Open(id) => self.on_open(id).await,
            LinkEvent::Message(id, text) => self.on_message(id, text).await,
            LinkEvent::Closed(id) => {
                if self.is_current(&id) {
                    self.end_session(&id.player).await;
                } else {
                    debug!("Ignoring close of stale session {}", id);
                }
            }
        }
    }

    async fn on_open(&mut self, id: SessionId) {
        match self.sessions.get_mut(&id.player) {
            Some(session) if session.id == id && session.state == SessionState::Negotiating => {
                session.state = SessionState::Connected;
            }
            _ => {
                debug!("Ignoring open of {}", id);
                return;
            }
        }

        match self.signaling.attach_player(&self.room, &id.player).await {
            Ok(user) if user.room_id != Some(self.room) => {
                warn!(
                    "Player {} is seated in {:?}, not room {}",
                    id.player, user.room_id, self.room
                );
                self.discard(&id.player).await;
            }
            Ok(user) => {
                info!("Player {} joined room {}", id.player, self.room);
                self.view.send_modify(|v| v.upsert(user.clone()));
                let msg = AppMessage::new(self.me, AppEvent::UserJoined { user });
                self.broadcast(&msg, Some(&id.player)).await;
            }
            Err(e) => {
                error!("Failed to attach {}: {}", id.player, e);
                self.discard(&id.player).await;
            }
        }
    }

    async fn on_message(&mut self, id: SessionId, text: String) {
        if !self.is_current(&id) {
            return;
        }

        let mut msg = match AppMessage::from_text(&text) {
            Ok(msg) => msg,
            Err(e) => {
                warn!("Dropping malformed frame from {}: {}", id, e);
                return;
            }
        };
        if msg.from != id.player {
            warn!("{} sent a frame as {}", id.player, msg.from);
            msg.from = id.player;
        }

        match &msg.event {
            AppEvent::PositionUpdate { .. } | AppEvent::MicToggle { .. } => {}
            AppEvent::ChatMessage { .. } => self.record_chat(&msg).await,
            AppEvent::UserInfoChange { user } if user.id == id.player => {}
            AppEvent::UserInfoChange { .. } => {
                warn!("{} tried to change someone else's profile", id.player);
                return;
            }
            AppEvent::UserJoined { .. } | AppEvent::UserLeft { .. } => {
                warn!("Ignoring presence frame from {}", id.player);
                return;
            }
        }

        self.view.send_modify(|v| v.apply(&msg));
        self.broadcast(&msg, Some(&id.player)).await;
    }

    async fn record_chat(&self, msg: &AppMessage) {
        let Some(line) = msg.chat_line() else {
            return;
        };
        if let Err(e) = self.signaling.record_message(&self.room, &line).await {
            error!("Failed to record chat line: {}", e);
        }
    }

    /// Sends `msg` to every open session except `exclude`. Sessions whose
    /// channel is not open are skipped, not retried.
    async fn broadcast(&self, msg: &AppMessage, exclude: Option<&UserId>) -> usize {
        let text = match msg.to_text() {
            Ok(text) => text,
            Err(e) => {
                error!("Failed to serialize frame: {}", e);
                return 0;
            }
        };

        let mut delivered = 0;
        for (player, session) in &self.sessions {
            if exclude == Some(player) {
                continue;
            }
            if !session.link.is_open() {
                debug!("Skipping {}: channel not open", session.id);
                continue;
            }
            match session.link.send(&text).await {
                Ok(()) => delivered += 1,
                Err(e) => warn!("Failed to send to {}: {:#}", session.id, e),
            }
        }
        delivered
    }

    fn is_current(&self, id: &SessionId) -> bool {
        self.sessions
            .get(&id.player)
            .is_some_and(|session| session.id == *id)
    }

    /// Closes and forgets a session without touching the directory.
    async fn discard(&mut self, player: &UserId) -> Option<SessionState> {
        let session = self.sessions.remove(player)?;
        session.negotiation.abort();
        if let Err(e) = session.link.close().await {
            debug!("Closing {} failed: {:#}", session.id, e);
        }
        Some(session.state)
    }

    /// Transport close and eviction share this path: detach, then tell the
    /// remaining players.
    async fn end_session(&mut self, player: &UserId) {
        match self.discard(player).await {
            Some(SessionState::Connected) => {}
            Some(SessionState::Negotiating) => {
                info!("{} left before connecting", player);
                return;
            }
            None => return,
        }

        let user = match self.signaling.detach_player(&self.room, player).await {
            Ok(user) => user,
            Err(e) => {
                error!("Failed to detach {}: {}", player, e);
                let known = self.view.borrow().player(player).map(|p| p.user.clone());
                known.unwrap_or_else(|| UserRecord::guest(*player))
            }
        };

        info!("Player {} left room {}", player, self.room);
        self.view.send_modify(|v| {
            v.remove(player);
        });
        let msg = AppMessage::new(self.me, AppEvent::UserLeft { user });
        self.broadcast(&msg, None).await;
    }
}

/// Applies the offer, waits for gathering to settle and publishes the answer
/// exactly once.
async fn answer_offer(
    id: SessionId,
    link: Arc<dyn PeerLink>,
    mut gathering: mpsc::UnboundedReceiver<GatherSignal>,
    offer: String,
    signaling: Arc<dyn SignalingClient>,
    config: PeerConfig,
    failures: mpsc::UnboundedSender<NegotiationFailed>,
) {
    let result = async {
        link.accept_offer(&offer)
            .await
            .map_err(|e| HuddleError::NegotiationMismatch(format!("{e:#}")))?;

        let settled = settle(&mut gathering, config.quiet_period, config.gathering_cap).await;
        debug!("Answer for {} settled: {:?}", id, settled);

        let answer = link
            .local_description()
            .await
            .map_err(|e| HuddleError::Transport(format!("{e:#}")))?;
        signaling.send_answer(&id.player, &answer).await
    }
    .await;

    if let Err(error) = result {
        let _ = failures.send(NegotiationFailed { id, error });
    }
}

/// Cheap handle to a running host loop.
#[derive(Clone)]
pub struct HostHandle {
    me: UserId,
    room: RoomId,
    commands: mpsc::UnboundedSender<HostCommand>,
    view: watch::Receiver<RoomView>,
    signaling: Arc<dyn SignalingClient>,
}

impl HostHandle {
    pub fn me(&self) -> UserId {
        self.me
    }

    pub fn room(&self) -> RoomId {
        self.room
    }

    pub fn view(&self) -> watch::Receiver<RoomView> {
        self.view.clone()
    }

    fn command(&self, cmd: HostCommand) -> Result<()> {
        self.commands
            .send(cmd)
            .map_err(|_| HuddleError::TransportClosed)
    }

    pub fn send_position_update(&self, x: f64, y: f64, z: f64) -> Result<()> {
        self.command(HostCommand::Position([x, y, z]))
    }

    pub fn send_message(&self, text: impl Into<String>) -> Result<()> {
        self.command(HostCommand::Chat(text.into()))
    }

    /// Persists the profile, then announces it to every player. `user_id`
    /// may name any member of the room.
    pub async fn update_user_info_change(
        &self,
        name: impl Into<String>,
        color: impl Into<String>,
        user_id: UserId,
    ) -> Result<UserRecord> {
        let update = ProfileUpdate {
            name: Some(name.into()),
            color: Some(color.into()),
            user_id: (user_id != self.me).then_some(user_id),
        };
        let record = self.signaling.update_profile(&update).await?;
        self.command(HostCommand::UserInfo(record.clone()))?;
        Ok(record)
    }

    pub fn handle_my_media_stream(&self, track: Option<AudioTrack>) -> Result<()> {
        self.command(HostCommand::Media(track))
    }

    pub fn evict(&self, player: UserId) -> Result<()> {
        self.command(HostCommand::Evict(player))
    }

    pub fn shutdown(&self) {
        let _ = self.command(HostCommand::Shutdown);
    }

    /// Resolves once the host loop has stopped.
    pub async fn closed(&self) {
        self.commands.closed().await
    }
}
