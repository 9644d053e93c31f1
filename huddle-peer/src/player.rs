//! Player side: a single link to the host.

use crate::config::PeerConfig;
use crate::gather::settle;
use crate::link::{
    AudioTrack, GatherSignal, LinkEvent, LinkFactory, NewLink, PeerLink, Role, SessionId,
};
use crate::signaling::SignalingClient;
use crate::view::{RoomView, SessionStatus};
use huddle_core::{
    AppEvent, AppMessage, HuddleError, ProfileUpdate, Result, RoomId, RoomState, UserId,
    UserRecord,
};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

pub enum PlayerCommand {
    Position([f64; 3]),
    Chat(String),
    /// Announce a profile that is already persisted.
    UserInfo(UserRecord),
    Media(Option<AudioTrack>),
    Leave,
}

pub struct PlayerOrchestrator {
    me: UserId,
    room: RoomId,
    link: Arc<dyn PeerLink>,
    view: watch::Sender<RoomView>,
    command_rx: mpsc::UnboundedReceiver<PlayerCommand>,
    link_rx: mpsc::UnboundedReceiver<LinkEvent>,
}

impl PlayerOrchestrator {
    /// Offers a connection to the host of `room` and waits for its answer.
    ///
    /// Any failure here is final for this attempt; the caller restarts the
    /// join from scratch.
    pub async fn join(
        config: PeerConfig,
        signaling: Arc<dyn SignalingClient>,
        factory: Arc<dyn LinkFactory>,
        room: RoomId,
    ) -> Result<PlayerHandle> {
        let me = signaling.me();
        let id = SessionId {
            player: me,
            epoch: 1,
        };

        let (link_tx, link_rx) = mpsc::unbounded_channel();
        let NewLink {
            link,
            mut gathering,
        } = factory
            .connect(id, Role::Player, link_tx)
            .await
            .map_err(|e| HuddleError::Transport(format!("{e:#}")))?;

        let state = match offer_and_wait(
            &config,
            signaling.as_ref(),
            link.as_ref(),
            &mut gathering,
            &room,
        )
        .await
        {
            Ok(state) => state,
            Err(e) => {
                warn!("Joining room {} failed: {}", room, e);
                let _ = link.close().await;
                return Err(e);
            }
        };

        info!("Answer from room {} applied", room);
        let (view, view_rx) = watch::channel(RoomView::from_state(&state, SessionStatus::Connecting));
        let (command_tx, command_rx) = mpsc::unbounded_channel();

        let player = Self {
            me,
            room,
            link,
            view,
            command_rx,
            link_rx,
        };
        tokio::spawn(player.run());

        Ok(PlayerHandle {
            me,
            room,
            commands: command_tx,
            view: view_rx,
            signaling,
        })
    }

    async fn run(mut self) {
        info!("Player loop for room {} started", self.room);

        loop {
            tokio::select! {
                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(PlayerCommand::Leave) | None => break,
                        Some(c) => self.handle_command(c).await,
                    }
                }

                evt = self.link_rx.recv() => {
                    match evt {
                        Some(LinkEvent::Open(_)) => {
                            info!("Connected to the host of room {}", self.room);
                            self.view.send_modify(|v| v.status = SessionStatus::Connected);
                        }
                        Some(LinkEvent::Message(_, text)) => self.on_message(&text),
                        // Terminal: no automatic re-join.
                        Some(LinkEvent::Closed(_)) | None => {
                            warn!("Channel to the host of room {} closed", self.room);
                            break;
                        }
                    }
                }
            }
        }

        if let Err(e) = self.link.close().await {
            debug!("Closing link failed: {:#}", e);
        }
        self.view.send_modify(|v| v.status = SessionStatus::Closed);
        info!("Player loop for room {} finished", self.room);
    }

    async fn handle_command(&mut self, cmd: PlayerCommand) {
        let msg = match cmd {
            PlayerCommand::Position(position) => {
                self.view.send_modify(|v| v.set_position(&self.me, position));
                AppMessage::new(self.me, AppEvent::PositionUpdate { position })
            }
            PlayerCommand::Chat(message) => {
                let msg = AppMessage::new(self.me, AppEvent::ChatMessage { message });
                self.view.send_modify(|v| v.apply(&msg));
                msg
            }
            PlayerCommand::UserInfo(user) => {
                self.view.send_modify(|v| v.upsert(user.clone()));
                AppMessage::new(self.me, AppEvent::UserInfoChange { user })
            }
            PlayerCommand::Media(track) => {
                let mic = track.is_some();
                if let Err(e) = self.link.set_audio_track(track).await {
                    warn!("Failed to swap audio: {:#}", e);
                }
                self.view.send_modify(|v| v.set_mic(&self.me, mic));
                AppMessage::new(self.me, AppEvent::MicToggle { mic })
            }
            PlayerCommand::Leave => return,
        };

        self.send(&msg).await;
    }

    async fn send(&self, msg: &AppMessage) {
        if !self.link.is_open() {
            warn!("Channel to host not open, dropping frame");
            return;
        }

        let result = match msg.to_text() {
            Ok(text) => self.link.send(&text).await.map_err(|e| format!("{e:#}")),
            Err(e) => Err(e.to_string()),
        };
        if let Err(e) = result {
            warn!("Failed to send frame to host: {}", e);
        }
    }

    fn on_message(&mut self, text: &str) {
        match AppMessage::from_text(text) {
            Ok(msg) => {
                debug!("Frame {:?} from {}", msg.event, msg.from);
                self.view.send_modify(|v| v.apply(&msg));
            }
            Err(e) => warn!("Dropping malformed frame from host: {}", e),
        }
    }
}

async fn offer_and_wait(
    config: &PeerConfig,
    signaling: &dyn SignalingClient,
    link: &dyn PeerLink,
    gathering: &mut mpsc::UnboundedReceiver<GatherSignal>,
    room: &RoomId,
) -> Result<RoomState> {
    link.create_offer(&config.channel_label)
        .await
        .map_err(|e| HuddleError::Transport(format!("{e:#}")))?;

    let settled = settle(gathering, config.quiet_period, config.gathering_cap).await;
    debug!("Offer settled: {:?}", settled);

    let offer = link
        .local_description()
        .await
        .map_err(|e| HuddleError::Transport(format!("{e:#}")))?;

    let state = tokio::time::timeout(config.join_timeout, signaling.join_room(room, &offer))
        .await
        .map_err(|_| HuddleError::RelayTimeout)??;

    let answer = state
        .host()
        .and_then(|host| host.sdp.clone())
        .ok_or_else(|| HuddleError::NegotiationMismatch("snapshot carries no host answer".into()))?;

    link.apply_answer(&answer)
        .await
        .map_err(|e| HuddleError::NegotiationMismatch(format!("{e:#}")))?;
    Ok(state)
}

/// Cheap handle to a running player loop.
#[derive(Clone)]
pub struct PlayerHandle {
    me: UserId,
    room: RoomId,
    commands: mpsc::UnboundedSender<PlayerCommand>,
    view: watch::Receiver<RoomView>,
    signaling: Arc<dyn SignalingClient>,
}

impl PlayerHandle {
    pub fn me(&self) -> UserId {
        self.me
    }

    pub fn room(&self) -> RoomId {
        self.room
    }

    pub fn view(&self) -> watch::Receiver<RoomView> {
        self.view.clone()
    }

    fn command(&self, cmd: PlayerCommand) -> Result<()> {
        self.commands
            .send(cmd)
            .map_err(|_| HuddleError::TransportClosed)
    }

    pub fn send_position_update(&self, x: f64, y: f64, z: f64) -> Result<()> {
        self.command(PlayerCommand::Position([x, y, z]))
    }

    pub fn send_message(&self, text: impl Into<String>) -> Result<()> {
        self.command(PlayerCommand::Chat(text.into()))
    }

    /// Persists the profile, then tells the host, which relays it to the
    /// other players.
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
        self.command(PlayerCommand::UserInfo(record.clone()))?;
        Ok(record)
    }

    pub fn handle_my_media_stream(&self, track: Option<AudioTrack>) -> Result<()> {
        self.command(PlayerCommand::Media(track))
    }

    pub fn leave(&self) {
        let _ = self.command(PlayerCommand::Leave);
    }

    /// Resolves once the session is over, either by leaving or because the
    /// channel to the host closed.
    pub async fn closed(&self) {
        self.commands.closed().await
    }
}
