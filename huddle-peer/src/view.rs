use huddle_core::{AppEvent, AppMessage, ChatMessage, RoomId, RoomState, UserId, UserRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Connecting,
    Connected,
    /// Terminal. A closed player session is never resumed.
    Closed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerState {
    pub user: UserRecord,
    pub position: [f64; 3],
    pub mic: bool,
}

impl From<UserRecord> for PlayerState {
    fn from(user: UserRecord) -> Self {
        Self {
            user,
            position: [0.0; 3],
            mic: false,
        }
    }
}

/// What the UI layer renders: members, their positions and mic flags, and
/// the chat log.
#[derive(Debug, Clone, PartialEq)]
pub struct RoomView {
    pub room: Option<RoomId>,
    pub status: SessionStatus,
    pub players: Vec<PlayerState>,
    pub messages: Vec<ChatMessage>,
}

impl RoomView {
    pub fn new() -> Self {
        Self {
            room: None,
            status: SessionStatus::Connecting,
            players: Vec::new(),
            messages: Vec::new(),
        }
    }

    pub fn from_state(state: &RoomState, status: SessionStatus) -> Self {
        Self {
            room: Some(state.id),
            status,
            players: state
                .users
                .iter()
                .map(|m| PlayerState::from(m.user.clone()))
                .collect(),
            messages: state.messages.clone(),
        }
    }

    pub fn player(&self, id: &UserId) -> Option<&PlayerState> {
        self.players.iter().find(|p| p.user.id == *id)
    }

    fn player_mut(&mut self, id: &UserId) -> Option<&mut PlayerState> {
        self.players.iter_mut().find(|p| p.user.id == *id)
    }

    /// Replaces the profile of a known member, or appends a new one.
    pub fn upsert(&mut self, user: UserRecord) {
        match self.player_mut(&user.id) {
            Some(player) => player.user = user,
            None => self.players.push(user.into()),
        }
    }

    pub fn remove(&mut self, id: &UserId) -> Option<PlayerState> {
        let index = self.players.iter().position(|p| p.user.id == *id)?;
        Some(self.players.remove(index))
    }

    pub fn set_position(&mut self, id: &UserId, position: [f64; 3]) {
        if let Some(player) = self.player_mut(id) {
            player.position = position;
        }
    }

    pub fn set_mic(&mut self, id: &UserId, mic: bool) {
        if let Some(player) = self.player_mut(id) {
            player.mic = mic;
        }
    }

    /// Applies one received frame. Not idempotent: a duplicated chat frame
    /// appends twice.
    pub fn apply(&mut self, message: &AppMessage) {
        match &message.event {
            AppEvent::PositionUpdate { position } => self.set_position(&message.from, *position),
            AppEvent::UserInfoChange { user } | AppEvent::UserJoined { user } => {
                self.upsert(user.clone())
            }
            AppEvent::UserLeft { user } => {
                self.remove(&user.id);
            }
            AppEvent::ChatMessage { .. } => {
                if let Some(line) = message.chat_line() {
                    self.messages.push(line);
                }
            }
            AppEvent::MicToggle { mic } => self.set_mic(&message.from, *mic),
        }
    }
}

impl Default for RoomView {
    fn default() -> Self {
        Self::new()
    }
}
