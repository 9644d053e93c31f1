use async_trait::async_trait;
use huddle_core::{
    ChatMessage, HuddleError, JoinOffer, Member, ProfileUpdate, Result, RoomId, RoomState,
    UserId, UserRecord,
};
use huddle_peer::{HostFeed, SignalingClient};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq)]
pub enum SignalCall {
    SendAnswer { player: UserId, sdp: String },
    Reject(UserId),
    Attach(UserId),
    Detach(UserId),
    Join { room: RoomId, sdp: String },
    UpdateProfile(ProfileUpdate),
    RecordMessage(ChatMessage),
}

/// How `join_room` responds.
#[derive(Debug, Clone)]
pub enum JoinBehavior {
    /// Host member carries this answer.
    Answer(String),
    /// Snapshot without any answer.
    NoAnswer,
    /// Never returns.
    Hang,
}

/// Directory and relay stand-in that records every call.
pub struct MockSignaling {
    me: UserId,
    room: RoomId,
    host: UserId,
    offers_tx: mpsc::UnboundedSender<JoinOffer>,
    offers_rx: Mutex<Option<mpsc::UnboundedReceiver<JoinOffer>>>,
    join: Mutex<JoinBehavior>,
    users: Mutex<HashMap<UserId, UserRecord>>,
    calls: Mutex<Vec<SignalCall>>,
}

impl MockSignaling {
    /// Signaling for a host; `me` owns the room.
    pub fn host() -> Arc<Self> {
        let me = UserId::new();
        Self::build(me, me)
    }

    /// Signaling for a player joining a room hosted by someone else.
    pub fn player(join: JoinBehavior) -> Arc<Self> {
        let signaling = Self::build(UserId::new(), UserId::new());
        *signaling.join.lock() = join;
        signaling
    }

    fn build(me: UserId, host: UserId) -> Arc<Self> {
        let (offers_tx, offers_rx) = mpsc::unbounded_channel();
        Arc::new(Self {
            me,
            room: RoomId::new(),
            host,
            offers_tx,
            offers_rx: Mutex::new(Some(offers_rx)),
            join: Mutex::new(JoinBehavior::NoAnswer),
            users: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn room(&self) -> RoomId {
        self.room
    }

    pub fn host_id(&self) -> UserId {
        self.host
    }

    /// Pushes a join offer into the host feed.
    pub fn offer(&self, player: UserId, sdp: impl Into<String>) {
        let _ = self.offers_tx.send(JoinOffer {
            id: player,
            sdp: sdp.into(),
        });
    }

    pub fn calls(&self) -> Vec<SignalCall> {
        self.calls.lock().clone()
    }

    pub fn answers_for(&self, player: &UserId) -> usize {
        self.count(|c| matches!(c, SignalCall::SendAnswer { player: p, .. } if p == player))
    }

    pub fn rejects_for(&self, player: &UserId) -> usize {
        self.count(|c| matches!(c, SignalCall::Reject(p) if p == player))
    }

    /// Seats `player` in some other room, so attaching leaves it there.
    pub fn seat_elsewhere(&self, player: UserId) {
        let mut user = UserRecord::guest(player);
        user.room_id = Some(RoomId::new());
        self.users.lock().insert(player, user);
    }

    pub fn detaches_for(&self, player: &UserId) -> usize {
        self.count(|c| matches!(c, SignalCall::Detach(p) if p == player))
    }

    pub fn recorded(&self) -> Vec<String> {
        self.calls
            .lock()
            .iter()
            .filter_map(|c| match c {
                SignalCall::RecordMessage(line) => Some(line.message.clone()),
                _ => None,
            })
            .collect()
    }

    fn count(&self, pred: impl Fn(&SignalCall) -> bool) -> usize {
        self.calls.lock().iter().filter(|c| pred(c)).count()
    }

    fn record(&self, call: SignalCall) {
        tracing::debug!("[MockSignaling] {:?}", call);
        self.calls.lock().push(call);
    }

    fn user(&self, id: &UserId) -> UserRecord {
        self.users
            .lock()
            .entry(*id)
            .or_insert_with(|| {
                let mut user = UserRecord::guest(*id);
                user.is_host = *id == self.host;
                user
            })
            .clone()
    }
}

#[async_trait]
impl SignalingClient for MockSignaling {
    fn me(&self) -> UserId {
        self.me
    }

    async fn host_room(&self) -> Result<HostFeed> {
        let offers = self
            .offers_rx
            .lock()
            .take()
            .ok_or(HuddleError::RelayUnavailable)?;

        let mut host = self.user(&self.me);
        host.room_id = Some(self.room);
        let room = RoomState {
            id: self.room,
            users: vec![Member::from(host)],
            messages: vec![],
            new_user: None,
        };
        Ok(HostFeed::new(room, offers))
    }

    async fn send_answer(&self, player: &UserId, sdp: &str) -> Result<()> {
        self.record(SignalCall::SendAnswer {
            player: *player,
            sdp: sdp.to_owned(),
        });
        Ok(())
    }

    async fn reject_join(&self, player: &UserId) -> Result<()> {
        self.record(SignalCall::Reject(*player));
        Ok(())
    }

    async fn attach_player(&self, room: &RoomId, player: &UserId) -> Result<UserRecord> {
        self.record(SignalCall::Attach(*player));
        let mut users = self.users.lock();
        let user = users
            .entry(*player)
            .or_insert_with(|| UserRecord::guest(*player));
        if user.room_id.is_none() {
            user.room_id = Some(*room);
        }
        Ok(user.clone())
    }

    async fn detach_player(&self, _room: &RoomId, player: &UserId) -> Result<UserRecord> {
        self.record(SignalCall::Detach(*player));
        let mut users = self.users.lock();
        let user = users
            .get_mut(player)
            .ok_or_else(|| HuddleError::not_found("user", player))?;
        user.room_id = None;
        Ok(user.clone())
    }

    async fn join_room(&self, room: &RoomId, sdp: &str) -> Result<RoomState> {
        self.record(SignalCall::Join {
            room: *room,
            sdp: sdp.to_owned(),
        });

        let behavior = self.join.lock().clone();
        let answer = match behavior {
            JoinBehavior::Answer(answer) => Some(answer),
            JoinBehavior::NoAnswer => None,
            JoinBehavior::Hang => std::future::pending().await,
        };

        let host = Member {
            user: self.user(&self.host),
            sdp: answer,
        };
        Ok(RoomState {
            id: *room,
            users: vec![host, Member::from(self.user(&self.me))],
            messages: vec![],
            new_user: None,
        })
    }

    async fn update_profile(&self, update: &ProfileUpdate) -> Result<UserRecord> {
        self.record(SignalCall::UpdateProfile(update.clone()));
        let target = update.user_id.unwrap_or(self.me);
        let mut user = self.user(&target);
        update.apply(&mut user);
        self.users.lock().insert(target, user.clone());
        Ok(user)
    }

    async fn record_message(&self, _room: &RoomId, message: &ChatMessage) -> Result<()> {
        self.record(SignalCall::RecordMessage(message.clone()));
        Ok(())
    }
}
