use crate::model::user::{UserId, UserRecord};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Hash, Eq, PartialEq)]
#[serde(transparent)]
pub struct RoomId(pub Uuid);

impl RoomId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RoomId {
    fn default() -> Self {
        Self::new()
    }
}

impl FromStr for RoomId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub from: UserId,
    pub time: u64,
    pub message: String,
}

/// A user as listed in a room snapshot. `sdp` is only set on the member that
/// carries a negotiation blob: the host on a join response, or the newcomer on
/// a host-side join notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    #[serde(flatten)]
    pub user: UserRecord,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sdp: Option<String>,
}

impl From<UserRecord> for Member {
    fn from(user: UserRecord) -> Self {
        Self { user, sdp: None }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomState {
    pub id: RoomId,
    #[serde(default)]
    pub users: Vec<Member>,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    #[serde(
        rename = "newUser",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub new_user: Option<Member>,
}

impl RoomState {
    pub fn host(&self) -> Option<&Member> {
        self.users.iter().find(|m| m.user.is_host)
    }

    pub fn member(&self, id: &UserId) -> Option<&Member> {
        self.users.iter().find(|m| m.user.id == *id)
    }
}

/// Discovery entry for an open room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeekRoom {
    pub room_id: RoomId,
    pub room_name: String,
    pub member_count: usize,
}
