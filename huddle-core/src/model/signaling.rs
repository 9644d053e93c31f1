use crate::model::room::RoomId;
use crate::model::user::UserId;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IceServerConfig {
    pub urls: Vec<String>,
    pub username: Option<String>,
    pub credential: Option<String>,
}

impl IceServerConfig {
    pub fn stun(urls: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            urls: urls.into_iter().map(Into::into).collect(),
            username: None,
            credential: None,
        }
    }
}

/// Payload of the room channel: a player asking the host to negotiate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinOffer {
    pub id: UserId,
    pub sdp: String,
}

/// Payload of a player's answer channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum JoinReply {
    Answer { sdp: String },
    /// The host already holds a session for this player.
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    /// "A new player wants to join room R", addressed by room.
    Room,
    /// "Here is the answer for player P", addressed by player.
    Sdp,
}

impl Namespace {
    fn prefix(self) -> &'static str {
        match self {
            Namespace::Room => "room",
            Namespace::Sdp => "sdp",
        }
    }
}

/// Relay address `<namespace>_<fold(id)>`.
///
/// The fold is not collision-free: two ids whose hyphen-separated groups sum
/// to the same value share a channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChannelName(String);

impl ChannelName {
    pub fn new(namespace: Namespace, id: &Uuid) -> Self {
        Self(format!("{}_{}", namespace.prefix(), fold_id(id)))
    }

    pub fn room(room: &RoomId) -> Self {
        Self::new(Namespace::Room, &room.0)
    }

    pub fn answer(player: &UserId) -> Self {
        Self::new(Namespace::Sdp, &player.0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Sums the five hex groups of the hyphenated form of `id`.
pub fn fold_id(id: &Uuid) -> u64 {
    let (time_low, time_mid, time_hi, tail) = id.as_fields();
    let clock_seq = u64::from(u16::from_be_bytes([tail[0], tail[1]]));
    let node = tail[2..]
        .iter()
        .fold(0u64, |acc, byte| (acc << 8) | u64::from(*byte));

    u64::from(time_low) + u64::from(time_mid) + u64::from(time_hi) + clock_seq + node
}
