use crate::model::room::{ChatMessage, RoomId};
use crate::model::user::UserId;
use serde::{Deserialize, Serialize};

/// Host -> directory: answer blob for a waiting player.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostAnswer {
    pub player_id: UserId,
    pub sdp: String,
}

/// Host -> directory: turn down a join offer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRejection {
    pub player_id: UserId,
}

/// Host -> directory: attach or detach a player.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipChange {
    pub room_id: RoomId,
    pub player_id: UserId,
}

/// Player -> directory: offer blob for the host of `room_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRequest {
    pub room_id: RoomId,
    pub sdp: String,
}

/// Host -> directory: chat line for the room log.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePost {
    pub room_id: RoomId,
    pub message: ChatMessage,
}
