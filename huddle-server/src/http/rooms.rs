use crate::AppState;
use crate::http::{ApiResult, Caller};
use axum::{Json, extract::State};
use huddle_core::{
    ChannelName, HuddleError, JoinOffer, JoinReply, JoinRequest, RoomState, SeekRoom,
};
use tracing::{debug, info, warn};

pub async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<SeekRoom>>> {
    Ok(Json(state.directory.list_open_rooms().await?))
}

/// Forwards the caller's offer to the room's host and waits for the answer.
///
/// A host that already holds a session for the caller rejects the offer,
/// which surfaces as a conflict.
///
/// The answer channel is subscribed before the offer goes out, so an answer
/// can never overtake the subscription. Dropping the request drops the
/// subscription and frees the channel.
pub async fn join(
    State(state): State<AppState>,
    Caller(player): Caller,
    Json(request): Json<JoinRequest>,
) -> ApiResult<Json<RoomState>> {
    if request.sdp.is_empty() {
        return Err(HuddleError::BadRequest("empty offer".into()).into());
    }

    state.directory.user(&player).await?;
    let room = request.room_id;
    let host = state
        .directory
        .snapshot(&room, None)
        .await?
        .host()
        .map(|m| m.user.id)
        .ok_or_else(|| HuddleError::not_found("host of room", room))?;

    let answer = state.relay.subscribe_once(ChannelName::answer(&player))?;
    let offer = serde_json::to_string(&JoinOffer {
        id: player,
        sdp: request.sdp,
    })
    .map_err(HuddleError::from)?;

    if !state.relay.publish(&ChannelName::room(&room), offer) {
        debug!("Nobody listens on room {}", room);
        return Err(HuddleError::not_found("room", room).into());
    }

    info!("Player {} waiting for an answer from room {}", player, room);
    let reply = answer.recv_timeout(state.join_timeout).await?;
    let sdp = match serde_json::from_str::<JoinReply>(&reply).map_err(HuddleError::from)? {
        JoinReply::Answer { sdp } => sdp,
        JoinReply::Rejected => {
            warn!("Room {} turned down {}", room, player);
            return Err(HuddleError::SessionExists(player).into());
        }
    };

    let mut snapshot = state.directory.snapshot(&room, None).await?;
    if let Some(member) = snapshot.users.iter_mut().find(|m| m.user.id == host) {
        member.sdp = Some(sdp);
    }
    Ok(Json(snapshot))
}
