use crate::AppState;
use crate::directory::RoomDirectory;
use crate::http::{ApiResult, Caller};
use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::{Stream, StreamExt};
use huddle_core::{
    ChannelName, ChatMessage, HostAnswer, HuddleError, JoinOffer, JoinRejection, JoinReply,
    MembershipChange, MessagePost, NEW_USER_EVENT, RoomId, UserId, UserRecord,
};
use std::convert::Infallible;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Tears the room down once the host stream is dropped.
struct RoomGuard {
    directory: Arc<dyn RoomDirectory>,
    host: UserId,
    room: RoomId,
}

impl Drop for RoomGuard {
    fn drop(&mut self) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("No runtime to tear down room {}", self.room);
            return;
        };

        let directory = self.directory.clone();
        let (host, room) = (self.host, self.room);
        info!("Host stream for room {} closed", room);

        runtime.spawn(async move {
            match directory.teardown_room(&host, &room).await {
                Ok(()) => {}
                // Already replaced by a newer room of the same host.
                Err(HuddleError::Unauthorized) => debug!("Room {} was already gone", room),
                Err(e) => warn!("Failed to tear down room {}: {}", room, e),
            }
        });
    }
}

fn json_event<T: serde::Serialize>(value: &T) -> Result<Event, HuddleError> {
    Ok(Event::default().data(serde_json::to_string(value)?))
}

/// Opens a room for the caller and streams every join offer addressed to it.
///
/// The first event carries the fresh room state. Each offer then arrives as a
/// `newUser` event whose data is the room snapshot with the newcomer merged in.
pub async fn host_stream(
    State(state): State<AppState>,
    Caller(host): Caller,
) -> ApiResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    let room = state.directory.create_room(&host).await?;
    let listener = state.relay.listen(ChannelName::room(&room))?;
    let guard = RoomGuard {
        directory: state.directory.clone(),
        host,
        room,
    };

    let initial = json_event(&state.directory.snapshot(&room, None).await?)?;
    info!("Host {} is listening on {}", host, listener.channel());

    let directory = state.directory.clone();
    let offers = listener.into_stream().filter_map(move |payload| {
        let directory = directory.clone();
        async move {
            let offer: JoinOffer = match serde_json::from_str(&payload) {
                Ok(offer) => offer,
                Err(e) => {
                    warn!("Dropping malformed join offer for room {}: {}", room, e);
                    return None;
                }
            };

            debug!("Join offer from {} for room {}", offer.id, room);
            let snapshot = match directory.snapshot(&room, Some(&offer)).await {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    warn!("Snapshot of room {} failed: {}", room, e);
                    return None;
                }
            };

            json_event(&snapshot)
                .map(|event| event.event(NEW_USER_EVENT))
                .ok()
        }
    });

    let stream = futures::stream::once(async move { initial })
        .chain(offers)
        .map(move |event| {
            let _guard = &guard;
            Ok(event)
        });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

/// Publishes the host's answer on the player's answer channel.
pub async fn send_answer(
    State(state): State<AppState>,
    Caller(host): Caller,
    Json(answer): Json<HostAnswer>,
) -> ApiResult<StatusCode> {
    let reply = JoinReply::Answer { sdp: answer.sdp };
    reply_to_player(&state, &host, &answer.player_id, &reply).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Tells a waiting player that the host turned the offer down.
pub async fn reject(
    State(state): State<AppState>,
    Caller(host): Caller,
    Json(rejection): Json<JoinRejection>,
) -> ApiResult<StatusCode> {
    reply_to_player(&state, &host, &rejection.player_id, &JoinReply::Rejected).await?;
    info!("Host {} rejected {}", host, rejection.player_id);
    Ok(StatusCode::NO_CONTENT)
}

async fn reply_to_player(
    state: &AppState,
    host: &UserId,
    player: &UserId,
    reply: &JoinReply,
) -> Result<(), HuddleError> {
    if !state.directory.user(host).await?.is_host {
        return Err(HuddleError::Unauthorized);
    }

    let channel = ChannelName::answer(player);
    if !state.relay.publish(&channel, serde_json::to_string(reply)?) {
        warn!("Reply for {} was not picked up", player);
    }
    Ok(())
}

pub async fn attach(
    State(state): State<AppState>,
    Caller(host): Caller,
    Json(change): Json<MembershipChange>,
) -> ApiResult<Json<UserRecord>> {
    let record = state
        .directory
        .attach_player(&host, &change.room_id, &change.player_id)
        .await?;
    Ok(Json(record))
}

pub async fn detach(
    State(state): State<AppState>,
    Caller(host): Caller,
    Json(change): Json<MembershipChange>,
) -> ApiResult<Json<UserRecord>> {
    let record = state
        .directory
        .detach_player(&host, &change.room_id, &change.player_id)
        .await?;
    Ok(Json(record))
}

pub async fn post_message(
    State(state): State<AppState>,
    Caller(host): Caller,
    Json(post): Json<MessagePost>,
) -> ApiResult<Json<ChatMessage>> {
    let message = state
        .directory
        .append_message(&host, &post.room_id, post.message)
        .await?;
    Ok(Json(message))
}
