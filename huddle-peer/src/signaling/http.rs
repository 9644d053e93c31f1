use crate::signaling::{HostFeed, SignalingClient, SseDecoder, SseFrame};
use async_trait::async_trait;
use huddle_core::{
    ChatMessage, HostAnswer, HuddleError, IceServerConfig, JoinOffer, JoinRejection, JoinRequest,
    MembershipChange, MessagePost, NEW_USER_EVENT, ProfileUpdate, Result, RoomId, RoomState,
    SeekRoom, USER_HEADER, UserId, UserRecord,
};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

fn transport(err: reqwest::Error) -> HuddleError {
    HuddleError::Transport(err.to_string())
}

/// Maps a non-2xx response back onto the error taxonomy.
async fn check(response: Response, me: UserId) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(match status {
        StatusCode::UNAUTHORIZED => HuddleError::Unauthorized,
        StatusCode::NOT_FOUND => HuddleError::NotFound {
            resource: "remote",
            id: body,
        },
        StatusCode::GATEWAY_TIMEOUT => HuddleError::RelayTimeout,
        StatusCode::SERVICE_UNAVAILABLE => HuddleError::RelayUnavailable,
        StatusCode::BAD_REQUEST => HuddleError::BadRequest(body),
        StatusCode::CONFLICT => HuddleError::SessionExists(me),
        other => HuddleError::Transport(format!("{other}: {body}")),
    })
}

/// Talks to the signaling server over its HTTP surface.
#[derive(Clone)]
pub struct HttpSignaling {
    client: reqwest::Client,
    base: String,
    me: UserId,
}

impl HttpSignaling {
    pub fn new(base: impl Into<String>, me: UserId) -> Self {
        Self {
            client: reqwest::Client::new(),
            base: base.into().trim_end_matches('/').to_owned(),
            me,
        }
    }

    /// Creates a guest user and acts as it from then on.
    pub async fn register(base: impl Into<String>) -> Result<(Self, UserRecord)> {
        let mut signaling = Self::new(base, UserId::new());
        let record: UserRecord = signaling
            .fetch(signaling.anonymous(Method::POST, "/api/user"))
            .await?;
        signaling.me = record.id;
        info!("Registered as {}", record.id);
        Ok((signaling, record))
    }

    pub async fn me_record(&self) -> Result<UserRecord> {
        self.fetch(self.request(Method::GET, "/api/user")).await
    }

    pub async fn list_rooms(&self) -> Result<Vec<SeekRoom>> {
        self.fetch(self.request(Method::GET, "/api/game/rooms"))
            .await
    }

    pub async fn ice_servers(&self) -> Result<Vec<IceServerConfig>> {
        self.fetch(self.anonymous(Method::GET, "/api/ice")).await
    }

    fn anonymous(&self, method: Method, path: &str) -> RequestBuilder {
        self.client.request(method, format!("{}{}", self.base, path))
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.anonymous(method, path)
            .header(USER_HEADER, self.me.to_string())
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        check(request.send().await.map_err(transport)?, self.me).await
    }

    async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        self.send(request).await?.json().await.map_err(transport)
    }
}

async fn next_frames(response: &mut Response, decoder: &mut SseDecoder) -> Result<Vec<SseFrame>> {
    loop {
        let Some(chunk) = response.chunk().await.map_err(transport)? else {
            return Err(HuddleError::RelayUnavailable);
        };
        let frames = decoder.push(&chunk);
        if !frames.is_empty() {
            return Ok(frames);
        }
    }
}

fn offer_from(data: &str) -> Option<JoinOffer> {
    let state: RoomState = serde_json::from_str(data).ok()?;
    let newcomer = state.new_user?;
    Some(JoinOffer {
        id: newcomer.user.id,
        sdp: newcomer.sdp?,
    })
}

#[async_trait]
impl SignalingClient for HttpSignaling {
    fn me(&self) -> UserId {
        self.me
    }

    async fn host_room(&self) -> Result<HostFeed> {
        let mut response = self.send(self.request(Method::GET, "/api/game/host")).await?;
        let mut decoder = SseDecoder::new();

        let mut pending = next_frames(&mut response, &mut decoder).await?.into_iter();
        let first = pending.next().ok_or(HuddleError::RelayUnavailable)?;
        let room: RoomState = serde_json::from_str(&first.data)?;
        info!("Hosting room {}", room.id);

        let (tx, rx) = mpsc::unbounded_channel();
        let backlog: Vec<_> = pending.collect();

        let reader = tokio::spawn(async move {
            let mut frames = backlog;
            loop {
                for frame in frames.drain(..) {
                    if frame.event.as_deref() != Some(NEW_USER_EVENT) {
                        continue;
                    }
                    match offer_from(&frame.data) {
                        Some(offer) => {
                            debug!("Join offer from {}", offer.id);
                            if tx.send(offer).is_err() {
                                return;
                            }
                        }
                        None => warn!("Dropping newUser event without an offer"),
                    }
                }

                match next_frames(&mut response, &mut decoder).await {
                    Ok(next) => frames = next,
                    Err(e) => {
                        warn!("Host stream ended: {}", e);
                        return;
                    }
                }
            }
        });

        Ok(HostFeed::new(room, rx).with_reader(reader))
    }

    async fn send_answer(&self, player: &UserId, sdp: &str) -> Result<()> {
        let body = HostAnswer {
            player_id: *player,
            sdp: sdp.to_owned(),
        };
        self.send(self.request(Method::POST, "/api/game/host").json(&body))
            .await?;
        Ok(())
    }

    async fn reject_join(&self, player: &UserId) -> Result<()> {
        let body = JoinRejection { player_id: *player };
        self.send(self.request(Method::POST, "/api/game/host/reject").json(&body))
            .await?;
        Ok(())
    }

    async fn attach_player(&self, room: &RoomId, player: &UserId) -> Result<UserRecord> {
        let body = MembershipChange {
            room_id: *room,
            player_id: *player,
        };
        self.fetch(self.request(Method::PUT, "/api/game/host").json(&body))
            .await
    }

    async fn detach_player(&self, room: &RoomId, player: &UserId) -> Result<UserRecord> {
        let body = MembershipChange {
            room_id: *room,
            player_id: *player,
        };
        self.fetch(self.request(Method::DELETE, "/api/game/host").json(&body))
            .await
    }

    async fn join_room(&self, room: &RoomId, sdp: &str) -> Result<RoomState> {
        let body = JoinRequest {
            room_id: *room,
            sdp: sdp.to_owned(),
        };
        self.fetch(self.request(Method::POST, "/api/game/rooms").json(&body))
            .await
    }

    async fn update_profile(&self, update: &ProfileUpdate) -> Result<UserRecord> {
        self.fetch(self.request(Method::PUT, "/api/user").json(update))
            .await
    }

    async fn record_message(&self, room: &RoomId, message: &ChatMessage) -> Result<()> {
        let body = MessagePost {
            room_id: *room,
            message: message.clone(),
        };
        self.send(self.request(Method::POST, "/api/game/messages").json(&body))
            .await?;
        Ok(())
    }
}
