use async_trait::async_trait;
use huddle_core::{
    ChatMessage, JoinOffer, ProfileUpdate, Result, RoomId, RoomState, SeekRoom, UserId,
    UserRecord,
};

/// Authoritative room membership and host bookkeeping.
///
/// Every membership mutation is guarded by a host check: the caller must be
/// the host of the targeted room, otherwise `Unauthorized`.
#[async_trait]
pub trait RoomDirectory: Send + Sync + 'static {
    /// Creates a guest record for a first-time visitor.
    async fn register_user(&self) -> Result<UserRecord>;

    async fn user(&self, id: &UserId) -> Result<UserRecord>;

    /// Tears down any room `host` already owns, then opens a fresh one.
    async fn create_room(&self, host: &UserId) -> Result<RoomId>;

    /// Demotes the host, detaches every member and deletes the room.
    async fn teardown_room(&self, host: &UserId, room: &RoomId) -> Result<()>;

    /// No-op returning the existing record if `player` is already in a room.
    async fn attach_player(
        &self,
        host: &UserId,
        room: &RoomId,
        player: &UserId,
    ) -> Result<UserRecord>;

    async fn detach_player(
        &self,
        host: &UserId,
        room: &RoomId,
        player: &UserId,
    ) -> Result<UserRecord>;

    /// Current members and log. A newcomer is merged into the member list
    /// (carrying its offer) and also reported as `new_user`.
    async fn snapshot(&self, room: &RoomId, newcomer: Option<&JoinOffer>) -> Result<RoomState>;

    async fn list_open_rooms(&self) -> Result<Vec<SeekRoom>>;

    /// Updates the caller, or another member of the room the caller hosts.
    async fn update_profile(&self, caller: &UserId, update: &ProfileUpdate)
    -> Result<UserRecord>;

    async fn append_message(
        &self,
        host: &UserId,
        room: &RoomId,
        message: ChatMessage,
    ) -> Result<ChatMessage>;
}
