use crate::directory::RoomDirectory;
use async_trait::async_trait;
use huddle_core::{
    ChatMessage, HuddleError, JoinOffer, Member, ProfileUpdate, Result, RoomId, RoomState,
    SeekRoom, UserId, UserRecord,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use tracing::{debug, info};

struct RoomEntry {
    host: UserId,
    /// Join order, host first.
    members: Vec<UserId>,
    messages: Vec<ChatMessage>,
    opened: u64,
}

#[derive(Default)]
struct DirectoryState {
    users: HashMap<UserId, UserRecord>,
    rooms: HashMap<RoomId, RoomEntry>,
    opened: u64,
}

impl DirectoryState {
    fn user(&self, id: &UserId) -> Result<&UserRecord> {
        self.users
            .get(id)
            .ok_or_else(|| HuddleError::not_found("user", id))
    }

    fn user_mut(&mut self, id: &UserId) -> Result<&mut UserRecord> {
        self.users
            .get_mut(id)
            .ok_or_else(|| HuddleError::not_found("user", id))
    }

    fn verify_host(&self, host: &UserId, room: &RoomId) -> Result<()> {
        let verified = self
            .users
            .get(host)
            .is_some_and(|u| u.is_host && u.room_id.as_ref() == Some(room))
            && self.rooms.get(room).is_some_and(|r| r.host == *host);

        if verified {
            Ok(())
        } else {
            Err(HuddleError::Unauthorized)
        }
    }

    fn add_member(&mut self, room: &RoomId, user: &UserId) {
        if let Some(entry) = self.rooms.get_mut(room) {
            if !entry.members.contains(user) {
                entry.members.push(*user);
            }
        }
        if let Some(record) = self.users.get_mut(user) {
            record.room_id = Some(*room);
        }
    }

    fn remove_member(&mut self, room: &RoomId, user: &UserId) {
        if let Some(entry) = self.rooms.get_mut(room) {
            entry.members.retain(|m| m != user);
        }
        if let Some(record) = self.users.get_mut(user) {
            record.room_id = None;
            record.is_host = false;
        }
    }

    fn dissolve(&mut self, room: &RoomId) {
        let Some(entry) = self.rooms.remove(room) else {
            return;
        };
        for member in entry.members {
            if let Some(record) = self.users.get_mut(&member) {
                record.room_id = None;
                record.is_host = false;
            }
        }
        info!("Room {} dissolved", room);
    }

    fn members(&self, entry: &RoomEntry) -> Vec<Member> {
        entry
            .members
            .iter()
            .filter_map(|id| self.users.get(id))
            .cloned()
            .map(Member::from)
            .collect()
    }
}

/// Directory kept in process memory. State is lost on restart.
#[derive(Default)]
pub struct MemoryDirectory {
    state: Mutex<DirectoryState>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RoomDirectory for MemoryDirectory {
    async fn register_user(&self) -> Result<UserRecord> {
        let record = UserRecord::guest(UserId::new());
        self.state.lock().users.insert(record.id, record.clone());
        debug!("Registered user {}", record.id);
        Ok(record)
    }

    async fn user(&self, id: &UserId) -> Result<UserRecord> {
        self.state.lock().user(id).cloned()
    }

    async fn create_room(&self, host: &UserId) -> Result<RoomId> {
        let mut state = self.state.lock();
        let (previous, was_host) = state
            .user(host)
            .map(|record| (record.room_id, record.is_host))
            .map_err(|_| HuddleError::Unauthorized)?;

        if let Some(previous) = previous {
            if was_host {
                state.dissolve(&previous);
            } else {
                state.remove_member(&previous, host);
            }
        }

        let room = RoomId::new();
        state.opened += 1;
        let opened = state.opened;
        state.rooms.insert(
            room,
            RoomEntry {
                host: *host,
                members: Vec::new(),
                messages: Vec::new(),
                opened,
            },
        );
        state.add_member(&room, host);
        state.user_mut(host)?.is_host = true;

        info!("Room {} opened by {}", room, host);
        Ok(room)
    }

    async fn teardown_room(&self, host: &UserId, room: &RoomId) -> Result<()> {
        let mut state = self.state.lock();
        state.verify_host(host, room)?;
        state.dissolve(room);
        Ok(())
    }

    async fn attach_player(
        &self,
        host: &UserId,
        room: &RoomId,
        player: &UserId,
    ) -> Result<UserRecord> {
        let mut state = self.state.lock();
        state.verify_host(host, room)?;

        let record = state.user(player)?;
        if record.room_id.is_some() {
            debug!("Player {} already attached, leaving as is", player);
            return Ok(record.clone());
        }

        state.add_member(room, player);
        info!("Player {} attached to room {}", player, room);
        state.user(player).cloned()
    }

    async fn detach_player(
        &self,
        host: &UserId,
        room: &RoomId,
        player: &UserId,
    ) -> Result<UserRecord> {
        let mut state = self.state.lock();
        state.verify_host(host, room)?;

        if state.user(player)?.room_id.as_ref() != Some(room) {
            return Err(HuddleError::not_found("member", player));
        }

        state.remove_member(room, player);
        info!("Player {} detached from room {}", player, room);
        state.user(player).cloned()
    }

    async fn snapshot(&self, room: &RoomId, newcomer: Option<&JoinOffer>) -> Result<RoomState> {
        let state = self.state.lock();
        let entry = state
            .rooms
            .get(room)
            .ok_or_else(|| HuddleError::not_found("room", room))?;

        let mut users = state.members(entry);
        let new_user = newcomer.map(|offer| {
            let user = state
                .users
                .get(&offer.id)
                .cloned()
                .unwrap_or_else(|| UserRecord::guest(offer.id));
            Member {
                user,
                sdp: Some(offer.sdp.clone()),
            }
        });

        if let Some(newcomer) = &new_user {
            match users.iter_mut().find(|m| m.user.id == newcomer.user.id) {
                Some(existing) => existing.sdp = newcomer.sdp.clone(),
                None => users.push(newcomer.clone()),
            }
        }

        Ok(RoomState {
            id: *room,
            users,
            messages: entry.messages.clone(),
            new_user,
        })
    }

    async fn list_open_rooms(&self) -> Result<Vec<SeekRoom>> {
        let state = self.state.lock();
        let mut rooms: Vec<_> = state.rooms.iter().collect();
        rooms.sort_by_key(|(_, entry)| entry.opened);

        Ok(rooms
            .into_iter()
            .map(|(id, entry)| SeekRoom {
                room_id: *id,
                room_name: state
                    .users
                    .get(&entry.host)
                    .map(|u| u.name.clone())
                    .unwrap_or_default(),
                member_count: entry.members.len(),
            })
            .collect())
    }

    async fn update_profile(
        &self,
        caller: &UserId,
        update: &ProfileUpdate,
    ) -> Result<UserRecord> {
        if update.is_empty() {
            return Err(HuddleError::BadRequest("no data to update".into()));
        }

        let mut state = self.state.lock();
        let target = update.user_id.unwrap_or(*caller);

        if target != *caller {
            let room = state
                .user(&target)?
                .room_id
                .ok_or(HuddleError::Unauthorized)?;
            state.verify_host(caller, &room)?;
        }

        let record = state.user_mut(&target)?;
        update.apply(record);
        debug!("Profile of {} updated", target);
        Ok(record.clone())
    }

    async fn append_message(
        &self,
        host: &UserId,
        room: &RoomId,
        message: ChatMessage,
    ) -> Result<ChatMessage> {
        let mut state = self.state.lock();
        state.verify_host(host, room)?;

        if let Some(entry) = state.rooms.get_mut(room) {
            entry.messages.push(message.clone());
        }
        Ok(message)
    }
}
