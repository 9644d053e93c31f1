//! Envelope carried over an established data channel.
//!
//! Every frame is one JSON text message `{ event, from, time, ...fields }`.
//! There are no sequence numbers: the channel is assumed reliable and ordered,
//! and receivers apply each frame once as it arrives.

use crate::error::Result;
use crate::model::{ChatMessage, UserId, UserRecord};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum AppEvent {
    PositionUpdate { position: [f64; 3] },
    UserInfoChange { user: UserRecord },
    UserJoined { user: UserRecord },
    UserLeft { user: UserRecord },
    ChatMessage { message: String },
    MicToggle { mic: bool },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppMessage {
    #[serde(flatten)]
    pub event: AppEvent,
    pub from: UserId,
    pub time: u64,
}

impl AppMessage {
    pub fn new(from: UserId, event: AppEvent) -> Self {
        Self {
            event,
            from,
            time: now_millis(),
        }
    }

    pub fn to_text(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_text(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// The chat line this message appends, if it is a chat message.
    pub fn chat_line(&self) -> Option<ChatMessage> {
        match &self.event {
            AppEvent::ChatMessage { message } => Some(ChatMessage {
                from: self.from,
                time: self.time,
                message: message.clone(),
            }),
            _ => None,
        }
    }
}

pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
