use crate::model::UserId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HuddleError {
    /// Caller is not the verified host of the targeted room.
    #[error("unauthorized")]
    Unauthorized,

    #[error("{resource} {id} not found")]
    NotFound { resource: &'static str, id: String },

    /// No negotiation payload arrived within the bound.
    #[error("timed out waiting for a relay payload")]
    RelayTimeout,

    /// The relay went away (or the subscription was displaced) mid-wait.
    #[error("signaling relay unavailable")]
    RelayUnavailable,

    /// A negotiation message arrived that the session's local state does not expect.
    #[error("negotiation mismatch: {0}")]
    NegotiationMismatch(String),

    #[error("data channel closed")]
    TransportClosed,

    /// A join request named a player that already has an open session.
    #[error("player {0} already has an open session")]
    SessionExists(UserId),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("transport error: {0}")]
    Transport(String),
}

impl HuddleError {
    pub fn not_found(resource: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            resource,
            id: id.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, HuddleError>;
