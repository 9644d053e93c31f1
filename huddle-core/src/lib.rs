mod error;
pub mod model;
pub mod protocol;

pub use error::{HuddleError, Result};
pub use model::*;
pub use protocol::{AppEvent, AppMessage, now_millis};

/// Header carrying the caller's user id on every directory request.
pub const USER_HEADER: &str = "x-huddle-user";

/// SSE event name used by the host stream for join offers.
pub const NEW_USER_EVENT: &str = "newUser";
