pub use huddle_core::{HuddleError, Result, RoomId, UserId};

pub mod model {
    pub use huddle_core::model::*;
}

pub mod protocol {
    pub use huddle_core::protocol::*;
}

#[cfg(feature = "server")]
pub mod server {
    pub use huddle_server::*;
}

#[cfg(feature = "peer")]
pub mod peer {
    pub use huddle_peer::*;
}
