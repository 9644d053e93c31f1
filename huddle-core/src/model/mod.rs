mod requests;
mod room;
mod signaling;
mod user;

pub use requests::{HostAnswer, JoinRejection, JoinRequest, MembershipChange, MessagePost};
pub use room::{ChatMessage, Member, RoomId, RoomState, SeekRoom};
pub use signaling::{ChannelName, IceServerConfig, JoinOffer, JoinReply, Namespace, fold_id};
pub use user::{ProfileUpdate, UserId, UserRecord};
