mod chat;
pub mod relay;
pub mod retrieval;
pub mod small_talk;

pub use chat::{ChatReply, ChatService};
pub use relay::RelayStream;
