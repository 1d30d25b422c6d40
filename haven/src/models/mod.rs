mod chat;
mod shelter;

pub use chat::*;
pub use shelter::*;
