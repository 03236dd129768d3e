pub mod errors;
pub mod id;

pub use errors::{BotBuddyError, ConfigError};
pub use id::{ChatId, SessionId};
