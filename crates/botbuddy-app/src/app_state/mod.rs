//! Terminal application state: the chat roster, command parsing, rendering
//! and the REPL that ties them together.

mod commands;
mod render;
mod repl;
mod roster;

pub use repl::Repl;
pub use roster::ChatRoster;
