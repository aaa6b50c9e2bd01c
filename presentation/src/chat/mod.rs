//! Interactive chat module
//!
//! Provides a readline-based chat interface over a [`ChatSession`](parley_application::ChatSession),
//! with replies streamed to the terminal as they arrive.

mod repl;
mod sink;

pub use repl::{ChatCommand, ChatRepl};
pub use sink::ConsoleReplySink;
