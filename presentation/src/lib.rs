//! Presentation layer for parley
//!
//! This crate contains the CLI definition, console formatting, and the
//! interactive chat interface.

pub mod chat;
pub mod cli;
pub mod output;

// Re-export commonly used types
pub use chat::{ChatCommand, ChatRepl, ConsoleReplySink};
pub use cli::commands::Cli;
pub use output::console::{ConsoleFormatter, NO_RESPONSE_NOTICE};
