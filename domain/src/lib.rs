//! Domain layer for parley
//!
//! This crate contains the core entities and value objects of a streaming
//! chat session. It has no dependencies on infrastructure or presentation
//! concerns.
//!
//! # Core Concepts
//!
//! - **Message**: one timestamped user or assistant message, immutable once
//!   appended
//! - **Conversation**: the ordered messages of a chat, replayed from history
//!   on startup and only ever appended to
//! - **StreamEvent**: one event of a provider's streaming reply

pub mod core;
pub mod session;
pub mod util;

// Re-export commonly used types
pub use core::{error::DomainError, model::Model};
pub use session::{
    entities::{Conversation, Message, Role, now_timestamp},
    stream::StreamEvent,
};
