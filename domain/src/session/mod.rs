//! Conversation domain.
//!
//! - [`entities::Message`]: a single timestamped message
//! - [`entities::Conversation`]: the ordered messages of one chat
//! - [`stream::StreamEvent`]: one event of a streaming completion

pub mod entities;
pub mod stream;
