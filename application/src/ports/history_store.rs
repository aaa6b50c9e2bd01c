//! Port for durable conversation history.
//!
//! Defines the [`HistoryStore`] trait: an append-only log of messages that
//! is replayed once when a session opens. Writes are synchronous; each
//! append is one small record, flushed and synced before returning.

use parley_domain::Message;
use std::path::PathBuf;
use thiserror::Error;

/// Errors from a history store.
#[derive(Error, Debug)]
pub enum HistoryError {
    #[error("History I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to encode message: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Append-only message log.
///
/// `load` returns every well-formed record in file order; malformed records
/// are skipped by the implementation (and logged), never surfaced as errors.
/// A store that does not exist yet loads as empty.
pub trait HistoryStore: Send + Sync {
    /// Read all stored messages in order.
    fn load(&self) -> Result<Vec<Message>, HistoryError>;

    /// Durably append one message.
    fn append(&self, message: &Message) -> Result<(), HistoryError>;

    /// Where messages are kept, for log output.
    fn location(&self) -> String;
}
