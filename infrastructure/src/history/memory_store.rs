//! In-memory history store for `--no-history` runs and tests.

use parley_application::ports::history_store::{HistoryError, HistoryStore};
use parley_domain::Message;
use std::sync::{Mutex, PoisonError};

/// Keeps messages for the life of the process only.
#[derive(Default)]
pub struct MemoryHistoryStore {
    messages: Mutex<Vec<Message>>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store, as if these messages had been appended earlier.
    pub fn with_messages(messages: Vec<Message>) -> Self {
        Self {
            messages: Mutex::new(messages),
        }
    }
}

impl HistoryStore for MemoryHistoryStore {
    fn load(&self) -> Result<Vec<Message>, HistoryError> {
        Ok(self
            .messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn append(&self, message: &Message) -> Result<(), HistoryError> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.clone());
        Ok(())
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_returns_what_was_appended() {
        let store = MemoryHistoryStore::with_messages(vec![Message::user("seed")]);
        store.append(&Message::assistant("reply")).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[1].content(), "reply");
        assert_eq!(store.location(), "memory");
    }
}
