//! JSONL file store for conversation history.
//!
//! Each [`Message`] is one JSON line: `role`, `content`, `timestamp`.
//! Lines are only ever appended; a line that fails to decode on load is
//! skipped with a warning and the rest of the file still loads.

use parley_application::ports::history_store::{HistoryError, HistoryStore};
use parley_domain::{Message, Role};
use serde::Deserialize;
use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};

/// On-disk shape of one record.
#[derive(Deserialize)]
struct StoredMessage {
    role: String,
    content: String,
    timestamp: String,
}

impl StoredMessage {
    fn into_message(self) -> Result<Message, String> {
        let role: Role = self.role.parse().map_err(|e| format!("{e}"))?;
        Message::new(role, self.content, self.timestamp).map_err(|e| format!("{e}"))
    }
}

/// History store backed by a JSON Lines file.
///
/// Appends are serialized through a mutex and each one opens the file in
/// append mode, so a failed write can only affect the record being written.
pub struct JsonlHistoryStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonlHistoryStore {
    /// The file and its parent directories are created on first append.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    /// Get the path to the history file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> HistoryError {
        HistoryError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn open_for_append(&self) -> Result<File, HistoryError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.io_error(e))
    }

    /// True when the file has a final line without its newline, as left by
    /// an interrupted write.
    fn has_torn_tail(file: &mut File) -> std::io::Result<bool> {
        let len = file.metadata()?.len();
        if len == 0 {
            return Ok(false);
        }
        let mut last = [0u8; 1];
        file.seek(SeekFrom::Start(len - 1))?;
        file.read_exact(&mut last)?;
        Ok(last[0] != b'\n')
    }
}

impl HistoryStore for JsonlHistoryStore {
    fn load(&self) -> Result<Vec<Message>, HistoryError> {
        let content = match std::fs::read(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No history file at {}", self.path.display());
                return Ok(Vec::new());
            }
            Err(e) => return Err(self.io_error(e)),
        };

        let mut messages = Vec::new();
        // Decoded line by line so invalid UTF-8 only costs its own record
        for (index, line) in content.split(|&b| b == b'\n').enumerate() {
            if line.iter().all(u8::is_ascii_whitespace) {
                continue;
            }
            let decoded = serde_json::from_slice::<StoredMessage>(line)
                .map_err(|e| e.to_string())
                .and_then(StoredMessage::into_message);
            match decoded {
                Ok(message) => messages.push(message),
                Err(e) => warn!(
                    "Skipping unreadable history record {}:{}: {}",
                    self.path.display(),
                    index + 1,
                    e
                ),
            }
        }
        Ok(messages)
    }

    fn append(&self, message: &Message) -> Result<(), HistoryError> {
        let mut line = serde_json::to_string(message)?;
        line.push('\n');

        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut file = self.open_for_append()?;
        if Self::has_torn_tail(&mut file).map_err(|e| self.io_error(e))? {
            warn!(path = %self.path.display(), "History file ends mid-record, starting a new line");
            line.insert(0, '\n');
        }
        // One write per record keeps lines whole under O_APPEND
        file.write_all(line.as_bytes())
            .and_then(|()| file.flush())
            .and_then(|()| file.sync_data())
            .map_err(|e| self.io_error(e))
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}
