//! Conversation domain entities

use crate::core::error::DomainError;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Role of a message in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            other => Err(DomainError::InvalidRole(other.to_string())),
        }
    }
}

/// Current UTC time as an RFC 3339 string with millisecond precision.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// A message in a conversation (Entity)
///
/// Immutable once created; the timestamp is stamped at construction.
/// Stored records are rebuilt through [`Message::new`], which validates the
/// timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    role: Role,
    content: String,
    timestamp: String,
}

impl Message {
    /// Rebuild a message from stored parts, validating the timestamp.
    pub fn new(
        role: Role,
        content: impl Into<String>,
        timestamp: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let timestamp = timestamp.into();
        if chrono::DateTime::parse_from_rfc3339(&timestamp).is_err() {
            return Err(DomainError::InvalidTimestamp(timestamp));
        }
        Ok(Self {
            role,
            content: content.into(),
            timestamp,
        })
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::stamped(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::stamped(Role::Assistant, content)
    }

    fn stamped(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: now_timestamp(),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }
}

/// Ordered sequence of messages (Entity)
///
/// Insertion order is the conversation order. Messages are only ever
/// appended; nothing edits or reorders them afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a conversation from replayed history, keeping order.
    pub fn from_messages(messages: Vec<Message>) -> Self {
        Self { messages }
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
        assert_eq!(
            serde_json::to_string(&Role::Assistant).unwrap(),
            "\"assistant\""
        );
    }

    #[test]
    fn test_role_from_str_rejects_system() {
        assert_eq!("user".parse::<Role>().unwrap(), Role::User);
        assert!(matches!(
            "system".parse::<Role>(),
            Err(DomainError::InvalidRole(r)) if r == "system"
        ));
    }

    #[test]
    fn test_constructors_stamp_rfc3339() {
        let msg = Message::user("hello");
        assert_eq!(msg.role(), Role::User);
        assert_eq!(msg.content(), "hello");
        assert!(chrono::DateTime::parse_from_rfc3339(msg.timestamp()).is_ok());
        assert!(msg.timestamp().ends_with('Z'));
    }

    #[test]
    fn test_new_rejects_bad_timestamp() {
        let err = Message::new(Role::Assistant, "hi", "yesterday").unwrap_err();
        assert!(matches!(err, DomainError::InvalidTimestamp(_)));

        let ok = Message::new(Role::Assistant, "hi", "2026-10-19T08:00:00.000Z").unwrap();
        assert_eq!(ok.timestamp(), "2026-10-19T08:00:00.000Z");
    }

    #[test]
    fn test_message_json_shape() {
        let msg = Message::new(Role::User, "hello", "2026-10-19T08:00:00.000Z").unwrap();
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "role": "user",
                "content": "hello",
                "timestamp": "2026-10-19T08:00:00.000Z"
            })
        );
    }

    #[test]
    fn test_conversation_preserves_order() {
        let mut conversation = Conversation::new();
        conversation.push(Message::user("one"));
        conversation.push(Message::assistant("two"));
        conversation.push(Message::user("three"));

        let contents: Vec<_> = conversation.messages().iter().map(|m| m.content()).collect();
        assert_eq!(contents, vec!["one", "two", "three"]);
        assert_eq!(conversation.last().unwrap().content(), "three");
        assert_eq!(conversation.len(), 3);
    }
}
