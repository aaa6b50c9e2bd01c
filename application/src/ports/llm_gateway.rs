//! LLM Gateway port
//!
//! Defines the interface for communicating with completion providers.
//! Every provider, streaming or not, is normalized into one contract: a
//! lazy, finite sequence of [`StreamEvent`]s behind a [`StreamHandle`].

use async_trait::async_trait;
use parley_domain::{Message, Model, Role, StreamEvent};
use thiserror::Error;
use tokio::sync::mpsc;

/// Prefix of every user-visible failure notice.
pub const WARNING_MARKER: &str = "⚠️";

/// Errors that can occur during LLM gateway operations
#[derive(Error, Debug)]
pub enum GatewayError {
    /// No credential for the selected provider. Raised before any network call.
    #[error("Missing credential: {0}")]
    Configuration(String),

    /// The provider rejected the credential.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Connection, timeout or body read failure.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Any other provider-side failure (bad status, malformed payload).
    #[error("Provider error: {0}")]
    Provider(String),
}

/// Classification of a failed turn, without the message payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Configuration,
    Authentication,
    Transport,
    Provider,
}

impl GatewayError {
    pub fn kind(&self) -> FailureKind {
        match self {
            GatewayError::Configuration(_) => FailureKind::Configuration,
            GatewayError::Authentication(_) => FailureKind::Authentication,
            GatewayError::Transport(_) => FailureKind::Transport,
            GatewayError::Provider(_) => FailureKind::Provider,
        }
    }

    /// Text shown inline in the conversation in place of a reply.
    pub fn user_notice(&self) -> String {
        match self {
            GatewayError::Configuration(detail) => {
                format!("{WARNING_MARKER} Please provide an API key ({detail})")
            }
            GatewayError::Authentication(_) => format!("{WARNING_MARKER} Invalid API key"),
            GatewayError::Transport(message) | GatewayError::Provider(message) => {
                format!("{WARNING_MARKER} Error: {message}")
            }
        }
    }
}

/// An opaque API credential.
///
/// `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wrap a raw key. Blank keys are treated as absent.
    pub fn new(key: impl Into<String>) -> Option<Self> {
        let key = key.into();
        let trimmed = key.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// One role/content pair sent to the provider (timestamps stripped).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

impl From<&Message> for ChatTurn {
    fn from(message: &Message) -> Self {
        Self {
            role: message.role(),
            content: message.content().to_string(),
        }
    }
}

/// A normalized completion request.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub messages: Vec<ChatTurn>,
    pub model: Model,
    /// Overrides the credential the provider was constructed with.
    pub credential: Option<Credential>,
}

impl CompletionRequest {
    pub fn new(messages: &[Message], model: Model) -> Self {
        Self {
            messages: messages.iter().map(ChatTurn::from).collect(),
            model,
            credential: None,
        }
    }

    pub fn with_credential(mut self, credential: Option<Credential>) -> Self {
        self.credential = credential;
        self
    }
}

/// Handle for receiving streaming events from a provider.
///
/// Wraps an `mpsc::Receiver<StreamEvent>` fed by the provider's reader task.
/// Dropping the handle closes the channel, which makes the reader task stop
/// and release its connection.
pub struct StreamHandle {
    pub receiver: mpsc::Receiver<StreamEvent>,
}

impl StreamHandle {
    pub fn new(receiver: mpsc::Receiver<StreamEvent>) -> Self {
        Self { receiver }
    }

    /// A handle that yields the given events and then ends.
    pub fn from_events(events: Vec<StreamEvent>) -> Self {
        let (tx, rx) = mpsc::channel(events.len().max(1));
        for event in events {
            // Capacity covers every event, so try_send cannot fail on Full
            let _ = tx.try_send(event);
        }
        Self::new(rx)
    }

    /// Wait for the next event. `None` means the stream ended.
    pub async fn recv(&mut self) -> Option<StreamEvent> {
        self.receiver.recv().await
    }

    /// Consume the stream and collect all text into a single string.
    pub async fn collect_text(mut self) -> Result<String, GatewayError> {
        let mut full_text = String::new();
        let mut saw_delta = false;
        while let Some(event) = self.receiver.recv().await {
            match event {
                StreamEvent::Delta(chunk) => {
                    saw_delta = true;
                    full_text.push_str(&chunk);
                }
                StreamEvent::Completed(text) => {
                    if !saw_delta {
                        return Ok(text);
                    }
                    return Ok(full_text);
                }
                StreamEvent::Error(e) => {
                    return Err(GatewayError::Provider(e));
                }
            }
        }
        // Channel closed without Completed; return what we have
        Ok(full_text)
    }
}

/// Gateway to one completion provider.
///
/// Implementations (adapters) live in the infrastructure layer, one per
/// provider, each normalizing its own wire protocol.
#[async_trait]
pub trait LlmGateway: Send + Sync {
    /// Short provider name for logs (e.g. "deepseek").
    fn name(&self) -> &str;

    /// Send the request and wait for the whole reply.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, GatewayError>;

    /// Send the request and get a streaming reply.
    ///
    /// Default implementation calls `complete()` and exposes the whole reply
    /// as one terminal `Completed` event, so non-streaming providers work
    /// without changes.
    async fn stream_completion(
        &self,
        request: &CompletionRequest,
    ) -> Result<StreamHandle, GatewayError> {
        let result = self.complete(request).await?;
        Ok(StreamHandle::from_events(vec![StreamEvent::Completed(result)]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedGateway;

    #[async_trait]
    impl LlmGateway for FixedGateway {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn complete(&self, _request: &CompletionRequest) -> Result<String, GatewayError> {
            Ok("whole reply".to_string())
        }
    }

    #[tokio::test]
    async fn default_stream_completion_yields_single_terminal_chunk() {
        let request = CompletionRequest::new(&[Message::user("hi")], Model::default());
        let mut handle = FixedGateway.stream_completion(&request).await.unwrap();

        assert_eq!(
            handle.recv().await,
            Some(StreamEvent::Completed("whole reply".to_string()))
        );
        assert_eq!(handle.recv().await, None);
    }

    #[tokio::test]
    async fn collect_text_concatenates_deltas() {
        let handle = StreamHandle::from_events(vec![
            StreamEvent::Delta("Hel".to_string()),
            StreamEvent::Delta("lo".to_string()),
            StreamEvent::Completed(String::new()),
        ]);
        assert_eq!(handle.collect_text().await.unwrap(), "Hello");
    }

    #[tokio::test]
    async fn collect_text_surfaces_stream_error() {
        let handle = StreamHandle::from_events(vec![
            StreamEvent::Delta("partial".to_string()),
            StreamEvent::Error("overloaded".to_string()),
        ]);
        let err = handle.collect_text().await.unwrap_err();
        assert!(matches!(err, GatewayError::Provider(m) if m == "overloaded"));
    }

    #[test]
    fn request_strips_timestamps_and_keeps_order() {
        let messages = vec![Message::user("q1"), Message::assistant("a1"), Message::user("q2")];
        let request = CompletionRequest::new(&messages, Model::DeepseekChat);

        let roles: Vec<_> = request.messages.iter().map(|t| t.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant, Role::User]);
        assert_eq!(request.messages[2].content, "q2");
        assert!(request.credential.is_none());
    }

    #[test]
    fn credential_debug_is_redacted_and_blank_is_absent() {
        let credential = Credential::new("  sk-secret ").unwrap();
        assert_eq!(credential.expose(), "sk-secret");
        assert_eq!(format!("{credential:?}"), "Credential(***)");
        assert!(Credential::new("   ").is_none());
    }

    #[test]
    fn user_notices_are_marked_and_distinct() {
        let auth = GatewayError::Authentication("401".into()).user_notice();
        let config = GatewayError::Configuration("set DEEPSEEK_API_KEY".into()).user_notice();
        let other = GatewayError::Provider("HTTP 500".into()).user_notice();

        assert_eq!(auth, "⚠️ Invalid API key");
        assert!(config.starts_with(WARNING_MARKER));
        assert!(config.contains("DEEPSEEK_API_KEY"));
        assert_eq!(other, "⚠️ Error: HTTP 500");
    }
}
