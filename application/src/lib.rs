//! Application layer for parley
//!
//! This crate contains the chat session use case, the ports it drives, and
//! application configuration. It depends only on the domain layer.

pub mod cancel;
pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use cancel::CancelSignal;
pub use config::SessionParams;
pub use ports::{
    history_store::{HistoryError, HistoryStore},
    llm_gateway::{
        ChatTurn, CompletionRequest, Credential, FailureKind, GatewayError, LlmGateway,
        StreamHandle, WARNING_MARKER,
    },
    reply_sink::{NoReplySink, ReplySink, SinkFlow},
};
pub use use_cases::chat_session::{ChatSession, SessionState, TurnOutcome, TurnOutput};
