//! Turn lifecycle of a chat session.
//!
//! ```text
//! Idle ──send──▶ Sending ──first chunk──▶ Streaming
//!                  │                          │
//!                  ├──────────────┬───────────┤
//!                  ▼              ▼           ▼
//!              Completed      Cancelled     Failed ──▶ Idle
//! ```
//!
//! Terminal states only ever lead back to `Idle`.

use crate::ports::llm_gateway::FailureKind;

/// Where the session is in its current turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Sending,
    Streaming,
    Completed,
    Cancelled,
    Failed,
}

impl SessionState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            SessionState::Completed | SessionState::Cancelled | SessionState::Failed
        )
    }

    pub fn can_transition_to(self, next: SessionState) -> bool {
        use SessionState::*;
        match (self, next) {
            (Idle, Sending) => true,
            (Sending, Streaming) => true,
            (Sending | Streaming, Completed | Cancelled | Failed) => true,
            (from, Idle) => from.is_terminal(),
            _ => false,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Sending => "sending",
            SessionState::Streaming => "streaming",
            SessionState::Completed => "completed",
            SessionState::Cancelled => "cancelled",
            SessionState::Failed => "failed",
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a call to `send_message` ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Blank input; nothing was sent or stored.
    Skipped,
    Completed,
    /// Stopped by the cancel signal or the sink. Partial text is kept.
    Cancelled,
    /// The provider failed. The reply is a notice and nothing was stored for it.
    Failed(FailureKind),
}

impl TurnOutcome {
    /// The terminal state this outcome passes through.
    pub(crate) fn terminal_state(self) -> Option<SessionState> {
        match self {
            TurnOutcome::Skipped => None,
            TurnOutcome::Completed => Some(SessionState::Completed),
            TurnOutcome::Cancelled => Some(SessionState::Cancelled),
            TurnOutcome::Failed(_) => Some(SessionState::Failed),
        }
    }
}

/// Result of one `send_message` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnOutput {
    /// Full assistant text, partial text on cancel, or a notice on failure.
    pub reply: String,
    pub outcome: TurnOutcome,
}

impl TurnOutput {
    pub fn skipped() -> Self {
        Self {
            reply: String::new(),
            outcome: TurnOutcome::Skipped,
        }
    }
}
