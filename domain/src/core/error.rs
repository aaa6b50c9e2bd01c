//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Message is empty")]
    EmptyMessage,

    #[error("Invalid role: {0}")]
    InvalidRole(String),

    #[error("Invalid timestamp '{0}': expected RFC 3339")]
    InvalidTimestamp(String),

    #[error("Operation cancelled")]
    Cancelled,
}

impl DomainError {
    /// Check if this error represents a cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, DomainError::Cancelled)
    }
}
