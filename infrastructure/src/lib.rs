//! Infrastructure layer for parley
//!
//! This crate contains adapters that implement the ports defined in the
//! application layer (history stores, completion providers), plus
//! configuration file loading.

pub mod config;
pub mod history;
pub mod providers;

// Re-export commonly used types
pub use config::{
    ChatOverrides, ConfigLoader, ConfigValidationError, FileConfig, HistoryChoice, ResolvedChat,
};
pub use history::{JsonlHistoryStore, MemoryHistoryStore};
pub use providers::{
    AnthropicProvider, OpenAiCompatibleProvider, ProviderKind, ProviderSettings, build_gateway,
};
