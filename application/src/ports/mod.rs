//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure and presentation adapters
//! must implement.

pub mod history_store;
pub mod llm_gateway;
pub mod reply_sink;
