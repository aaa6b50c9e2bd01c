//! History store adapters.
//!
//! - [`JsonlHistoryStore`]: durable, one JSON line per message
//! - [`MemoryHistoryStore`]: process-lifetime only

mod jsonl_store;
mod memory_store;

pub use jsonl_store::JsonlHistoryStore;
pub use memory_store::MemoryHistoryStore;
