//! Application-level configuration.
//!
//! - [`SessionParams`]: model and credential override used by a chat session

pub mod session_params;

pub use session_params::SessionParams;
