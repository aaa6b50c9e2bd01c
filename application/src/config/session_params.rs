//! Session parameters.
//!
//! [`SessionParams`] carries the per-session choices the
//! [`ChatSession`](crate::use_cases::chat_session::ChatSession) puts on every
//! request. Provider selection and endpoint settings are infrastructure
//! concerns and stay out of here.

use crate::ports::llm_gateway::Credential;
use parley_domain::Model;

#[derive(Debug, Clone, Default)]
pub struct SessionParams {
    /// Model sent with every request.
    pub model: Model,
    /// Per-request credential override. `None` uses the provider's own.
    pub credential: Option<Credential>,
}

impl SessionParams {
    pub fn new(model: Model) -> Self {
        Self {
            model,
            credential: None,
        }
    }

    pub fn with_credential(mut self, credential: Option<Credential>) -> Self {
        self.credential = credential;
        self
    }
}
