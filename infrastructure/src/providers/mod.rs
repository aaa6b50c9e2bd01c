//! Completion provider adapters.
//!
//! One adapter type per wire protocol, all behind
//! [`LlmGateway`](parley_application::ports::llm_gateway::LlmGateway):
//!
//! | kind        | adapter                     |
//! |-------------|-----------------------------|
//! | `deepseek`  | [`OpenAiCompatibleProvider`] |
//! | `openai`    | [`OpenAiCompatibleProvider`] |
//! | `anthropic` | [`AnthropicProvider`]        |
//!
//! Each adapter receives an explicit [`ProviderSettings`] at construction.

pub mod anthropic;
mod http;
pub mod openai_compatible;
mod sse;

pub use anthropic::AnthropicProvider;
pub use openai_compatible::OpenAiCompatibleProvider;

use parley_application::ports::llm_gateway::{Credential, LlmGateway};
use parley_domain::Model;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown provider '{0}' (expected deepseek, openai or anthropic)")]
pub struct UnknownProviderError(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ProviderKind {
    #[default]
    Deepseek,
    OpenAi,
    Anthropic,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 3] = [
        ProviderKind::Deepseek,
        ProviderKind::OpenAi,
        ProviderKind::Anthropic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Deepseek => "deepseek",
            ProviderKind::OpenAi => "openai",
            ProviderKind::Anthropic => "anthropic",
        }
    }

    /// Pick the provider that serves `model`'s family.
    pub fn infer(model: &Model) -> Self {
        if model.is_claude() {
            ProviderKind::Anthropic
        } else if model.is_gpt() {
            ProviderKind::OpenAi
        } else {
            ProviderKind::Deepseek
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            ProviderKind::Deepseek => "https://api.deepseek.com/v1",
            ProviderKind::OpenAi => "https://api.openai.com/v1",
            ProviderKind::Anthropic => "https://api.anthropic.com",
        }
    }

    pub fn default_api_key_env(&self) -> &'static str {
        match self {
            ProviderKind::Deepseek => "DEEPSEEK_API_KEY",
            ProviderKind::OpenAi => "OPENAI_API_KEY",
            ProviderKind::Anthropic => "ANTHROPIC_API_KEY",
        }
    }

    pub fn default_model(&self) -> Model {
        match self {
            ProviderKind::Deepseek => Model::DeepseekChat,
            ProviderKind::OpenAi => Model::Gpt4o,
            ProviderKind::Anthropic => Model::ClaudeSonnet45,
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProviderKind {
    type Err = UnknownProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "deepseek" => Ok(ProviderKind::Deepseek),
            "openai" => Ok(ProviderKind::OpenAi),
            "anthropic" => Ok(ProviderKind::Anthropic),
            other => Err(UnknownProviderError(other.to_string())),
        }
    }
}

/// Everything an adapter needs, resolved up front.
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub kind: ProviderKind,
    /// Base URL without a trailing slash.
    pub base_url: String,
    pub credential: Option<Credential>,
    /// Shown to the user when no credential is available.
    pub credential_hint: String,
    pub streaming: bool,
    pub max_tokens: Option<u32>,
}

impl ProviderSettings {
    /// Defaults for `kind`, without a credential.
    pub fn new(kind: ProviderKind) -> Self {
        Self {
            kind,
            base_url: kind.default_base_url().to_string(),
            credential: None,
            credential_hint: format!("set {} or pass --api-key", kind.default_api_key_env()),
            streaming: true,
            max_tokens: None,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_credential(mut self, credential: Option<Credential>) -> Self {
        self.credential = credential;
        self
    }

    pub fn with_credential_hint(mut self, hint: impl Into<String>) -> Self {
        self.credential_hint = hint.into();
        self
    }

    pub fn with_streaming(mut self, streaming: bool) -> Self {
        self.streaming = streaming;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// Build the adapter for `settings.kind`.
pub fn build_gateway(settings: ProviderSettings) -> Arc<dyn LlmGateway> {
    match settings.kind {
        ProviderKind::Deepseek | ProviderKind::OpenAi => {
            Arc::new(OpenAiCompatibleProvider::new(settings))
        }
        ProviderKind::Anthropic => Arc::new(AnthropicProvider::new(settings)),
    }
}
