//! Raw TOML configuration data types
//!
//! These structs mirror the config file:
//!
//! ```toml
//! [chat]
//! provider = "deepseek"
//! model = "deepseek-chat"
//! history_file = "~/.local/share/parley/history.jsonl"
//!
//! [providers.deepseek]
//! api_key_env = "DEEPSEEK_API_KEY"
//! base_url = "https://api.deepseek.com/v1"
//! streaming = true
//! ```

use crate::providers::{ProviderKind, UnknownProviderError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Validation errors for configuration
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigValidationError {
    #[error("model name cannot be empty")]
    EmptyModelName,

    #[error(transparent)]
    UnknownProvider(#[from] UnknownProviderError),

    #[error("providers.{provider}.base_url '{url}' is not a valid http(s) URL: {reason}")]
    InvalidBaseUrl {
        provider: &'static str,
        url: String,
        reason: String,
    },
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Chat settings
    pub chat: FileChatConfig,
    /// Per-provider endpoint and credential settings
    pub providers: FileProvidersConfig,
}

/// `[chat]` section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileChatConfig {
    /// "deepseek", "openai" or "anthropic". Inferred from the model when unset.
    pub provider: Option<String>,
    /// Model name. Defaults to the provider's default model.
    pub model: Option<String>,
    /// History file; `~/` is expanded.
    pub history_file: Option<PathBuf>,
}

/// `[providers.<name>]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileProviderConfig {
    /// Environment variable holding the API key. Defaults per provider.
    pub api_key_env: Option<String>,
    /// Direct API key (prefer `api_key_env`).
    pub api_key: Option<String>,
    /// Endpoint base URL. Defaults per provider.
    pub base_url: Option<String>,
    /// Stream replies token by token.
    pub streaming: bool,
    /// Max tokens per reply.
    pub max_tokens: Option<u32>,
}

impl Default for FileProviderConfig {
    fn default() -> Self {
        Self {
            api_key_env: None,
            api_key: None,
            base_url: None,
            streaming: true,
            max_tokens: None,
        }
    }
}

/// `[providers]` section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileProvidersConfig {
    pub deepseek: FileProviderConfig,
    pub openai: FileProviderConfig,
    pub anthropic: FileProviderConfig,
}

impl FileProvidersConfig {
    pub fn get(&self, kind: ProviderKind) -> &FileProviderConfig {
        match kind {
            ProviderKind::Deepseek => &self.deepseek,
            ProviderKind::OpenAi => &self.openai,
            ProviderKind::Anthropic => &self.anthropic,
        }
    }
}

impl FileConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if let Some(model) = &self.chat.model
            && model.trim().is_empty()
        {
            return Err(ConfigValidationError::EmptyModelName);
        }

        if let Some(provider) = &self.chat.provider {
            provider.parse::<ProviderKind>()?;
        }

        for kind in ProviderKind::ALL {
            if let Some(url) = &self.providers.get(kind).base_url {
                validate_base_url(kind, url)?;
            }
        }

        Ok(())
    }
}

fn validate_base_url(kind: ProviderKind, raw: &str) -> Result<(), ConfigValidationError> {
    let invalid = |reason: String| ConfigValidationError::InvalidBaseUrl {
        provider: kind.as_str(),
        url: raw.to_string(),
        reason,
    };
    let url = url::Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(invalid(format!("unsupported scheme '{other}'"))),
    }
}
