//! Turn file config plus command-line overrides into ready-to-use settings.

use super::file_config::{ConfigValidationError, FileConfig};
use super::loader::{ConfigLoader, expand_home};
use crate::providers::{ProviderKind, ProviderSettings};
use parley_application::ports::llm_gateway::Credential;
use parley_domain::Model;
use std::path::PathBuf;

/// Where messages should be kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum HistoryChoice {
    /// `[chat].history_file`, else the default data path.
    #[default]
    Configured,
    Path(PathBuf),
    /// Keep the conversation in memory only.
    Disabled,
}

/// Values given on the command line; each wins over the config file.
#[derive(Debug, Clone, Default)]
pub struct ChatOverrides {
    pub provider: Option<String>,
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub history: HistoryChoice,
}

/// Fully resolved chat settings.
#[derive(Debug, Clone)]
pub struct ResolvedChat {
    pub provider: ProviderSettings,
    pub model: Model,
    /// `None` when history is disabled.
    pub history: Option<PathBuf>,
}

impl ResolvedChat {
    pub fn resolve(
        config: &FileConfig,
        overrides: &ChatOverrides,
    ) -> Result<Self, ConfigValidationError> {
        Self::resolve_with_env(config, overrides, |name| std::env::var(name).ok())
    }

    /// Same as [`resolve`](Self::resolve) with an injectable environment.
    pub fn resolve_with_env(
        config: &FileConfig,
        overrides: &ChatOverrides,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigValidationError> {
        config.validate()?;

        let model_name = overrides.model.as_deref().or(config.chat.model.as_deref());
        let model: Option<Model> = match model_name {
            Some(name) if name.trim().is_empty() => {
                return Err(ConfigValidationError::EmptyModelName);
            }
            Some(name) => {
                let Ok(model) = name.parse::<Model>();
                Some(model)
            }
            None => None,
        };

        let explicit_kind = overrides
            .provider
            .as_deref()
            .or(config.chat.provider.as_deref())
            .map(str::parse::<ProviderKind>)
            .transpose()?;
        let kind = explicit_kind
            .or_else(|| model.as_ref().map(ProviderKind::infer))
            .unwrap_or_default();
        let model = model.unwrap_or_else(|| kind.default_model());

        let file = config.providers.get(kind);
        let env_name = file
            .api_key_env
            .clone()
            .unwrap_or_else(|| kind.default_api_key_env().to_string());
        let credential = resolve_api_key(
            overrides.api_key.as_deref(),
            file.api_key.as_deref(),
            &env_name,
            env,
        );

        let mut provider = ProviderSettings::new(kind)
            .with_credential(credential)
            .with_credential_hint(format!("set {env_name} or pass --api-key"))
            .with_streaming(file.streaming)
            .with_max_tokens(file.max_tokens);
        if let Some(base_url) = &file.base_url {
            provider = provider.with_base_url(base_url);
        }

        let history = match &overrides.history {
            HistoryChoice::Disabled => None,
            HistoryChoice::Path(path) => Some(expand_home(path)),
            HistoryChoice::Configured => Some(
                config
                    .chat
                    .history_file
                    .as_deref()
                    .map(expand_home)
                    .unwrap_or_else(ConfigLoader::default_history_path),
            ),
        };

        Ok(Self {
            provider,
            model,
            history,
        })
    }
}

/// Pick the API key: command line, then config file, then the env var.
/// Blank values are skipped.
pub fn resolve_api_key(
    cli_key: Option<&str>,
    config_key: Option<&str>,
    env_name: &str,
    env: impl Fn(&str) -> Option<String>,
) -> Option<Credential> {
    cli_key
        .and_then(Credential::new)
        .or_else(|| config_key.and_then(Credential::new))
        .or_else(|| env(env_name).and_then(Credential::new))
}
