//! Model value object representing an LLM model

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Known chat models (Value Object)
///
/// Any identifier the provider accepts can be used through [`Model::Custom`];
/// the named variants only exist so the provider family can be inferred.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Model {
    // DeepSeek models
    DeepseekChat,
    DeepseekReasoner,
    // OpenAI models
    Gpt4o,
    Gpt4oMini,
    Gpt41,
    // Claude models
    ClaudeSonnet45,
    ClaudeHaiku45,
    ClaudeOpus45,
    // Custom
    Custom(String),
}

impl Model {
    /// Get the string identifier sent to the provider
    pub fn as_str(&self) -> &str {
        match self {
            Model::DeepseekChat => "deepseek-chat",
            Model::DeepseekReasoner => "deepseek-reasoner",
            Model::Gpt4o => "gpt-4o",
            Model::Gpt4oMini => "gpt-4o-mini",
            Model::Gpt41 => "gpt-4.1",
            Model::ClaudeSonnet45 => "claude-sonnet-4-5",
            Model::ClaudeHaiku45 => "claude-haiku-4-5",
            Model::ClaudeOpus45 => "claude-opus-4-5",
            Model::Custom(s) => s,
        }
    }

    /// Check if this is a Claude model
    pub fn is_claude(&self) -> bool {
        match self {
            Model::ClaudeSonnet45 | Model::ClaudeHaiku45 | Model::ClaudeOpus45 => true,
            Model::Custom(s) => s.starts_with("claude"),
            _ => false,
        }
    }

    /// Check if this is an OpenAI model
    pub fn is_gpt(&self) -> bool {
        match self {
            Model::Gpt4o | Model::Gpt4oMini | Model::Gpt41 => true,
            Model::Custom(s) => {
                s.starts_with("gpt-")
                    || (s.starts_with('o') && s[1..].starts_with(|c: char| c.is_ascii_digit()))
            }
            _ => false,
        }
    }

    /// Check if this is a DeepSeek model
    pub fn is_deepseek(&self) -> bool {
        match self {
            Model::DeepseekChat | Model::DeepseekReasoner => true,
            Model::Custom(s) => s.starts_with("deepseek"),
            _ => false,
        }
    }
}

impl Default for Model {
    /// Returns the default model (deepseek-chat)
    fn default() -> Self {
        Model::DeepseekChat
    }
}

impl std::fmt::Display for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Model {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s.trim() {
            "deepseek-chat" => Model::DeepseekChat,
            "deepseek-reasoner" => Model::DeepseekReasoner,
            "gpt-4o" => Model::Gpt4o,
            "gpt-4o-mini" => Model::Gpt4oMini,
            "gpt-4.1" => Model::Gpt41,
            "claude-sonnet-4-5" => Model::ClaudeSonnet45,
            "claude-haiku-4-5" => Model::ClaudeHaiku45,
            "claude-opus-4-5" => Model::ClaudeOpus45,
            other => Model::Custom(other.to_string()),
        })
    }
}

impl Serialize for Model {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Model {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let Ok(model) = s.parse();
        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_model_parses_back() {
        for model in [
            Model::DeepseekChat,
            Model::Gpt4oMini,
            Model::ClaudeSonnet45,
        ] {
            let parsed: Model = model.to_string().parse().unwrap();
            assert_eq!(model, parsed);
        }
    }

    #[test]
    fn test_custom_model() {
        let model: Model = "qwen-max".parse().unwrap();
        assert_eq!(model, Model::Custom("qwen-max".to_string()));
        assert_eq!(model.to_string(), "qwen-max");
    }

    #[test]
    fn test_model_family_detection() {
        assert!(Model::ClaudeSonnet45.is_claude());
        assert!(Model::Gpt41.is_gpt());
        assert!(Model::DeepseekReasoner.is_deepseek());
        assert!(!Model::DeepseekChat.is_gpt());
    }

    #[test]
    fn test_custom_family_detection() {
        assert!(Model::Custom("claude-3-5-haiku-latest".into()).is_claude());
        assert!(Model::Custom("o3-mini".into()).is_gpt());
        assert!(!Model::Custom("openchat".into()).is_gpt());
        assert!(Model::Custom("deepseek-coder".into()).is_deepseek());
    }

    #[test]
    fn test_model_default() {
        assert_eq!(Model::default(), Model::DeepseekChat);
    }
}
