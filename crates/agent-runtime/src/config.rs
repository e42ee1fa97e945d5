//! Provider configuration
//!
//! Environment variables:
//!
//! | variable                     | meaning                                   |
//! |------------------------------|-------------------------------------------|
//! | `LITEWIKI_PROVIDER`          | `openai` (default), `anthropic`, `google`, `custom` or a legacy alias |
//! | `LITEWIKI_API_KEY`           | credential sent to the provider           |
//! | `LITEWIKI_BASE_URL`          | full endpoint URL, default per provider   |
//! | `LITEWIKI_MODEL`             | model id, default per provider            |
//! | `LITEWIKI_TIMEOUT_SECS`      | per-request timeout, off when unset       |
//! | `LITEWIKI_ANTHROPIC_VERSION` | `anthropic-version` header override       |

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use agent_core::{
    error::{AgentError, Result},
    provider::LlmProvider,
};
use tracing::debug;

/// Provider family
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ProviderKind {
    /// OpenAI Chat Completions
    #[default]
    OpenAi,
    /// Anthropic Messages
    Anthropic,
    /// Google Gemini generateContent
    Google,
    /// Any OpenAI-compatible endpoint; needs an explicit base URL and model
    Custom,
}

impl ProviderKind {
    /// Normalize a provider id, accepting legacy interface-type names
    ///
    /// Unknown values fall back to [`ProviderKind::Custom`].
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "openai" | "openai-chat-completions" | "openai-responses" => Self::OpenAi,
            "anthropic" | "anthropic-messages" | "anthropic-openai-compatible" => Self::Anthropic,
            "google" | "gemini" | "gemini-generate-content" => Self::Google,
            _ => Self::Custom,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
            Self::Google => "google",
            Self::Custom => "custom",
        }
    }

    pub fn default_base_url(self) -> Option<&'static str> {
        match self {
            Self::OpenAi => Some("https://api.openai.com/v1/chat/completions"),
            Self::Anthropic => Some("https://api.anthropic.com/v1/messages"),
            Self::Google => Some("https://generativelanguage.googleapis.com/v1beta/models/{model}:generateContent"),
            Self::Custom => None,
        }
    }

    pub fn default_model(self) -> Option<&'static str> {
        match self {
            Self::OpenAi => Some("gpt-4o-mini"),
            Self::Anthropic => Some("claude-3-5-sonnet-latest"),
            Self::Google => Some("gemini-2.0-flash"),
            Self::Custom => None,
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything needed to build one provider adapter
#[derive(Clone, Debug, Default)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub timeout: Option<Duration>,
    pub anthropic_version: Option<String>,
}

impl ProviderConfig {
    /// Read the `LITEWIKI_*` environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ProviderConfig::from_env`] over an arbitrary source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        Self {
            kind: get("LITEWIKI_PROVIDER")
                .map(|p| ProviderKind::parse(&p))
                .unwrap_or_default(),
            api_key: get("LITEWIKI_API_KEY"),
            base_url: get("LITEWIKI_BASE_URL"),
            model: get("LITEWIKI_MODEL"),
            timeout: get("LITEWIKI_TIMEOUT_SECS")
                .and_then(|s| s.parse().ok())
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
            anthropic_version: get("LITEWIKI_ANTHROPIC_VERSION"),
        }
    }

    /// Explicit base URL or the provider default
    pub fn endpoint(&self) -> Result<String> {
        self.base_url
            .clone()
            .or_else(|| self.kind.default_base_url().map(String::from))
            .ok_or_else(|| AgentError::Config(format!("a base URL is required for provider {}", self.kind)))
    }

    /// Explicit model or the provider default
    pub fn model(&self) -> Result<String> {
        self.model
            .clone()
            .or_else(|| self.kind.default_model().map(String::from))
            .ok_or_else(|| AgentError::Config(format!("a model is required for provider {}", self.kind)))
    }

    fn api_key(&self) -> Result<String> {
        self.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| AgentError::Config("LITEWIKI_API_KEY is not set".into()))
    }
}

/// Build the adapter for `config.kind`
pub fn build_provider(config: &ProviderConfig) -> Result<Arc<dyn LlmProvider>> {
    let api_key = config.api_key()?;
    let endpoint = config.endpoint()?;
    debug!(provider = %config.kind, endpoint = %endpoint, "building provider");

    match config.kind {
        #[cfg(feature = "openai")]
        ProviderKind::OpenAi | ProviderKind::Custom => Ok(Arc::new(
            crate::openai::OpenAiProvider::new(api_key, endpoint).with_timeout(config.timeout),
        )),

        #[cfg(feature = "anthropic")]
        ProviderKind::Anthropic => {
            let mut provider = crate::anthropic::AnthropicProvider::new(api_key, endpoint).with_timeout(config.timeout);
            if let Some(version) = &config.anthropic_version {
                provider = provider.with_version(version.clone());
            }
            Ok(Arc::new(provider))
        }

        #[cfg(feature = "gemini")]
        ProviderKind::Google => Ok(Arc::new(
            crate::gemini::GeminiProvider::new(api_key, endpoint).with_timeout(config.timeout),
        )),

        #[allow(unreachable_patterns)]
        other => Err(AgentError::Config(format!(
            "provider {other} is not compiled into this build"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> ProviderConfig {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| ((*k).into(), (*v).into())).collect();
        ProviderConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_provider_aliases() {
        assert_eq!(ProviderKind::parse("openai"), ProviderKind::OpenAi);
        assert_eq!(ProviderKind::parse("openai-chat-completions"), ProviderKind::OpenAi);
        assert_eq!(ProviderKind::parse("openai-responses"), ProviderKind::OpenAi);
        assert_eq!(ProviderKind::parse(" Anthropic "), ProviderKind::Anthropic);
        assert_eq!(ProviderKind::parse("anthropic-messages"), ProviderKind::Anthropic);
        assert_eq!(ProviderKind::parse("anthropic-openai-compatible"), ProviderKind::Anthropic);
        assert_eq!(ProviderKind::parse("gemini-generate-content"), ProviderKind::Google);
        assert_eq!(ProviderKind::parse("google"), ProviderKind::Google);
        assert_eq!(ProviderKind::parse("siliconflow"), ProviderKind::Custom);
        assert_eq!(ProviderKind::parse("ollama-openai-chat-completions"), ProviderKind::Custom);
        assert_eq!(ProviderKind::parse("something-else"), ProviderKind::Custom);
    }

    #[test]
    fn test_defaults() {
        let cfg = config(&[("LITEWIKI_API_KEY", "k")]);
        assert_eq!(cfg.kind, ProviderKind::OpenAi);
        assert_eq!(cfg.endpoint().unwrap(), "https://api.openai.com/v1/chat/completions");
        assert_eq!(cfg.model().unwrap(), "gpt-4o-mini");
        assert!(cfg.timeout.is_none());
    }

    #[test]
    fn test_env_values() {
        let cfg = config(&[
            ("LITEWIKI_PROVIDER", "gemini-generate-content"),
            ("LITEWIKI_API_KEY", "k"),
            ("LITEWIKI_MODEL", "gemini-1.5-pro"),
            ("LITEWIKI_TIMEOUT_SECS", "30"),
            ("LITEWIKI_BASE_URL", "  "),
        ]);
        assert_eq!(cfg.kind, ProviderKind::Google);
        assert_eq!(cfg.model().unwrap(), "gemini-1.5-pro");
        assert_eq!(cfg.timeout, Some(Duration::from_secs(30)));
        assert!(cfg.endpoint().unwrap().contains("{model}"));
    }

    #[test]
    fn test_invalid_timeout_is_ignored() {
        assert!(config(&[("LITEWIKI_TIMEOUT_SECS", "soon")]).timeout.is_none());
        assert!(config(&[("LITEWIKI_TIMEOUT_SECS", "0")]).timeout.is_none());
    }

    #[test]
    fn test_custom_needs_base_url_and_model() {
        let cfg = config(&[("LITEWIKI_PROVIDER", "custom"), ("LITEWIKI_API_KEY", "k")]);
        assert!(matches!(cfg.endpoint(), Err(AgentError::Config(_))));
        assert!(matches!(cfg.model(), Err(AgentError::Config(_))));
        assert!(build_provider(&cfg).is_err());
    }

    #[test]
    fn test_build_requires_api_key() {
        let err = build_provider(&config(&[])).err().unwrap();
        assert!(matches!(err, AgentError::Config(_)));
    }

    #[test]
    fn test_build_each_kind() {
        for (kind, name) in [("openai", "openai"), ("anthropic", "anthropic"), ("google", "google")] {
            let provider = build_provider(&config(&[("LITEWIKI_PROVIDER", kind), ("LITEWIKI_API_KEY", "k")])).unwrap();
            assert_eq!(provider.name(), name);
        }

        let custom = build_provider(&config(&[
            ("LITEWIKI_PROVIDER", "siliconflow"),
            ("LITEWIKI_API_KEY", "k"),
            ("LITEWIKI_BASE_URL", "http://localhost:11434/v1/chat/completions"),
        ]))
        .unwrap();
        assert_eq!(custom.name(), "openai");
    }
}
