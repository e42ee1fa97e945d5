//! # agent-runtime
//!
//! HTTP provider adapters for the agent loop.
//!
//! ## Providers
//!
//! - **OpenAI** (default): Chat Completions, also any OpenAI-compatible host
//! - **Anthropic**: Messages API
//! - **Google**: Gemini generateContent
//!
//! ## Usage
//!
//! ```rust,ignore
//! use agent_runtime::{build_provider, ProviderConfig};
//!
//! let config = ProviderConfig::from_env();
//! let agent = AgentBuilder::new()
//!     .provider(build_provider(&config)?)
//!     .model(config.model()?)
//!     .build()?;
//! ```

pub mod config;
mod http;

#[cfg(feature = "openai")]
pub mod openai;

#[cfg(feature = "anthropic")]
pub mod anthropic;

#[cfg(feature = "gemini")]
pub mod gemini;

pub use config::{build_provider, ProviderConfig, ProviderKind};

#[cfg(feature = "openai")]
pub use openai::OpenAiProvider;

#[cfg(feature = "anthropic")]
pub use anthropic::AnthropicProvider;

#[cfg(feature = "gemini")]
pub use gemini::GeminiProvider;

// Re-export core types for convenience
pub use agent_core::{Agent, AgentBuilder, AgentError, LlmProvider, Message, Result, Role, Tool, ToolRegistry};
