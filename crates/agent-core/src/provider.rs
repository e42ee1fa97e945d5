//! LLM Provider Strategy Pattern
//!
//! Every backend (OpenAI-compatible, Anthropic, Gemini) implements
//! [`LlmProvider`] over the canonical Chat Completions shape, so the agent
//! loop is written once and never sees a vendor wire format.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use agent_core::provider::{ChatRequest, LlmProvider};
//!
//! let response = provider
//!     .chat(ChatRequest { model: "gpt-4o", messages: &transcript, tools: &tools })
//!     .await?;
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::message::Message;
use crate::tool::ToolMetadata;

/// Sampling temperature every adapter sends
pub const DEFAULT_TEMPERATURE: f64 = 0.7;

/// Completion token cap every adapter sends
pub const DEFAULT_MAX_TOKENS: u32 = 4096;

/// One chat turn: full transcript plus the tools offered this turn
///
/// An empty `tools` slice means tools are disabled for the turn.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [Message],
    pub tools: &'a [ToolMetadata],
}

/// One entry of [`ChatResponse::choices`]
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Message>,
}

/// Canonical response, whatever the real provider was
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
}

impl ChatResponse {
    /// Wrap a single assistant message
    pub fn from_message(message: Message) -> Self {
        Self {
            choices: vec![Choice {
                message: Some(message),
            }],
        }
    }

    /// Message of the first choice
    pub fn first_message(&self) -> Option<&Message> {
        self.choices.first().and_then(|c| c.message.as_ref())
    }
}

/// Strategy trait for LLM providers
///
/// Implement this trait to add support for new LLM backends.
/// The agent works exclusively through this interface. One call is one
/// outbound HTTP request; a non-success status is an error.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Human-readable provider name used in logs and errors
    fn name(&self) -> &str;

    /// Run one chat turn
    async fn chat(&self, request: ChatRequest<'_>) -> Result<ChatResponse>;
}
