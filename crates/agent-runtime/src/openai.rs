//! OpenAI-compatible Chat Completions provider
//!
//! Near passthrough: the canonical model already is the Chat Completions
//! shape, so only the envelope fields are added. Also used for any
//! OpenAI-compatible host (SiliconFlow, Ollama's `/v1` endpoint, ...).

use std::time::Duration;

use agent_core::{
    error::Result,
    message::Message,
    provider::{ChatRequest, ChatResponse, LlmProvider, DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE},
    tool::ToolMetadata,
};
use async_trait::async_trait;
use serde::Serialize;

use crate::http::HttpClientBase;

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

/// Request body sent to `/chat/completions`
#[derive(Debug, Serialize)]
struct ChatCompletionsBody<'a> {
    model: &'a str,
    messages: &'a [Message],
    stream: bool,
    temperature: f64,
    max_tokens: u32,
    response_format: ResponseFormat,
    #[serde(skip_serializing_if = "<[_]>::is_empty")]
    tools: &'a [ToolMetadata],
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<&'static str>,
}

impl<'a> ChatCompletionsBody<'a> {
    fn new(request: ChatRequest<'a>) -> Self {
        Self {
            model: request.model,
            messages: request.messages,
            stream: false,
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            response_format: ResponseFormat { kind: "text" },
            tools: request.tools,
            tool_choice: (!request.tools.is_empty()).then_some("auto"),
        }
    }
}

/// OpenAI-compatible provider
pub struct OpenAiProvider {
    api_key: String,
    base: HttpClientBase,
}

impl OpenAiProvider {
    /// `endpoint` is the full chat completions URL
    pub fn new(api_key: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base: HttpClientBase::new("ChatCompletions", endpoint),
        }
    }

    /// Abort requests that take longer than `timeout`
    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.base.timeout = timeout;
        self
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn chat(&self, request: ChatRequest<'_>) -> Result<ChatResponse> {
        let body = ChatCompletionsBody::new(request);
        let bearer = format!("Bearer {}", self.api_key);
        self.base
            .post_json(&self.base.endpoint, &[("Authorization", bearer.as_str())], &body)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_body_with_tools() {
        let messages = [Message::user("hi")];
        let tools = [ToolMetadata::function("readFile", "Read a file", json!({"type": "object"}))];
        let body = ChatCompletionsBody::new(ChatRequest {
            model: "gpt-4o-mini",
            messages: &messages,
            tools: &tools,
        });

        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["model"], "gpt-4o-mini");
        assert_eq!(value["stream"], false);
        assert_eq!(value["max_tokens"], 4096);
        assert_eq!(value["tool_choice"], "auto");
        assert_eq!(value["response_format"], json!({"type": "text"}));
        assert_eq!(value["tools"][0]["function"]["name"], "readFile");
        assert_eq!(value["tools"][0]["function"]["strict"], false);
        assert_eq!(value["messages"][0], json!({"role": "user", "content": "hi"}));
    }

    #[test]
    fn test_body_without_tools() {
        let messages = [Message::user("hi")];
        let body = ChatCompletionsBody::new(ChatRequest {
            model: "m",
            messages: &messages,
            tools: &[],
        });

        let value = serde_json::to_value(&body).unwrap();
        assert!(value.get("tools").is_none());
        assert!(value.get("tool_choice").is_none());
    }
}
