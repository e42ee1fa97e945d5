//! Anthropic Messages provider
//!
//! Translates the canonical transcript into the Messages API shape and the
//! answer back into a Chat Completions response.
//!
//! ## Mapping
//!
//! | canonical            | Messages API                                   |
//! |----------------------|------------------------------------------------|
//! | `system` messages    | top-level `system`, joined by a blank line     |
//! | `tool` message       | `user` turn with one `tool_result` block       |
//! | assistant tool calls | `tool_use` blocks after an optional text block |
//! | `user` message       | plain text                                     |

use std::time::Duration;

use agent_core::{
    error::Result,
    message::{Message, Role},
    provider::{ChatRequest, ChatResponse, LlmProvider, DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE},
    tool::{ToolCall, ToolMetadata},
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::http::HttpClientBase;

/// Default `anthropic-version` header value
pub const DEFAULT_ANTHROPIC_VERSION: &str = "2023-06-01";

/// Tool declaration in Messages API form
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AnthropicTool {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub input_schema: Value,
}

/// Request content block
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: Map<String, Value>,
    },
    ToolResult {
        tool_use_id: String,
        content: String,
    },
}

/// Message body: plain text or blocks
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AnthropicContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AnthropicMessage {
    pub role: &'static str,
    pub content: AnthropicContent,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ToolChoice {
    #[serde(rename = "type")]
    pub kind: &'static str,
}

/// Full Messages API request body
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AnthropicRequest {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    pub messages: Vec<AnthropicMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<AnthropicTool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<ToolChoice>,
}

/// Response content block; unknown block types keep all fields empty
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ResponseBlock {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub input: Option<Value>,
}

/// Messages API response, reduced to what the agent reads
#[derive(Clone, Debug, Default, Deserialize)]
pub struct AnthropicResponse {
    #[serde(default)]
    pub content: Vec<ResponseBlock>,
}

/// Only callable functions with a name survive
pub fn to_anthropic_tools(tools: &[ToolMetadata]) -> Vec<AnthropicTool> {
    tools
        .iter()
        .filter(|t| t.is_callable_function())
        .map(|t| AnthropicTool {
            name: t.function.name.clone(),
            description: t.function.description.clone(),
            input_schema: t.function.parameters.clone(),
        })
        .collect()
}

fn assistant_blocks(message: &Message) -> Vec<ContentBlock> {
    let mut blocks = Vec::new();

    let text = message.text();
    let text = text.trim();
    if !text.is_empty() {
        blocks.push(ContentBlock::Text { text: text.to_string() });
    }

    for call in message.tool_calls.iter().flatten() {
        let Some(name) = call.tool_name() else {
            continue;
        };
        blocks.push(ContentBlock::ToolUse {
            id: call.id.clone().unwrap_or_default(),
            name: name.to_string(),
            input: call.resolve_args(),
        });
    }

    blocks
}

/// Split a canonical transcript into `system` plus Messages API turns
pub fn to_anthropic_messages(messages: &[Message]) -> (Option<String>, Vec<AnthropicMessage>) {
    let mut system_parts = Vec::new();
    let mut out = Vec::with_capacity(messages.len());

    for message in messages {
        match message.role {
            Role::System => {
                let text = message.text();
                let text = text.trim();
                if !text.is_empty() {
                    system_parts.push(text.to_string());
                }
            }
            Role::Tool => out.push(AnthropicMessage {
                role: "user",
                content: AnthropicContent::Blocks(vec![ContentBlock::ToolResult {
                    tool_use_id: message.tool_call_id.clone().unwrap_or_default(),
                    content: message.text(),
                }]),
            }),
            Role::Assistant => {
                let blocks = assistant_blocks(message);
                out.push(AnthropicMessage {
                    role: "assistant",
                    content: if blocks.is_empty() {
                        AnthropicContent::Text(String::new())
                    } else {
                        AnthropicContent::Blocks(blocks)
                    },
                });
            }
            Role::User => out.push(AnthropicMessage {
                role: "user",
                content: AnthropicContent::Text(message.text()),
            }),
        }
    }

    let system = (!system_parts.is_empty()).then(|| system_parts.join("\n\n"));
    (system, out)
}

/// Build the full request body
pub fn to_anthropic_request(request: ChatRequest<'_>) -> AnthropicRequest {
    let (system, messages) = to_anthropic_messages(request.messages);
    let tools = to_anthropic_tools(request.tools);
    let tool_choice = (!tools.is_empty()).then_some(ToolChoice { kind: "auto" });

    AnthropicRequest {
        model: request.model.to_string(),
        max_tokens: DEFAULT_MAX_TOKENS,
        temperature: DEFAULT_TEMPERATURE,
        system,
        messages,
        tools,
        tool_choice,
    }
}

/// Convert a Messages API answer into the canonical response
pub fn from_anthropic_response(response: &AnthropicResponse) -> ChatResponse {
    let text = response
        .content
        .iter()
        .filter(|b| b.kind.as_deref() == Some("text"))
        .map(|b| b.text.as_deref().unwrap_or(""))
        .collect::<Vec<_>>()
        .join("\n");

    let tool_calls: Vec<ToolCall> = response
        .content
        .iter()
        .filter(|b| b.kind.as_deref() == Some("tool_use"))
        .filter_map(|b| {
            let name = b.name.as_deref().filter(|n| !n.is_empty())?;
            let id = b.id.clone().filter(|id| !id.is_empty())?;
            let input = b.input.clone().unwrap_or_else(|| Value::Object(Map::new()));
            Some(ToolCall::function(Some(id), name, input.to_string()))
        })
        .collect();

    let mut message = Message::assistant(text);
    if !tool_calls.is_empty() {
        message = message.with_tool_calls(tool_calls);
    }
    ChatResponse::from_message(message)
}

/// Anthropic Messages API provider
pub struct AnthropicProvider {
    api_key: String,
    version: String,
    base: HttpClientBase,
}

impl AnthropicProvider {
    /// `endpoint` is the full `/v1/messages` URL
    pub fn new(api_key: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            version: DEFAULT_ANTHROPIC_VERSION.into(),
            base: HttpClientBase::new("Anthropic Messages", endpoint),
        }
    }

    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.base.timeout = timeout;
        self
    }
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn chat(&self, request: ChatRequest<'_>) -> Result<ChatResponse> {
        let body = to_anthropic_request(request);
        let headers = [
            ("x-api-key", self.api_key.as_str()),
            ("anthropic-version", self.version.as_str()),
        ];
        let response: AnthropicResponse = self.base.post_json(&self.base.endpoint, &headers, &body).await?;
        Ok(from_anthropic_response(&response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn decode(value: Value) -> AnthropicResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_round_trip() {
        let messages = vec![
            Message::system("You analyze repositories."),
            Message::user("Analyze directory: /tmp/project"),
            Message::tool("[]", "toolu_01", "listDirectory"),
        ];
        let (system, out) = to_anthropic_messages(&messages);

        assert_eq!(system.as_deref(), Some("You analyze repositories."));
        let value = serde_json::to_value(&out).unwrap();
        assert_eq!(value[1]["role"], "user");
        assert_eq!(value[1]["content"][0]["type"], "tool_result");
        assert_eq!(value[1]["content"][0]["tool_use_id"], "toolu_01");
        assert_eq!(value[1]["content"][0]["content"], "[]");

        let response = from_anthropic_response(&decode(json!({
            "id": "msg_1",
            "type": "message",
            "content": [
                {"type": "tool_use", "id": "toolu_02", "name": "listDirectory", "input": {"relativeOriginalPath": "src"}}
            ]
        })));
        let message = response.first_message().unwrap();
        let calls = message.native_tool_calls().unwrap();
        assert_eq!(calls[0].tool_name(), Some("listDirectory"));
        assert_eq!(calls[0].resolve_args()["relativeOriginalPath"], "src");
    }

    #[test]
    fn test_system_messages_joined_and_blank_dropped() {
        let messages = vec![Message::system(" first "), Message::system("   "), Message::system("second")];
        let (system, out) = to_anthropic_messages(&messages);
        assert_eq!(system.as_deref(), Some("first\n\nsecond"));
        assert!(out.is_empty());

        let (system, _) = to_anthropic_messages(&[Message::user("x")]);
        assert!(system.is_none());
    }

    #[test]
    fn test_assistant_blocks() {
        let with_calls = Message::assistant("  let me look  ").with_tool_calls(vec![
            ToolCall::function(Some("t1".into()), "readFile", r#"{"relativeFilePath":"a"}"#),
            ToolCall::function(Some("t2".into()), "", "{}"),
            ToolCall::function(None, "listDirectory", "not json"),
        ]);
        let (_, out) = to_anthropic_messages(&[with_calls, Message::assistant("")]);
        let value = serde_json::to_value(&out).unwrap();

        assert_eq!(
            value[0]["content"],
            json!([
                {"type": "text", "text": "let me look"},
                {"type": "tool_use", "id": "t1", "name": "readFile", "input": {"relativeFilePath": "a"}},
                {"type": "tool_use", "id": "", "name": "listDirectory", "input": {}}
            ])
        );
        assert_eq!(value[1]["content"], "");
    }

    #[test]
    fn test_request_tools_only_when_present() {
        let messages = [Message::user("hi")];
        let tools = [
            ToolMetadata::function("readFile", "Read", json!({"type": "object"})),
            ToolMetadata::function("", "nameless", json!({})),
        ];

        let with_tools = serde_json::to_value(to_anthropic_request(ChatRequest {
            model: "claude",
            messages: &messages,
            tools: &tools,
        }))
        .unwrap();
        assert_eq!(with_tools["max_tokens"], 4096);
        assert_eq!(with_tools["tools"].as_array().unwrap().len(), 1);
        assert_eq!(with_tools["tools"][0]["input_schema"], json!({"type": "object"}));
        assert_eq!(with_tools["tool_choice"], json!({"type": "auto"}));
        assert!(with_tools.get("system").is_none());

        let without = serde_json::to_value(to_anthropic_request(ChatRequest {
            model: "claude",
            messages: &messages,
            tools: &[],
        }))
        .unwrap();
        assert!(without.get("tools").is_none());
        assert!(without.get("tool_choice").is_none());
    }

    #[test]
    fn test_response_text_and_dropped_calls() {
        let response = from_anthropic_response(&decode(json!({
            "content": [
                {"type": "text", "text": "one"},
                {"type": "tool_use", "name": "readFile", "input": {}},
                {"type": "tool_use", "id": "x", "input": {}},
                {"type": "text", "text": "two"}
            ]
        })));
        let message = response.first_message().unwrap();
        assert_eq!(message.text(), "one\ntwo");
        assert!(message.tool_calls.is_none());
    }

    #[test]
    fn test_response_missing_input_is_empty_object() {
        let response = from_anthropic_response(&decode(json!({
            "content": [{"type": "tool_use", "id": "t", "name": "listDirectory"}]
        })));
        let calls = response.first_message().unwrap().native_tool_calls().unwrap().to_vec();
        assert_eq!(calls[0].raw_arguments(), Some(&Value::String("{}".into())));
    }
}
