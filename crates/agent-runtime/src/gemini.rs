//! Google Gemini generateContent provider
//!
//! System messages become `systemInstruction`, assistant turns use the
//! `model` role, tool calls travel as `functionCall` parts and tool results
//! as `functionResponse` parts. Gemini has no call ids, so the response side
//! numbers calls `call_0`, `call_1`, ... per response.

use std::time::Duration;

use agent_core::{
    error::Result,
    message::{Message, Role},
    provider::{ChatRequest, ChatResponse, LlmProvider, DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE},
    tool::{ToolCall, ToolMetadata},
};
use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::http::HttpClientBase;

/// Characters left alone when encoding a URL component
const URL_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FunctionCallPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FunctionResponsePart {
    pub name: String,
    pub response: Value,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_call: Option<FunctionCallPart>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_response: Option<FunctionResponsePart>,
}

impl GeminiPart {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GeminiContent {
    pub role: &'static str,
    pub parts: Vec<GeminiPart>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SystemInstruction {
    pub parts: Vec<GeminiPart>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f64,
    pub max_output_tokens: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FunctionDeclaration {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub parameters: Value,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiTool {
    pub function_declarations: Vec<FunctionDeclaration>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionCallingConfig {
    pub mode: &'static str,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolConfig {
    pub function_calling_config: FunctionCallingConfig,
}

/// generateContent request body
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiRequest {
    pub contents: Vec<GeminiContent>,
    pub generation_config: GenerationConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<SystemInstruction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<GeminiTool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_config: Option<ToolConfig>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<GeminiPart>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<CandidateContent>,
}

/// generateContent response, reduced to what the agent reads
#[derive(Clone, Debug, Default, Deserialize)]
pub struct GeminiResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

/// Substitute the `{model}` placeholder with the encoded model id
pub fn resolve_endpoint(endpoint: &str, model: &str) -> String {
    if endpoint.contains("{model}") {
        let encoded = utf8_percent_encode(model, URL_COMPONENT).to_string();
        endpoint.replacen("{model}", &encoded, 1)
    } else {
        endpoint.to_string()
    }
}

fn to_gemini_tools(tools: &[ToolMetadata]) -> Option<Vec<GeminiTool>> {
    let declarations: Vec<FunctionDeclaration> = tools
        .iter()
        .filter(|t| !t.function.name.is_empty())
        .map(|t| FunctionDeclaration {
            name: t.function.name.clone(),
            description: t.function.description.clone(),
            parameters: t.function.parameters.clone(),
        })
        .collect();

    (!declarations.is_empty()).then(|| {
        vec![GeminiTool {
            function_declarations: declarations,
        }]
    })
}

fn call_part(call: &ToolCall) -> Option<GeminiPart> {
    let name = call.tool_name()?;
    Some(GeminiPart {
        function_call: Some(FunctionCallPart {
            name: Some(name.to_string()),
            args: Some(Value::Object(call.resolve_args())),
        }),
        ..GeminiPart::default()
    })
}

/// Build the full request body
pub fn to_gemini_request(messages: &[Message], tools: &[ToolMetadata]) -> GeminiRequest {
    let mut system_parts: Vec<String> = Vec::new();
    let mut contents = Vec::with_capacity(messages.len());

    for message in messages {
        let text = message.content.as_ref().map(|c| c.join_text("")).unwrap_or_default();

        match message.role {
            Role::System => {
                let text = text.trim();
                if !text.is_empty() {
                    system_parts.push(text.to_string());
                }
            }
            Role::Tool => {
                let mut response = Map::new();
                response.insert("content".into(), Value::String(text));
                contents.push(GeminiContent {
                    role: "user",
                    parts: vec![GeminiPart {
                        function_response: Some(FunctionResponsePart {
                            name: message.name.clone().filter(|n| !n.is_empty()).unwrap_or_else(|| "tool".into()),
                            response: Value::Object(response),
                        }),
                        ..GeminiPart::default()
                    }],
                });
            }
            Role::User | Role::Assistant => {
                let mut parts = Vec::new();
                if !text.is_empty() {
                    parts.push(GeminiPart::text(text));
                }
                parts.extend(message.tool_calls.iter().flatten().filter_map(call_part));

                // A turn with nothing to say is skipped entirely.
                if !parts.is_empty() {
                    contents.push(GeminiContent {
                        role: if message.role == Role::Assistant { "model" } else { "user" },
                        parts,
                    });
                }
            }
        }
    }

    let tools = to_gemini_tools(tools);
    let tool_config = tools.as_ref().map(|_| ToolConfig {
        function_calling_config: FunctionCallingConfig { mode: "AUTO" },
    });

    GeminiRequest {
        contents,
        generation_config: GenerationConfig {
            temperature: DEFAULT_TEMPERATURE,
            max_output_tokens: DEFAULT_MAX_TOKENS,
        },
        system_instruction: (!system_parts.is_empty()).then(|| SystemInstruction {
            parts: vec![GeminiPart::text(system_parts.join("\n"))],
        }),
        tools,
        tool_config,
    }
}

/// Convert the first candidate into the canonical response
pub fn from_gemini_response(response: &GeminiResponse) -> ChatResponse {
    let parts = response
        .candidates
        .first()
        .and_then(|c| c.content.as_ref())
        .map_or(&[][..], |c| c.parts.as_slice());

    let mut text = String::new();
    let mut tool_calls = Vec::new();

    for part in parts {
        if let Some(chunk) = &part.text {
            text.push_str(chunk);
        }
        let Some(call) = &part.function_call else {
            continue;
        };
        let Some(name) = call.name.as_deref().filter(|n| !n.is_empty()) else {
            continue;
        };
        let args = call.args.clone().unwrap_or_else(|| Value::Object(Map::new()));
        tool_calls.push(ToolCall::function(
            Some(format!("call_{}", tool_calls.len())),
            name,
            args.to_string(),
        ));
    }

    let mut message = Message::assistant(text);
    if !tool_calls.is_empty() {
        message = message.with_tool_calls(tool_calls);
    }
    ChatResponse::from_message(message)
}

/// Gemini generateContent provider
pub struct GeminiProvider {
    api_key: String,
    base: HttpClientBase,
}

impl GeminiProvider {
    /// `endpoint` may contain a `{model}` placeholder
    pub fn new(api_key: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base: HttpClientBase::new("Gemini generateContent", endpoint),
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.base.timeout = timeout;
        self
    }
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    fn name(&self) -> &str {
        "google"
    }

    async fn chat(&self, request: ChatRequest<'_>) -> Result<ChatResponse> {
        let url = resolve_endpoint(&self.base.endpoint, request.model);
        let body = to_gemini_request(request.messages, request.tools);
        let response: GeminiResponse = self
            .base
            .post_json(&url, &[("x-goog-api-key", self.api_key.as_str())], &body)
            .await?;
        Ok(from_gemini_response(&response))
    }
}
