//! Tool System
//!
//! Canonical tool metadata, tool calls and results, plus the registry the
//! agent loop dispatches through. Tools never see provider wire formats.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use crate::error::{AgentError, Result};
use crate::message::Message;

/// Function half of an OpenAI-shaped tool call
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// JSON-encoded string on the wire, occasionally a bare object
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Value>,
}

/// Tool call request from the LLM
///
/// Accepts both the Chat Completions shape (`{id, type, function: {name,
/// arguments}}`) and the flat `{id, name, args}` shape produced by the
/// fallback extractor.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Optional call ID for tracking
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function: Option<FunctionCall>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<Value>,
}

impl ToolCall {
    /// Chat Completions style call with JSON-encoded arguments
    pub fn function(id: Option<String>, name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            id,
            kind: Some("function".into()),
            function: Some(FunctionCall {
                name: Some(name.into()),
                arguments: Some(Value::String(arguments.into())),
            }),
            name: None,
            args: None,
        }
    }

    /// Flat call with already structured arguments
    pub fn named(name: impl Into<String>, args: Map<String, Value>) -> Self {
        Self {
            name: Some(name.into()),
            args: Some(Value::Object(args)),
            ..Default::default()
        }
    }

    /// Resolved tool name; `function.name` wins over `name`, empty is none
    pub fn tool_name(&self) -> Option<&str> {
        self.function
            .as_ref()
            .and_then(|f| f.name.as_deref())
            .or(self.name.as_deref())
            .filter(|name| !name.is_empty())
    }

    /// Raw arguments; `function.arguments` wins over `args`
    pub fn raw_arguments(&self) -> Option<&Value> {
        self.function
            .as_ref()
            .and_then(|f| f.arguments.as_ref())
            .or(self.args.as_ref())
    }

    /// Arguments as a key/value object
    ///
    /// A JSON string is decoded; anything that is not an object ends up as
    /// `{}`. Only an undecodable string is an error.
    pub fn parse_args(&self) -> std::result::Result<Map<String, Value>, serde_json::Error> {
        match self.raw_arguments() {
            Some(Value::String(raw)) if raw.is_empty() => Ok(Map::new()),
            Some(Value::String(raw)) => match serde_json::from_str::<Value>(raw)? {
                Value::Object(map) => Ok(map),
                _ => Ok(Map::new()),
            },
            Some(Value::Object(map)) => Ok(map.clone()),
            _ => Ok(Map::new()),
        }
    }

    /// Like [`ToolCall::parse_args`] but any failure resolves to `{}`
    pub fn resolve_args(&self) -> Map<String, Value> {
        self.parse_args().unwrap_or_default()
    }
}

/// Function descriptor inside [`ToolMetadata`]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FunctionSpec {
    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// JSON Schema of accepted arguments
    #[serde(default)]
    pub parameters: Value,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strict: Option<bool>,
}

/// Tool definition in Chat Completions shape (`{type: "function", function}`)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolMetadata {
    #[serde(rename = "type")]
    pub kind: String,

    pub function: FunctionSpec,
}

impl ToolMetadata {
    pub fn function(name: impl Into<String>, description: impl Into<String>, parameters: Value) -> Self {
        Self {
            kind: "function".into(),
            function: FunctionSpec {
                name: name.into(),
                description: Some(description.into()),
                parameters,
                strict: Some(false),
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.function.name
    }

    /// Function tool with a usable name
    pub fn is_callable_function(&self) -> bool {
        self.kind == "function" && !self.function.name.is_empty()
    }
}

/// Kind of a directory entry
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
}

/// One row of a directory listing
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirEntry {
    pub name: String,

    #[serde(rename = "type")]
    pub kind: EntryKind,
}

/// Payload of a [`ToolResult`]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ToolData {
    Entries(Vec<DirEntry>),
    Text(String),
}

impl ToolData {
    /// Text form used as the tool message content
    pub fn to_content(&self) -> String {
        match self {
            ToolData::Entries(entries) => serde_json::to_string(entries).unwrap_or_default(),
            ToolData::Text(text) => text.clone(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ToolData::Text(text) => Some(text),
            ToolData::Entries(_) => None,
        }
    }
}

/// Result from tool execution, tagged by tool name
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub tool: String,
    pub data: ToolData,
}

impl ToolResult {
    pub fn text(tool: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            data: ToolData::Text(text.into()),
        }
    }
}

/// Everything a handler gets for one invocation
pub struct ToolContext<'a> {
    /// Results of the current iteration
    pub tool_results: &'a mut Vec<ToolResult>,
    /// Resolved arguments
    pub args: Map<String, Value>,
    /// The run's transcript
    pub messages: &'a mut Vec<Message>,
    /// Directory under analysis
    pub cwd: &'a Path,
    /// The originating call
    pub call: &'a ToolCall,
}

impl ToolContext<'_> {
    /// Record `data` both as a [`ToolResult`] and as a `tool` message
    pub fn respond(&mut self, tool: &str, data: ToolData) {
        let content = data.to_content();
        self.tool_results.push(ToolResult {
            tool: tool.to_string(),
            data,
        });
        self.messages.push(Message::tool(
            content,
            self.call.id.clone().unwrap_or_default(),
            tool,
        ));
    }

    /// Shorthand for a textual response
    pub fn respond_text(&mut self, tool: &str, text: impl Into<String>) {
        self.respond(tool, ToolData::Text(text.into()));
    }

    /// Deserialize the arguments into a typed parameter struct
    pub fn params<T: serde::de::DeserializeOwned>(&self) -> Option<T> {
        serde_json::from_value(Value::Object(self.args.clone())).ok()
    }
}

/// Tool trait - implement to add new capabilities
#[async_trait]
pub trait Tool: Send + Sync {
    /// Get the tool's metadata for LLM function calling
    fn metadata(&self) -> ToolMetadata;

    /// Execute the tool; the handler appends its own result and tool message
    async fn handle(&self, ctx: ToolContext<'_>) -> Result<()>;
}

/// Registry for available tools, kept in registration order
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new tool; a tool with the same name is replaced
    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        self.register_boxed(Arc::new(tool));
    }

    /// Register a shared tool
    pub fn register_boxed(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.metadata().function.name;
        match self.index.get(&name) {
            Some(&slot) => self.tools[slot] = tool,
            None => {
                self.index.insert(name, self.tools.len());
                self.tools.push(tool);
            }
        }
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.index.get(name).map(|&slot| self.tools[slot].clone())
    }

    /// Execute a tool by name
    pub async fn execute(&self, name: &str, ctx: ToolContext<'_>) -> Result<()> {
        let tool = self
            .get(name)
            .ok_or_else(|| AgentError::ToolNotFound(name.to_string()))?;
        tool.handle(ctx).await
    }

    /// Metadata of every tool, in registration order
    pub fn metadata(&self) -> Vec<ToolMetadata> {
        self.tools.iter().map(|t| t.metadata()).collect()
    }

    /// Get tool names
    pub fn names(&self) -> Vec<String> {
        self.tools.iter().map(|t| t.metadata().function.name).collect()
    }

    /// Number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
