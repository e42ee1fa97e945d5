//! # agent-core
//!
//! Provider-agnostic tool-calling agent loop for repository analysis.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                          Agent                               │
//! │  ┌─────────────┐  ┌─────────────┐  ┌──────────────────────┐  │
//! │  │  Reasoning  │  │    Tools    │  │   LlmProvider        │  │
//! │  │    Loop     │──│   Registry  │──│   (Strategy)         │  │
//! │  └─────────────┘  └─────────────┘  └──────────────────────┘  │
//! │         │                                                    │
//! │  ┌─────────────┐                                             │
//! │  │  Fallback   │  <tool_call> markup in the reasoning channel│
//! │  │  Extraction │                                             │
//! │  └─────────────┘                                             │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every provider speaks the canonical Chat Completions shape defined in
//! [`message`] and [`provider`]; adapters for other vendors live in
//! `agent-runtime`.

pub mod error;
pub mod extract;
pub mod message;
pub mod provider;
pub mod reasoning;
pub mod tool;

pub use error::{AgentError, Result};
pub use extract::parse_tool_calls;
pub use message::{Message, MessageContent, Role};
pub use provider::{ChatRequest, ChatResponse, LlmProvider};
pub use reasoning::{run_agent, Agent, AgentBuilder, AgentConfig};
pub use tool::{Tool, ToolCall, ToolContext, ToolData, ToolMetadata, ToolRegistry, ToolResult};
