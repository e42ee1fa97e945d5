//! Render Mermaid Tool

use async_trait::async_trait;
use serde_json::{json, Value};

use agent_core::{Result as CoreResult, Tool, ToolContext, ToolMetadata};

use super::INVALID_ARGS;
use crate::mermaid::{self, Diagram};

const NAME: &str = "renderMermaid";

/// Tool that turns a diagram description into a fenced Mermaid block
#[derive(Clone, Copy, Debug, Default)]
pub struct RenderMermaidTool;

fn labelled_items() -> Value {
    json!({
        "type": "array",
        "items": {
            "type": "object",
            "properties": {"id": {"type": "string"}, "label": {"type": "string"}},
            "required": ["label"]
        }
    })
}

fn parameters() -> Value {
    json!({
        "type": "object",
        "properties": {
            "template": {"type": "string", "description": "Diagram type: flowchart | sequence | state | class"},
            "direction": {"type": "string", "description": "Flowchart direction: TB/TD/BT/LR/RL"},
            "title": {"type": "string"},
            "nodes": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "id": {"type": "string"},
                        "label": {"type": "string"},
                        "shape": {"type": "string"}
                    },
                    "required": ["label"]
                }
            },
            "edges": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "from": {"type": "string"},
                        "to": {"type": "string"},
                        "label": {"type": "string"},
                        "arrow": {"type": "string"}
                    },
                    "required": ["from", "to"]
                }
            },
            "participants": labelled_items(),
            "messages": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "from": {"type": "string"},
                        "to": {"type": "string"},
                        "label": {"type": "string"},
                        "arrow": {"type": "string"}
                    },
                    "required": ["from", "to", "label"]
                }
            },
            "states": labelled_items(),
            "transitions": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "from": {"type": "string"},
                        "to": {"type": "string"},
                        "label": {"type": "string"}
                    },
                    "required": ["from", "to"]
                }
            },
            "classes": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "id": {"type": "string"},
                        "label": {"type": "string"},
                        "fields": {"type": "array", "items": {"type": "string"}},
                        "methods": {"type": "array", "items": {"type": "string"}}
                    },
                    "required": ["label"]
                }
            }
        },
        "required": ["template"],
        "additionalProperties": false
    })
}

#[async_trait]
impl Tool for RenderMermaidTool {
    fn metadata(&self) -> ToolMetadata {
        ToolMetadata::function(NAME, "Generate a normalized Mermaid code block from parameters", parameters())
    }

    async fn handle(&self, mut ctx: ToolContext<'_>) -> CoreResult<()> {
        match ctx.params::<Diagram>() {
            Some(diagram) => ctx.respond_text(NAME, mermaid::render_block(&diagram)),
            None => ctx.respond_text(NAME, INVALID_ARGS),
        }
        Ok(())
    }
}
