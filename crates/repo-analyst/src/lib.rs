//! # repo-analyst
//!
//! Repository analysis profile for the agent: the sandboxed file-system
//! tools, a Mermaid diagram tool and the default report prompt.
//!
//! ## Tools
//!
//! ```text
//! ┌───────────────────┬──────────────────────────────────────────────┐
//! │ listDirectory     │ entries of a directory under the root        │
//! │ readFile          │ file text, clipped to 5000 characters        │
//! │ renderMermaid     │ normalized ```mermaid block from a structure │
//! └───────────────────┴──────────────────────────────────────────────┘
//! ```
//!
//! Paths are resolved against the analyzed directory and rejected when they
//! leave it; see [`sandbox`].

pub mod mermaid;
pub mod sandbox;
pub mod svckit;

use agent_core::ToolRegistry;

/// Re-export tools for easy registration
pub mod tools {
    pub use crate::svckit::{ListDirectoryTool, ReadFileTool, RenderMermaidTool};
}

/// Registry with every analysis tool, in the order they are offered
pub fn standard_tools() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(tools::ListDirectoryTool);
    registry.register(tools::ReadFileTool);
    registry.register(tools::RenderMermaidTool);
    registry
}

/// System prompt of the default analysis profile
pub const DEFAULT_SYSTEM_PROMPT: &str = r"You are a project analysis expert. You must use the tools (listDirectory/readFile) to look at directories and files before summarizing.

Core goal: produce a technical report that is actionable, traceable and reviewable.

Hard rules:
- Start with listDirectory('') to see the root directory.
- Only read files that exist; if one does not, pick another instead of guessing.
- Read in this order of priority: package.json -> README* -> the src entry file.
- When citing a fact, name the file path (for example: `src/index.ts`).
- Do not invent commands, files or dependencies that do not exist.

Output contract (Markdown; these headings must all appear, in this order):
## Overview
## EntryPoints
## CommandsAndScripts
## KeyDirectories
## KeyModules
## DataFlow
## RisksAndUnknowns
## SuggestedNextSteps

Strict constraints:
- Output every heading above; do not rename or skip any.
- Each section has at least 2 bullet points (Unknown counts, but say which file would have to be read to settle it).";

/// Style lines appended to the default system prompt
pub const DEFAULT_EXTENSIONS: &[&str] = &[
    "Style: concise, technical, reviewable. Use lists wherever possible.",
    "For unknown information: write Unknown and say which file would have to be read to confirm it.",
    "Do not output any chit-chat unrelated to this analysis.",
];
