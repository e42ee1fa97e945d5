//! Service Kit - Agent Tools
//!
//! The file-system and diagram tools offered to the model. Each implements
//! `agent_core::Tool`; failures the model can fix are answered inline.

mod list_directory;
mod read_file;
mod render_mermaid;

pub use list_directory::ListDirectoryTool;
pub use read_file::{ReadFileTool, MAX_FILE_CHARS};
pub use render_mermaid::RenderMermaidTool;

/// Answer for arguments that do not match the tool's schema
pub(crate) const INVALID_ARGS: &str = "invalid args";

/// Answer for paths that resolve outside the analyzed directory
pub(crate) fn illegal_path(input: &str) -> String {
    format!("Illegal path access: {input}")
}
