//! Read File Tool
//!
//! Returns the text of one file inside the analyzed tree, clipped to
//! [`MAX_FILE_CHARS`] characters.

use std::io::ErrorKind;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use agent_core::{Result as CoreResult, Tool, ToolContext, ToolMetadata};

use super::{illegal_path, INVALID_ARGS};
use crate::sandbox;

const NAME: &str = "readFile";

/// Characters returned before the content is clipped
pub const MAX_FILE_CHARS: usize = 5000;

const TRUNCATED_MARKER: &str = "\n...(content truncated)";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Params {
    relative_file_path: String,
}

/// Tool for reading a file
#[derive(Clone, Copy, Debug, Default)]
pub struct ReadFileTool;

/// Keep the first [`MAX_FILE_CHARS`] characters and mark the cut
fn clip(content: &str) -> String {
    match content.char_indices().nth(MAX_FILE_CHARS) {
        Some((cut, _)) => format!("{}{TRUNCATED_MARKER}", &content[..cut]),
        None => content.to_string(),
    }
}

#[async_trait]
impl Tool for ReadFileTool {
    fn metadata(&self) -> ToolMetadata {
        ToolMetadata::function(
            NAME,
            "Read the content of the given file (at most 5000 characters are returned)",
            json!({
                "type": "object",
                "properties": {
                    "relativeFilePath": {
                        "type": "string",
                        "description": "File path relative to the starting directory, e.g. README.md"
                    }
                },
                "required": ["relativeFilePath"],
                "additionalProperties": false
            }),
        )
    }

    async fn handle(&self, mut ctx: ToolContext<'_>) -> CoreResult<()> {
        let Some(params) = ctx.params::<Params>() else {
            ctx.respond_text(NAME, INVALID_ARGS);
            return Ok(());
        };
        let input = params.relative_file_path;

        let Some(target) = sandbox::resolve_within(ctx.cwd, &input) else {
            ctx.respond_text(NAME, illegal_path(&input));
            return Ok(());
        };

        debug!(path = %target.display(), "reading file");
        let text = match tokio::fs::read(&target).await {
            Ok(bytes) => clip(&String::from_utf8_lossy(&bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => format!("File not found: {input}"),
            Err(e) => format!("Read failed: {e}"),
        };
        ctx.respond_text(NAME, text);
        Ok(())
    }
}
