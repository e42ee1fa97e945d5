//! List Directory Tool
//!
//! Lists the entries of a directory inside the analyzed tree.

use std::io::ErrorKind;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use agent_core::{
    tool::{DirEntry, EntryKind, ToolData},
    Result as CoreResult, Tool, ToolContext, ToolMetadata,
};

use super::{illegal_path, INVALID_ARGS};
use crate::sandbox;

const NAME: &str = "listDirectory";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Params {
    relative_original_path: String,
}

/// Tool for listing a directory
#[derive(Clone, Copy, Debug, Default)]
pub struct ListDirectoryTool;

#[async_trait]
impl Tool for ListDirectoryTool {
    fn metadata(&self) -> ToolMetadata {
        ToolMetadata::function(
            NAME,
            "List the files and folders in the given directory",
            json!({
                "type": "object",
                "properties": {
                    "relativeOriginalPath": {
                        "type": "string",
                        "description": "Path relative to the starting directory; an empty string means the root"
                    }
                },
                "required": ["relativeOriginalPath"],
                "additionalProperties": false
            }),
        )
    }

    async fn handle(&self, mut ctx: ToolContext<'_>) -> CoreResult<()> {
        let Some(params) = ctx.params::<Params>() else {
            ctx.respond_text(NAME, INVALID_ARGS);
            return Ok(());
        };
        let input = params.relative_original_path;

        let Some(target) = sandbox::resolve_within(ctx.cwd, &input) else {
            ctx.respond_text(NAME, illegal_path(&input));
            return Ok(());
        };

        debug!(path = %target.display(), "listing directory");
        match read_entries(&target).await {
            Ok(entries) => ctx.respond(NAME, ToolData::Entries(entries)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                ctx.respond_text(NAME, format!("Directory does not exist: {input}"));
            }
            Err(e) => ctx.respond_text(NAME, format!("Read failed: {e}")),
        }
        Ok(())
    }
}

/// Directory entries sorted by name; symlinks count as files
async fn read_entries(dir: &std::path::Path) -> std::io::Result<Vec<DirEntry>> {
    let mut reader = tokio::fs::read_dir(dir).await?;
    let mut entries = Vec::new();

    while let Some(entry) = reader.next_entry().await? {
        let kind = if entry.file_type().await?.is_dir() {
            EntryKind::Directory
        } else {
            EntryKind::File
        };
        entries.push(DirEntry {
            name: entry.file_name().to_string_lossy().into_owned(),
            kind,
        });
    }

    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}
