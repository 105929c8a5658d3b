use crate::ast::Workspace;
use crate::codegen::{generate_workspace_with_options, CodegenOptions};
use crate::serialization::{parse_workspace, workspace_to_json, WorkspaceError};
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Opens the trailing block-state literal. The document stays one valid
/// script because the JSON sits inside a triple-quoted string.
pub const DATA_MARKER: &str = "\"\"\"### BLOCKLY_DATA ###";
const DATA_CLOSE: &str = "\"\"\"";

/// A script file split into its parts.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub source: String,
    /// `None` for hand-written scripts that carry no block state.
    pub workspace: Option<Workspace>,
}

/// Splits at the last marker. Serialized JSON escapes every quote, so the
/// marker can only repeat earlier, inside generated comments.
pub fn split_document(raw: &str) -> Result<Document, WorkspaceError> {
    let Some((source, data)) = raw.rsplit_once(DATA_MARKER) else {
        return Ok(Document {
            source: raw.to_string(),
            workspace: None,
        });
    };
    let data = data.trim_end();
    let data = data.strip_suffix(DATA_CLOSE).unwrap_or(data).trim();
    Ok(Document {
        source: source.strip_suffix("\n\n").unwrap_or(source).to_string(),
        workspace: Some(parse_workspace(data)?),
    })
}

pub fn render_document(source: &str, workspace: &Workspace) -> String {
    let json = workspace_to_json(workspace);
    format!("{}\n\n{}\n{}\n{}", source, DATA_MARKER, json, DATA_CLOSE)
}

pub fn read_document(path: &Path) -> Result<Document> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read '{}'.", path.display()))?;
    split_document(&raw).with_context(|| format!("Invalid block data in '{}'.", path.display()))
}

/// Generates source for `workspace` and persists source plus block state.
/// Returns the generated source.
pub fn write_document(path: &Path, workspace: &Workspace, options: &CodegenOptions) -> Result<String> {
    let source = generate_workspace_with_options(workspace, options);
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, render_document(&source, workspace))
        .with_context(|| format!("Failed to write '{}'.", path.display()))?;
    tracing::info!("wrote '{}' ({} bytes of source)", path.display(), source.len());
    Ok(source)
}

/// Rebuilds the source half of an existing document from its block state.
pub fn regenerate_document(path: &Path, options: &CodegenOptions) -> Result<String> {
    let document = read_document(path)?;
    let workspace = document.workspace.with_context(|| {
        format!(
            "'{}' has no block data; it cannot be regenerated.",
            path.display()
        )
    })?;
    write_document(path, &workspace, options)
}
