use crate::error::ToolError;
use serde_json::Value;
use std::path::PathBuf;

pub mod bash;
pub mod edit;
pub mod read;
pub mod write;

pub use bash::BashTool;
pub use edit::EditTool;
pub use read::ReadTool;
pub use write::WriteTool;

pub fn extract_string_arg<'a>(args: &'a Value, key: &str) -> Result<&'a str, ToolError> {
    args.get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| ToolError::InvalidArgument(format!("Missing '{key}' parameter.")))
}

/// Required `path` argument; must be present, non-empty and absolute.
pub fn extract_absolute_path(args: &Value) -> Result<PathBuf, ToolError> {
    let path = args
        .get("path")
        .and_then(|v| v.as_str())
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ToolError::InvalidArgument("Path parameter is required.".into()))?;

    let path = PathBuf::from(path);
    if !path.is_absolute() {
        return Err(ToolError::InvalidArgument(format!(
            "Path must be absolute. Received: {}",
            path.display()
        )));
    }

    Ok(path)
}
