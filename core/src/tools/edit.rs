use crate::error::ToolError;
use crate::tools::{extract_absolute_path, extract_string_arg};
use crate::traits::{Tool, ToolResult};
use async_trait::async_trait;
use serde_json::json;

const PREVIEW_CHARS: usize = 100;

/// Replaces exactly one occurrence of a string in an existing file.
#[derive(Debug, Default)]
pub struct EditTool;

impl EditTool {
    pub fn new() -> Self {
        Self
    }

    async fn edit(&self, args: &serde_json::Value) -> Result<String, ToolError> {
        let path = extract_absolute_path(args)?;
        let old_str = extract_string_arg(args, "old_str")?;
        let new_str = extract_string_arg(args, "new_str")?;

        if old_str.is_empty() {
            return Err(ToolError::InvalidArgument(
                "old_str must not be empty.".into(),
            ));
        }

        let metadata = tokio::fs::metadata(&path)
            .await
            .map_err(|e| ToolError::from_io(&path, e))?;
        if !metadata.is_file() {
            return Err(ToolError::NotAFile(path));
        }

        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| ToolError::from_io(&path, e))?;
        let content = String::from_utf8(bytes).map_err(|_| ToolError::DecodeError(path.clone()))?;

        match content.matches(old_str).count() {
            0 => Err(ToolError::StringNotFound {
                preview: preview(old_str),
            }),
            1 => {
                let updated = content.replacen(old_str, new_str, 1);
                tokio::fs::write(&path, updated)
                    .await
                    .map_err(|e| ToolError::from_io(&path, e))?;
                Ok(format!("Successfully edited file: {}", path.display()))
            }
            count => Err(ToolError::AmbiguousMatch { count }),
        }
    }
}

fn preview(text: &str) -> String {
    if text.chars().count() > PREVIEW_CHARS {
        let head: String = text.chars().take(PREVIEW_CHARS).collect();
        format!("{head}...")
    } else {
        text.to_string()
    }
}

#[async_trait]
impl Tool for EditTool {
    fn name(&self) -> &str {
        "Edit"
    }

    fn description(&self) -> &str {
        "Edit an existing file by replacing a specific string with new content."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "The absolute path to the file to edit."
                },
                "old_str": {
                    "type": "string",
                    "description": "The exact string to find and replace. Must be unique in the file."
                },
                "new_str": {
                    "type": "string",
                    "description": "The replacement string."
                }
            },
            "required": ["path", "old_str", "new_str"]
        })
    }

    async fn execute(&self, args: serde_json::Value) -> anyhow::Result<ToolResult> {
        Ok(match self.edit(&args).await {
            Ok(message) => ToolResult::success(message),
            Err(e) => e.into(),
        })
    }
}
