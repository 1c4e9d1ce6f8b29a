use crate::error::ToolError;
use crate::tools::{extract_absolute_path, extract_string_arg};
use crate::traits::{Tool, ToolResult};
use async_trait::async_trait;
use serde_json::json;
use tokio::io::AsyncWriteExt;

/// Creates new files. Never overwrites.
#[derive(Debug, Default)]
pub struct WriteTool;

impl WriteTool {
    pub fn new() -> Self {
        Self
    }

    async fn write(&self, args: &serde_json::Value) -> Result<String, ToolError> {
        let path = extract_absolute_path(args)?;
        let content = extract_string_arg(args, "content")?;

        // symlink_metadata so a dangling link still counts as taken
        if tokio::fs::symlink_metadata(&path).await.is_ok() {
            return Err(ToolError::AlreadyExists(path));
        }

        if let Some(parent) = path.parent()
            && !parent.exists()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ToolError::from_io(parent, e))?;
        }

        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|e| ToolError::from_io(&path, e))?;
        file.write_all(content.as_bytes())
            .await
            .map_err(|e| ToolError::from_io(&path, e))?;
        file.flush()
            .await
            .map_err(|e| ToolError::from_io(&path, e))?;

        Ok(format!("Successfully created file: {}", path.display()))
    }
}

#[async_trait]
impl Tool for WriteTool {
    fn name(&self) -> &str {
        "Write"
    }

    fn description(&self) -> &str {
        "Create a new file with the specified content. Fails if the file already exists."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "The absolute path where the file should be created."
                },
                "content": {
                    "type": "string",
                    "description": "The content to write to the file."
                }
            },
            "required": ["path", "content"]
        })
    }

    async fn execute(&self, args: serde_json::Value) -> anyhow::Result<ToolResult> {
        Ok(match self.write(&args).await {
            Ok(message) => ToolResult::success(message),
            Err(e) => e.into(),
        })
    }
}
