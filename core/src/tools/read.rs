use crate::error::ToolError;
use crate::tools::extract_absolute_path;
use crate::traits::{Tool, ToolResult};
use async_trait::async_trait;
use serde_json::json;

#[derive(Debug, Default)]
pub struct ReadTool;

impl ReadTool {
    pub fn new() -> Self {
        Self
    }

    async fn read(&self, args: &serde_json::Value) -> Result<String, ToolError> {
        let path = extract_absolute_path(args)?;

        let metadata = tokio::fs::metadata(&path)
            .await
            .map_err(|e| ToolError::from_io(&path, e))?;
        if !metadata.is_file() {
            return Err(ToolError::NotAFile(path));
        }

        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| ToolError::from_io(&path, e))?;

        String::from_utf8(bytes).map_err(|_| ToolError::DecodeError(path))
    }
}

#[async_trait]
impl Tool for ReadTool {
    fn name(&self) -> &str {
        "Read"
    }

    fn description(&self) -> &str {
        "Read the contents of a file at the given path."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "The absolute path to the file to read."
                }
            },
            "required": ["path"]
        })
    }

    async fn execute(&self, args: serde_json::Value) -> anyhow::Result<ToolResult> {
        Ok(match self.read(&args).await {
            Ok(content) => ToolResult::success(content),
            Err(e) => e.into(),
        })
    }
}
