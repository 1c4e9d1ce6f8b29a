use crate::error::ToolError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub const NO_OUTPUT: &str = "(no output)";
const UNKNOWN_ERROR: &str = "Unknown error";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResult {
    pub success: bool,
    pub output: String,
    pub error: Option<String>,
}

impl ToolResult {
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: output.into(),
            error: None,
        }
    }

    pub fn error(error: impl Into<String>) -> Self {
        Self {
            success: false,
            output: String::new(),
            error: Some(error.into()),
        }
    }

    /// Keeps partial output alongside a failure (e.g. stdout of a command
    /// that exited non-zero).
    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.output = output.into();
        self
    }

    /// The `(content, is_error)` pair surfaced to the model as a
    /// `tool_result` block.
    pub fn to_block_content(&self) -> (String, bool) {
        if self.success {
            let content = if self.output.is_empty() {
                NO_OUTPUT.to_string()
            } else {
                self.output.clone()
            };
            (content, false)
        } else {
            let content = self
                .error
                .clone()
                .filter(|e| !e.is_empty())
                .unwrap_or_else(|| UNKNOWN_ERROR.to_string());
            (content, true)
        }
    }
}

impl From<ToolError> for ToolResult {
    fn from(err: ToolError) -> Self {
        ToolResult::error(err.to_string())
    }
}

/// Tool descriptor; serializes to the `{name, description, input_schema}`
/// shape models expect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub input_schema: serde_json::Value,
}

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    fn parameters_schema(&self) -> serde_json::Value;

    /// Runs the tool. Implementations report failures as an unsuccessful
    /// `ToolResult`; `Err` is reserved for faults the registry must catch.
    async fn execute(&self, args: serde_json::Value) -> anyhow::Result<ToolResult>;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: self.parameters_schema(),
        }
    }
}
