use crate::error::ToolError;
use crate::traits::{NO_OUTPUT, Tool, ToolResult};
use async_trait::async_trait;
use serde_json::json;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const MAX_TIMEOUT_SECS: u64 = 300;

#[derive(Debug, Default)]
pub struct BashTool {
    working_dir: Option<PathBuf>,
}

impl BashTool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    async fn run(&self, command: &str, timeout_secs: u64) -> Result<ToolResult, ToolError> {
        let mut cmd = Command::new("bash");
        cmd.arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }

        let child = cmd.spawn().map_err(ToolError::Spawn)?;

        // dropping the timed-out future kills the child
        let output = tokio::time::timeout(
            Duration::from_secs(timeout_secs),
            child.wait_with_output(),
        )
        .await
        .map_err(|_| ToolError::Timeout { secs: timeout_secs })?
        .map_err(ToolError::Spawn)?;

        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

        if output.status.success() {
            let mut text = stdout;
            if !stderr.is_empty() {
                text.push_str(&format!("\n[stderr]: {stderr}"));
            }
            if text.is_empty() {
                text = NO_OUTPUT.to_string();
            }
            Ok(ToolResult::success(text))
        } else {
            let code = output.status.code().unwrap_or(-1);
            Ok(ToolResult::from(ToolError::NonZeroExit { code, stderr }).with_output(stdout))
        }
    }
}

/// Non-integer or non-positive values fall back to the default; large
/// values are capped.
pub fn effective_timeout(value: Option<&serde_json::Value>) -> u64 {
    match value.and_then(|v| v.as_u64()) {
        Some(secs) if secs >= 1 => secs.min(MAX_TIMEOUT_SECS),
        _ => DEFAULT_TIMEOUT_SECS,
    }
}

#[async_trait]
impl Tool for BashTool {
    fn name(&self) -> &str {
        "Bash"
    }

    fn description(&self) -> &str {
        "Execute a bash command and return its output."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "command": {
                    "type": "string",
                    "description": "The bash command to execute."
                },
                "timeout": {
                    "type": "integer",
                    "description": "Timeout in seconds (default: 30).",
                    "default": DEFAULT_TIMEOUT_SECS
                }
            },
            "required": ["command"]
        })
    }

    async fn execute(&self, args: serde_json::Value) -> anyhow::Result<ToolResult> {
        let Some(command) = args
            .get("command")
            .and_then(|v| v.as_str())
            .filter(|c| !c.trim().is_empty())
        else {
            return Ok(ToolError::InvalidArgument("Command parameter is required.".into()).into());
        };
        let timeout_secs = effective_timeout(args.get("timeout"));

        tracing::debug!("Running command (timeout {}s): {}", timeout_secs, command);

        Ok(match self.run(command, timeout_secs).await {
            Ok(result) => result,
            Err(e) => e.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn timeout_clamping() {
        assert_eq!(effective_timeout(Some(&json!(0))), DEFAULT_TIMEOUT_SECS);
        assert_eq!(effective_timeout(Some(&json!(-5))), DEFAULT_TIMEOUT_SECS);
        assert_eq!(effective_timeout(Some(&json!(10000))), MAX_TIMEOUT_SECS);
        assert_eq!(effective_timeout(Some(&json!(12))), 12);
        assert_eq!(effective_timeout(Some(&json!(u64::MAX))), MAX_TIMEOUT_SECS);
        assert_eq!(effective_timeout(Some(&json!("60"))), DEFAULT_TIMEOUT_SECS);
        assert_eq!(effective_timeout(Some(&json!(1.5))), DEFAULT_TIMEOUT_SECS);
        assert_eq!(effective_timeout(None), DEFAULT_TIMEOUT_SECS);
    }

    #[tokio::test]
    async fn silent_success_reports_placeholder() {
        let result = BashTool::new()
            .execute(json!({"command": "true"}))
            .await
            .unwrap();
        assert!(result.success);
        assert_eq!(result.output, NO_OUTPUT);
    }

    #[tokio::test]
    async fn stdout_is_trimmed() {
        let result = BashTool::new()
            .execute(json!({"command": "echo hello"}))
            .await
            .unwrap();
        assert!(result.success);
        assert_eq!(result.output, "hello");
    }

    #[tokio::test]
    async fn stderr_is_appended_on_success() {
        let result = BashTool::new()
            .execute(json!({"command": "echo out; echo warn >&2"}))
            .await
            .unwrap();
        assert!(result.success);
        assert_eq!(result.output, "out\n[stderr]: warn");
    }

    #[tokio::test]
    async fn non_zero_exit_keeps_stdout() {
        let result = BashTool::new()
            .execute(json!({"command": "echo partial; echo broken >&2; exit 3"}))
            .await
            .unwrap();
        assert!(!result.success);
        assert_eq!(result.output, "partial");
        assert_eq!(
            result.error.as_deref(),
            Some("Command exited with code 3: broken")
        );
    }

    #[tokio::test]
    async fn timeout_expiry_is_reported() {
        let tool = BashTool::new();
        let result = tool.run("sleep 5", 1).await.unwrap_err();
        assert!(matches!(result, ToolError::Timeout { secs: 1 }));
        assert_eq!(result.to_string(), "Command timed out after 1 seconds.");
    }

    #[tokio::test]
    async fn empty_command_is_rejected() {
        let result = BashTool::new()
            .execute(json!({"command": ""}))
            .await
            .unwrap();
        assert!(!result.success);
        assert_eq!(
            result.error.as_deref(),
            Some("Command parameter is required.")
        );
    }

    #[tokio::test]
    async fn runs_in_working_dir() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("marker"), "").unwrap();

        let result = BashTool::new()
            .with_working_dir(tmp.path())
            .execute(json!({"command": "ls"}))
            .await
            .unwrap();
        assert_eq!(result.output, "marker");
    }
}
