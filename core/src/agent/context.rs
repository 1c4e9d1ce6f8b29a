use crate::traits::ToolSpec;
use std::fmt::Write;
use std::path::{Path, PathBuf};

const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful personal assistant with access to tools for file operations and command execution. You help with reading, creating and editing files, running shell commands, coding tasks, file management and automation.

## Guidelines

1. Be careful with destructive operations. Confirm with the user before deleting files or running commands that cannot be undone.
2. Explain what you are doing. When a task needs several steps, outline the plan first.
3. If a tool fails, explain the error and suggest an alternative.
4. Read a file before editing it. Write only creates new files; use Edit to change existing ones. Edit needs an old_str that occurs exactly once, so include enough surrounding context.
5. All file paths must be absolute.
6. Keep shell commands non-interactive and bounded; long-running commands are cut off by their timeout.";

pub struct ContextBuilder {
    pub working_dir: PathBuf,
    pub system_prompt: Option<String>,
    pub tool_specs: Vec<ToolSpec>,
}

impl ContextBuilder {
    pub fn new(working_dir: impl AsRef<Path>) -> Self {
        Self {
            working_dir: working_dir.as_ref().to_path_buf(),
            system_prompt: None,
            tool_specs: vec![],
        }
    }

    /// Replaces the built-in base prompt.
    pub fn with_system_prompt(mut self, prompt: Option<String>) -> Self {
        self.system_prompt = prompt.filter(|p| !p.trim().is_empty());
        self
    }

    pub fn with_tool_specs(mut self, tool_specs: Vec<ToolSpec>) -> Self {
        self.tool_specs = tool_specs;
        self
    }

    pub fn build_system_prompt(&self) -> String {
        let mut parts = vec![
            self.system_prompt
                .clone()
                .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
        ];

        if let Some(tools) = self.get_tool_overview() {
            parts.push(tools);
        }
        parts.push(self.get_runtime_context());

        parts.join("\n\n---\n\n")
    }

    fn get_tool_overview(&self) -> Option<String> {
        if self.tool_specs.is_empty() {
            return None;
        }

        let mut overview = String::from("## Available Tools\n");
        for tool in &self.tool_specs {
            let _ = write!(overview, "\n### {}\n{}\n", tool.name, tool.description);

            let required: Vec<&str> = tool.input_schema["required"]
                .as_array()
                .map(|r| r.iter().filter_map(|v| v.as_str()).collect())
                .unwrap_or_default();

            if let Some(props) = tool.input_schema["properties"].as_object() {
                for (param, schema) in props {
                    let kind = schema["type"].as_str().unwrap_or("any");
                    let optional = if required.contains(&param.as_str()) {
                        ""
                    } else {
                        ", optional"
                    };
                    let description = schema["description"].as_str().unwrap_or("");
                    let _ = writeln!(overview, "- `{param}` ({kind}{optional}): {description}");
                }
            }
        }

        Some(overview)
    }

    fn get_runtime_context(&self) -> String {
        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M (%A)");

        format!(
            "## Runtime Context

### Current Time
{}

### Working Directory
{}",
            timestamp,
            self.working_dir.display()
        )
    }
}
