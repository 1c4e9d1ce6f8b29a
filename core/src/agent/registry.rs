use crate::traits::{Tool, ToolResult, ToolSpec};
use futures_util::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

/// Name-keyed tool set. Built once at startup, then shared read-only.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `tool`. A later registration under the same name replaces
    /// the earlier one in place.
    pub fn register(&mut self, tool: impl Tool + 'static) {
        let tool: Arc<dyn Tool> = Arc::new(tool);
        match self.tools.iter_mut().find(|t| t.name() == tool.name()) {
            Some(slot) => {
                tracing::warn!("Replacing previously registered tool '{}'", tool.name());
                *slot = tool;
            }
            None => self.tools.push(tool),
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name).cloned()
    }

    pub fn names(&self) -> Vec<String> {
        self.tools.iter().map(|t| t.name().to_string()).collect()
    }

    pub fn specs(&self) -> Vec<ToolSpec> {
        self.tools.iter().map(|t| t.spec()).collect()
    }

    /// Dispatches to the named tool. Never fails: unknown names, tool errors
    /// and panics all come back as unsuccessful results.
    pub async fn execute(&self, name: &str, args: serde_json::Value) -> ToolResult {
        let Some(tool) = self.get(name) else {
            return ToolResult::error(format!(
                "Unknown tool: {}. Available tools: [{}]",
                name,
                self.names().join(", ")
            ));
        };

        match AssertUnwindSafe(tool.execute(args)).catch_unwind().await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => ToolResult::error(format!("Tool execution failed: {e}")),
            Err(panic) => ToolResult::error(format!(
                "Tool execution failed: {}",
                panic_message(panic.as_ref())
            )),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "tool panicked".to_string()
    }
}
