pub mod agent;
pub mod config;
pub mod error;
pub mod providers;
pub mod tools;
pub mod traits;

pub use agent::{AgentLoop, ContextBuilder, ToolRegistry};
pub use config::*;
pub use error::{ProviderError, ToolError};
pub use providers::*;
pub use tools::*;
pub use traits::*;

/// Registry holding the four built-in tools in their advertised order.
pub fn default_tool_registry(working_dir: Option<&std::path::Path>) -> ToolRegistry {
    let mut bash = BashTool::new();
    if let Some(dir) = working_dir {
        bash = bash.with_working_dir(dir);
    }

    let mut registry = ToolRegistry::new();
    registry.register(ReadTool::new());
    registry.register(WriteTool::new());
    registry.register(EditTool::new());
    registry.register(bash);
    registry
}
