pub mod provider;
pub mod tool;

pub use provider::{
    ChatMessage, ChatRequest, ChatResponse, ContentBlock, MessageContent, Provider, Role,
    StopReason, ToolUse,
};
pub use tool::{NO_OUTPUT, Tool, ToolResult, ToolSpec};
