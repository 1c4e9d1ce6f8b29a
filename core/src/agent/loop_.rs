use crate::agent::ToolRegistry;
use crate::error::ProviderError;
use crate::traits::{ChatMessage, ChatRequest, ContentBlock, Provider, StopReason};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const EMPTY_RESPONSE: &str = "(No response)";

/// Drives one conversation: sends history to the model, runs requested
/// tools, feeds results back, and repeats until the model stops asking for
/// tools.
///
/// Both operations take `&mut self`, so a loop can only serve one
/// `send_message` at a time. Front ends that share a loop must wrap it in a
/// mutex.
pub struct AgentLoop {
    provider: Arc<dyn Provider>,
    tool_registry: Arc<ToolRegistry>,
    system_prompt: String,
    history: Vec<ChatMessage>,
}

impl AgentLoop {
    pub fn new(
        provider: Arc<dyn Provider>,
        tool_registry: Arc<ToolRegistry>,
        system_prompt: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            tool_registry,
            system_prompt: system_prompt.into(),
            history: Vec::new(),
        }
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    pub fn clear_history(&mut self) {
        self.history = Vec::new();
    }

    /// Appends `message` as a user turn and runs model/tool rounds until the
    /// model answers without requesting tools.
    ///
    /// Transport failures are returned as-is. Turns appended before the
    /// failure, including an assistant turn whose tool calls were already
    /// executed, stay in the history. If the returned future is dropped
    /// mid-round, the interrupted round is not recorded.
    pub async fn send_message(&mut self, message: &str) -> Result<String, ProviderError> {
        self.history.push(ChatMessage::user(message));

        let tools = self.tool_registry.specs();
        let mut round = 0usize;

        loop {
            round += 1;
            debug!(
                "Requesting model (round {}, {} turns in history)",
                round,
                self.history.len()
            );

            let response = self
                .provider
                .chat(ChatRequest {
                    system: &self.system_prompt,
                    tools: &tools,
                    messages: &self.history,
                })
                .await?;

            if response.has_tool_uses() {
                let mut results = Vec::new();
                for call in response.tool_uses() {
                    info!("Executing tool: {} ({})", call.name, call.id);
                    let result = self
                        .tool_registry
                        .execute(call.name, call.input.clone())
                        .await;
                    info!("Tool {} finished: success={}", call.name, result.success);

                    let (content, is_error) = result.to_block_content();
                    results.push(ContentBlock::tool_result(call.id, content, is_error));
                }
                // tool_use and its results are recorded together
                self.history.push(ChatMessage::assistant(response.content));
                self.history.push(ChatMessage::user_blocks(results));
                continue;
            }

            self.history
                .push(ChatMessage::assistant(response.content.clone()));

            if response.stop_reason == StopReason::ToolUse {
                warn!("Model reported tool_use without any tool_use blocks; treating as final");
            }

            return Ok(response
                .text()
                .unwrap_or_else(|| EMPTY_RESPONSE.to_string()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::{ChatResponse, MessageContent, Role, Tool, ToolResult};
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Replays canned responses and records every request it receives.
    struct ScriptedProvider {
        responses: Mutex<VecDeque<Result<ChatResponse, ProviderError>>>,
        requests: Mutex<Vec<Vec<ChatMessage>>>,
    }

    impl ScriptedProvider {
        fn new(responses: Vec<Result<ChatResponse, ProviderError>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Provider for ScriptedProvider {
        async fn chat(&self, request: ChatRequest<'_>) -> Result<ChatResponse, ProviderError> {
            self.requests
                .lock()
                .unwrap()
                .push(request.messages.to_vec());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ProviderError::MalformedResponse("script exhausted".into())))
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    struct Echo;

    #[async_trait]
    impl Tool for Echo {
        fn name(&self) -> &str {
            "Echo"
        }

        fn description(&self) -> &str {
            "Echoes its text argument"
        }

        fn parameters_schema(&self) -> serde_json::Value {
            json!({"type": "object", "properties": {"text": {"type": "string"}}, "required": ["text"]})
        }

        async fn execute(&self, args: serde_json::Value) -> anyhow::Result<ToolResult> {
            Ok(ToolResult::success(
                args["text"].as_str().unwrap_or_default(),
            ))
        }
    }

    struct Slow;

    #[async_trait]
    impl Tool for Slow {
        fn name(&self) -> &str {
            "Slow"
        }

        fn description(&self) -> &str {
            "Sleeps for a while"
        }

        fn parameters_schema(&self) -> serde_json::Value {
            json!({"type": "object", "properties": {}})
        }

        async fn execute(&self, _args: serde_json::Value) -> anyhow::Result<ToolResult> {
            tokio::time::sleep(std::time::Duration::from_secs(5)).await;
            Ok(ToolResult::success("woke"))
        }
    }

    fn text(reply: &str) -> Result<ChatResponse, ProviderError> {
        Ok(ChatResponse {
            stop_reason: StopReason::EndTurn,
            content: vec![ContentBlock::text(reply)],
        })
    }

    fn tool_call(id: &str, name: &str, input: serde_json::Value) -> ContentBlock {
        ContentBlock::ToolUse {
            id: id.into(),
            name: name.into(),
            input,
        }
    }

    fn tool_round(blocks: Vec<ContentBlock>) -> Result<ChatResponse, ProviderError> {
        Ok(ChatResponse {
            stop_reason: StopReason::ToolUse,
            content: blocks,
        })
    }

    fn registry() -> Arc<ToolRegistry> {
        let mut registry = ToolRegistry::new();
        registry.register(Echo);
        registry.register(Slow);
        registry.register(crate::tools::EditTool::new());
        Arc::new(registry)
    }

    fn result_blocks(message: &ChatMessage) -> Vec<(String, String, bool)> {
        assert_eq!(message.role, Role::User);
        message
            .blocks()
            .into_iter()
            .map(|b| match b {
                ContentBlock::ToolResult {
                    tool_use_id,
                    content,
                    is_error,
                } => (tool_use_id, content, is_error),
                other => panic!("expected tool_result, got {other:?}"),
            })
            .collect()
    }

    #[tokio::test]
    async fn plain_answer_without_tools() {
        let provider = ScriptedProvider::new(vec![text("Hello there")]);
        let mut agent = AgentLoop::new(provider.clone(), registry(), "sys");

        let reply = agent.send_message("hi").await.unwrap();

        assert_eq!(reply, "Hello there");
        assert_eq!(agent.history().len(), 2);
        assert_eq!(agent.history()[0].content, MessageContent::Text("hi".into()));
        assert_eq!(agent.history()[1].role, Role::Assistant);
        assert_eq!(provider.request_count(), 1);
    }

    #[tokio::test]
    async fn tool_results_answer_every_call_in_order() {
        let provider = ScriptedProvider::new(vec![
            tool_round(vec![
                ContentBlock::text("Let me check."),
                tool_call("tu_1", "Echo", json!({"text": "one"})),
                tool_call("tu_2", "Missing", json!({})),
                tool_call("tu_3", "Echo", json!({"text": ""})),
            ]),
            text("Done"),
        ]);
        let mut agent = AgentLoop::new(provider.clone(), registry(), "sys");

        let reply = agent.send_message("go").await.unwrap();
        assert_eq!(reply, "Done");

        let history = agent.history();
        assert_eq!(history.len(), 4);
        assert_eq!(history[1].blocks().len(), 4);

        let results = result_blocks(&history[2]);
        assert_eq!(results.len(), 3);
        assert_eq!(results[0], ("tu_1".into(), "one".into(), false));
        assert_eq!(results[1].0, "tu_2");
        assert!(results[1].1.starts_with("Unknown tool: Missing"));
        assert!(results[1].2);
        assert_eq!(results[2], ("tu_3".into(), "(no output)".into(), false));

        // second request carried the tool results
        let requests = provider.requests.lock().unwrap();
        assert_eq!(requests[1].len(), 3);
    }

    #[tokio::test]
    async fn multiple_tool_rounds_in_one_message() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("f.txt");
        std::fs::write(&path, "abc").unwrap();

        let provider = ScriptedProvider::new(vec![
            tool_round(vec![tool_call(
                "tu_1",
                "Edit",
                json!({"path": path, "old_str": "zzz", "new_str": "x"}),
            )]),
            tool_round(vec![tool_call(
                "tu_2",
                "Edit",
                json!({"path": path, "old_str": "b", "new_str": ""}),
            )]),
            text("Edited."),
        ]);
        let mut agent = AgentLoop::new(provider.clone(), registry(), "sys");

        assert_eq!(agent.send_message("fix it").await.unwrap(), "Edited.");
        assert_eq!(provider.request_count(), 3);
        assert_eq!(agent.history().len(), 6);

        let first = result_blocks(&agent.history()[2]);
        assert!(first[0].2);
        assert!(first[0].1.contains("String not found"));
        let second = result_blocks(&agent.history()[4]);
        assert!(!second[0].2);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "ac");
    }

    #[tokio::test]
    async fn text_blocks_join_with_newlines() {
        let provider = ScriptedProvider::new(vec![Ok(ChatResponse {
            stop_reason: StopReason::EndTurn,
            content: vec![ContentBlock::text("first"), ContentBlock::text("second")],
        })]);
        let mut agent = AgentLoop::new(provider, registry(), "sys");

        assert_eq!(agent.send_message("x").await.unwrap(), "first\nsecond");
    }

    #[tokio::test]
    async fn empty_response_uses_placeholder() {
        let provider = ScriptedProvider::new(vec![Ok(ChatResponse {
            stop_reason: StopReason::ToolUse,
            content: vec![],
        })]);
        let mut agent = AgentLoop::new(provider, registry(), "sys");

        assert_eq!(agent.send_message("x").await.unwrap(), EMPTY_RESPONSE);
    }

    #[tokio::test]
    async fn tool_blocks_run_even_without_tool_use_stop_reason() {
        let provider = ScriptedProvider::new(vec![
            Ok(ChatResponse {
                stop_reason: StopReason::MaxTokens,
                content: vec![tool_call("tu_1", "Echo", json!({"text": "hi"}))],
            }),
            text("ok"),
        ]);
        let mut agent = AgentLoop::new(provider, registry(), "sys");

        assert_eq!(agent.send_message("x").await.unwrap(), "ok");
        assert_eq!(result_blocks(&agent.history()[2])[0].1, "hi");
    }

    #[tokio::test]
    async fn transport_error_keeps_dangling_turns() {
        let provider = ScriptedProvider::new(vec![
            tool_round(vec![tool_call("tu_1", "Echo", json!({"text": "a"}))]),
            Err(ProviderError::Api {
                status: 529,
                message: "overloaded".into(),
            }),
        ]);
        let mut agent = AgentLoop::new(provider, registry(), "sys");

        let err = agent.send_message("x").await.unwrap_err();
        assert!(matches!(err, ProviderError::Api { status: 529, .. }));
        // user, assistant(tool_use), user(tool_result)
        assert_eq!(agent.history().len(), 3);
    }

    #[tokio::test]
    async fn clear_then_send_has_no_leakage() {
        let provider = ScriptedProvider::new(vec![text("first"), text("second")]);
        let mut agent = AgentLoop::new(provider.clone(), registry(), "sys");

        agent.send_message("earlier").await.unwrap();
        agent.clear_history();
        assert!(agent.history().is_empty());

        agent.send_message("hi").await.unwrap();
        assert_eq!(agent.history().len(), 2);
        assert_eq!(agent.history()[0], ChatMessage::user("hi"));

        let requests = provider.requests.lock().unwrap();
        assert_eq!(requests[1], vec![ChatMessage::user("hi")]);
    }

    #[tokio::test]
    async fn cancelled_tool_round_leaves_no_unanswered_tool_use() {
        let provider = ScriptedProvider::new(vec![
            tool_round(vec![tool_call("tu_1", "Slow", json!({}))]),
            text("later"),
        ]);
        let mut agent = AgentLoop::new(provider.clone(), registry(), "sys");

        let cancelled = tokio::time::timeout(
            std::time::Duration::from_millis(100),
            agent.send_message("go"),
        )
        .await;
        assert!(cancelled.is_err());

        assert_eq!(agent.send_message("next").await.unwrap(), "later");

        let has_tool_use = agent.history().iter().any(|m| {
            m.blocks()
                .iter()
                .any(|b| matches!(b, ContentBlock::ToolUse { .. }))
        });
        assert!(!has_tool_use);
        assert_eq!(
            agent.history(),
            &[
                ChatMessage::user("go"),
                ChatMessage::user("next"),
                ChatMessage::assistant(vec![ContentBlock::text("later")]),
            ]
        );

        let requests = provider.requests.lock().unwrap();
        assert_eq!(requests[1].len(), 2);
    }
}
