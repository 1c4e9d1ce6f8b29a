use crate::error::ProviderError;
use crate::traits::{ChatMessage, ChatRequest, ChatResponse, ContentBlock, Provider, StopReason, ToolSpec};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

const API_VERSION: &str = "2023-06-01";

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<&'a [ToolSpec]>,
    messages: &'a [ChatMessage],
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<ResponseBlock>,
    stop_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ResponseBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    // thinking, redacted_thinking, server tool blocks
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

pub struct AnthropicProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    max_tokens: u32,
    temperature: Option<f64>,
}

impl AnthropicProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(300))
            .connect_timeout(std::time::Duration::from_secs(30))
            .build()
            .unwrap_or_default();

        Self {
            client,
            api_key: api_key.into(),
            model: "claude-sonnet-4-20250514".to_string(),
            base_url: "https://api.anthropic.com".to_string(),
            max_tokens: 4096,
            temperature: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    fn build_request<'a>(&'a self, request: &ChatRequest<'a>) -> AnthropicRequest<'a> {
        AnthropicRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            system: (!request.system.is_empty()).then_some(request.system),
            tools: (!request.tools.is_empty()).then_some(request.tools),
            messages: request.messages,
        }
    }
}

fn parse_response(body: &str) -> Result<ChatResponse, ProviderError> {
    let response: AnthropicResponse = serde_json::from_str(body)
        .map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;

    let content = response
        .content
        .into_iter()
        .filter_map(|block| match block {
            ResponseBlock::Text { text } => Some(ContentBlock::Text { text }),
            ResponseBlock::ToolUse { id, name, input } => {
                Some(ContentBlock::ToolUse { id, name, input })
            }
            ResponseBlock::Unsupported => None,
        })
        .collect();

    let stop_reason = response
        .stop_reason
        .as_deref()
        .map(StopReason::from_wire)
        .unwrap_or(StopReason::EndTurn);

    Ok(ChatResponse {
        stop_reason,
        content,
    })
}

fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorResponse>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.to_string())
}

#[async_trait]
impl Provider for AnthropicProvider {
    async fn chat(&self, request: ChatRequest<'_>) -> Result<ChatResponse, ProviderError> {
        let body = self.build_request(&request);

        let response = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message: error_message(&text),
            });
        }

        parse_response(&text)
    }

    fn name(&self) -> &str {
        "anthropic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_uses_wire_shapes() {
        let provider = AnthropicProvider::new("key").with_model("claude-test");
        let tools = vec![ToolSpec {
            name: "Read".into(),
            description: "Read a file".into(),
            input_schema: json!({"type": "object", "properties": {}, "required": []}),
        }];
        let messages = vec![
            ChatMessage::user("hi"),
            ChatMessage::assistant(vec![ContentBlock::ToolUse {
                id: "tu_1".into(),
                name: "Read".into(),
                input: json!({"path": "/a"}),
            }]),
            ChatMessage::user_blocks(vec![ContentBlock::tool_result("tu_1", "body", false)]),
        ];
        let request = ChatRequest {
            system: "be useful",
            tools: &tools,
            messages: &messages,
        };

        let value = serde_json::to_value(provider.build_request(&request)).unwrap();
        assert_eq!(value["model"], "claude-test");
        assert_eq!(value["max_tokens"], 4096);
        assert_eq!(value["system"], "be useful");
        assert_eq!(value["tools"][0]["input_schema"]["type"], "object");
        assert_eq!(value["messages"][0], json!({"role": "user", "content": "hi"}));
        assert_eq!(value["messages"][1]["content"][0]["type"], "tool_use");
        assert_eq!(value["messages"][2]["content"][0]["tool_use_id"], "tu_1");
    }

    #[test]
    fn empty_tools_and_system_are_omitted() {
        let provider = AnthropicProvider::new("key");
        let messages = vec![ChatMessage::user("hi")];
        let request = ChatRequest {
            system: "",
            tools: &[],
            messages: &messages,
        };

        let value = serde_json::to_value(provider.build_request(&request)).unwrap();
        assert!(value.get("tools").is_none());
        assert!(value.get("system").is_none());
        assert!(value.get("temperature").is_none());
    }

    #[test]
    fn temperature_is_sent_only_when_configured() {
        let provider = AnthropicProvider::new("key").with_temperature(0.2);
        let messages = vec![ChatMessage::user("hi")];
        let request = ChatRequest {
            system: "",
            tools: &[],
            messages: &messages,
        };

        let value = serde_json::to_value(provider.build_request(&request)).unwrap();
        assert_eq!(value["temperature"], 0.2);
    }

    #[test]
    fn parses_tool_use_response() {
        let body = json!({
            "id": "msg_1",
            "type": "message",
            "role": "assistant",
            "model": "claude",
            "content": [
                {"type": "thinking", "thinking": "hmm", "signature": "s"},
                {"type": "text", "text": "Looking."},
                {"type": "tool_use", "id": "tu_9", "name": "Bash", "input": {"command": "ls"}}
            ],
            "stop_reason": "tool_use",
            "usage": {"input_tokens": 1, "output_tokens": 2}
        })
        .to_string();

        let response = parse_response(&body).unwrap();
        assert_eq!(response.stop_reason, StopReason::ToolUse);
        assert_eq!(response.content.len(), 2);
        let call = response.tool_uses().next().unwrap();
        assert_eq!(call.id, "tu_9");
        assert_eq!(call.input["command"], "ls");
    }

    #[test]
    fn garbage_is_malformed() {
        assert!(matches!(
            parse_response("<html>"),
            Err(ProviderError::MalformedResponse(_))
        ));
    }

    #[test]
    fn api_error_message_is_extracted() {
        let body = r#"{"type":"error","error":{"type":"overloaded_error","message":"Overloaded"}}"#;
        assert_eq!(error_message(body), "Overloaded");
        assert_eq!(error_message("plain"), "plain");
    }
}
