use crate::error::ProviderError;
use crate::traits::{ChatMessage, ChatRequest, ChatResponse, ContentBlock, Provider, Role, StopReason, ToolSpec};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
struct OpenAIRequest<'a> {
    model: &'a str,
    messages: Vec<OpenAIMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<OpenAITool<'a>>>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
}

#[derive(Debug, Serialize, PartialEq)]
struct OpenAIMessage {
    role: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<OpenAIToolCallRequest>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

impl OpenAIMessage {
    fn new(role: &'static str, content: impl Into<String>) -> Self {
        Self {
            role,
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: None,
        }
    }
}

#[derive(Debug, Serialize, PartialEq)]
struct OpenAIToolCallRequest {
    id: String,
    r#type: &'static str,
    function: OpenAIFunctionRequest,
}

#[derive(Debug, Serialize, PartialEq)]
struct OpenAIFunctionRequest {
    name: String,
    arguments: String,
}

#[derive(Debug, Serialize)]
struct OpenAITool<'a> {
    r#type: &'static str,
    function: OpenAIToolFunction<'a>,
}

#[derive(Debug, Serialize)]
struct OpenAIToolFunction<'a> {
    name: &'a str,
    description: &'a str,
    parameters: &'a serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponseMessage {
    content: Option<String>,
    tool_calls: Option<Vec<OpenAIToolCall>>,
}

#[derive(Debug, Deserialize)]
struct OpenAIToolCall {
    id: String,
    function: OpenAIFunction,
}

#[derive(Debug, Deserialize)]
struct OpenAIFunction {
    name: String,
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct OpenAIError {
    error: OpenAIErrorDetail,
}

#[derive(Debug, Deserialize)]
struct OpenAIErrorDetail {
    message: String,
}

/// Chat-completions adapter; also covers OpenAI-compatible servers such as
/// Ollama or OpenRouter through `with_base_url`.
pub struct OpenAIProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    max_tokens: u32,
    temperature: Option<f64>,
}

impl OpenAIProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(300))
            .connect_timeout(std::time::Duration::from_secs(30))
            .build()
            .unwrap_or_default();

        Self {
            client,
            api_key: api_key.into(),
            model: "gpt-4o".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
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

    fn build_request<'a>(&'a self, request: &ChatRequest<'a>) -> OpenAIRequest<'a> {
        OpenAIRequest {
            model: &self.model,
            messages: convert_messages(request.system, request.messages),
            tools: (!request.tools.is_empty()).then(|| convert_tools(request.tools)),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        }
    }
}

/// Flattens block-based turns into chat-completions messages. Each
/// tool_result becomes its own `tool` message.
fn convert_messages(system: &str, messages: &[ChatMessage]) -> Vec<OpenAIMessage> {
    let mut converted = Vec::new();
    if !system.is_empty() {
        converted.push(OpenAIMessage::new("system", system));
    }

    for message in messages {
        let blocks = message.blocks();
        match message.role {
            Role::Assistant => {
                let text = joined_text(&blocks);
                let tool_calls: Vec<OpenAIToolCallRequest> = blocks
                    .iter()
                    .filter_map(|b| match b {
                        ContentBlock::ToolUse { id, name, input } => Some(OpenAIToolCallRequest {
                            id: id.clone(),
                            r#type: "function",
                            function: OpenAIFunctionRequest {
                                name: name.clone(),
                                arguments: input.to_string(),
                            },
                        }),
                        _ => None,
                    })
                    .collect();

                converted.push(OpenAIMessage {
                    role: "assistant",
                    content: text,
                    tool_calls: (!tool_calls.is_empty()).then_some(tool_calls),
                    tool_call_id: None,
                });
            }
            Role::User => {
                for block in &blocks {
                    if let ContentBlock::ToolResult {
                        tool_use_id,
                        content,
                        ..
                    } = block
                    {
                        converted.push(OpenAIMessage {
                            role: "tool",
                            content: Some(content.clone()),
                            tool_calls: None,
                            tool_call_id: Some(tool_use_id.clone()),
                        });
                    }
                }
                if let Some(text) = joined_text(&blocks) {
                    converted.push(OpenAIMessage::new("user", text));
                }
            }
        }
    }

    converted
}

fn joined_text(blocks: &[ContentBlock]) -> Option<String> {
    let parts: Vec<&str> = blocks
        .iter()
        .filter_map(|b| match b {
            ContentBlock::Text { text } => Some(text.as_str()),
            _ => None,
        })
        .collect();
    (!parts.is_empty()).then(|| parts.join("\n"))
}

fn convert_tools(tools: &[ToolSpec]) -> Vec<OpenAITool<'_>> {
    tools
        .iter()
        .map(|t| OpenAITool {
            r#type: "function",
            function: OpenAIToolFunction {
                name: &t.name,
                description: &t.description,
                parameters: &t.input_schema,
            },
        })
        .collect()
}

fn parse_response(body: &str) -> Result<ChatResponse, ProviderError> {
    let response: OpenAIResponse = serde_json::from_str(body)
        .map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;

    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::MalformedResponse("No choices in response".into()))?;

    let mut content = Vec::new();
    if let Some(text) = choice.message.content.filter(|c| !c.trim().is_empty()) {
        content.push(ContentBlock::Text { text });
    }

    for call in choice.message.tool_calls.unwrap_or_default() {
        let input: serde_json::Value = if call.function.arguments.trim().is_empty() {
            serde_json::json!({})
        } else {
            serde_json::from_str(&call.function.arguments).map_err(|e| {
                ProviderError::MalformedResponse(format!(
                    "Failed to parse tool arguments for {}: {}",
                    call.function.name, e
                ))
            })?
        };
        if !input.is_object() {
            return Err(ProviderError::MalformedResponse(format!(
                "Tool arguments for {} are not an object",
                call.function.name
            )));
        }

        content.push(ContentBlock::ToolUse {
            id: call.id,
            name: call.function.name,
            input,
        });
    }

    let stop_reason = match choice.finish_reason.as_deref() {
        Some("tool_calls") | Some("function_call") => StopReason::ToolUse,
        Some("length") => StopReason::MaxTokens,
        Some("stop") | None => StopReason::EndTurn,
        Some(other) => StopReason::Other(other.to_string()),
    };

    Ok(ChatResponse {
        stop_reason,
        content,
    })
}

fn error_message(body: &str) -> String {
    serde_json::from_str::<OpenAIError>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.to_string())
}

#[async_trait]
impl Provider for OpenAIProvider {
    async fn chat(&self, request: ChatRequest<'_>) -> Result<ChatResponse, ProviderError> {
        let openai_request = self.build_request(&request);

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&openai_request)
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
        "openai"
    }
}
