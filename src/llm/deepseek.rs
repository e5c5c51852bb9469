//! DeepSeek provider
//!
//! Talks to the DeepSeek chat-completions endpoint (OpenAI-compatible wire
//! format). Internal messages are translated to and from the wire types here;
//! nothing outside this file sees the wire format.

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::tools::ToolDeclaration;

use super::provider::{ModelError, ModelProvider, ModelResponse};
use super::types::{Message, Role, ToolCallRequest};

const DEFAULT_MODEL: &str = "deepseek-chat";
const DEFAULT_BASE_URL: &str = "https://api.deepseek.com";
const DEFAULT_MAX_TOKENS: u32 = 4096;

/// DeepSeek model provider
pub struct DeepSeekProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    max_tokens: u32,
}

impl DeepSeekProvider {
    /// Create a provider from environment variables
    ///
    /// Reads `DEEPSEEK_API_KEY` (required), `DEEPSEEK_MODEL` and
    /// `DEEPSEEK_BASE_URL` (optional overrides).
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("DEEPSEEK_API_KEY")
            .context("DEEPSEEK_API_KEY environment variable not set")?;
        let model =
            std::env::var("DEEPSEEK_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        let base_url =
            std::env::var("DEEPSEEK_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        Ok(Self::new(api_key, model, base_url))
    }

    /// Create a provider with explicit configuration
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            base_url: base_url.into(),
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    /// Override the model
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Override the response token limit
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    fn build_request(&self, messages: &[Message], tools: &[ToolDeclaration]) -> ChatRequest {
        let wire_messages = messages.iter().map(WireMessage::from_message).collect();

        let (wire_tools, tool_choice) = if tools.is_empty() {
            (None, None)
        } else {
            (
                Some(tools.iter().map(|t| t.to_schema()).collect()),
                Some("auto".to_string()),
            )
        };

        ChatRequest {
            model: self.model.clone(),
            messages: wire_messages,
            tools: wire_tools,
            tool_choice,
            temperature: 0.0,
            max_tokens: self.max_tokens,
        }
    }

    fn classify_status(status: StatusCode, body: &str) -> ModelError {
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ModelError::Fatal(format!(
                "authentication failed ({}): check DEEPSEEK_API_KEY",
                status
            )),
            StatusCode::PAYMENT_REQUIRED => {
                ModelError::Fatal(format!("quota exhausted ({}): {}", status, body))
            }
            StatusCode::REQUEST_TIMEOUT | StatusCode::TOO_MANY_REQUESTS => {
                ModelError::Transient(format!("rate limited ({}): {}", status, body))
            }
            s if s.is_server_error() => {
                ModelError::Transient(format!("server error ({}): {}", status, body))
            }
            _ => ModelError::Fatal(format!("API error ({}): {}", status, body)),
        }
    }
}

#[async_trait::async_trait]
impl ModelProvider for DeepSeekProvider {
    async fn chat(
        &self,
        messages: &[Message],
        tools: &[ToolDeclaration],
    ) -> Result<ModelResponse, ModelError> {
        let url = format!("{}/chat/completions", self.base_url);
        let request = self.build_request(messages, tools);

        tracing::debug!(
            "[DeepSeek] Sending {} messages, {} tools to {}",
            messages.len(),
            tools.len(),
            self.model
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                // Connection-level failures are retriable
                ModelError::Transient(format!("request failed: {}", e))
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ModelError::Transient(format!("failed to read response body: {}", e)))?;

        if !status.is_success() {
            tracing::error!("[DeepSeek] API error: {} - {}", status, body);
            return Err(Self::classify_status(status, &body));
        }

        let chat_response: ChatResponse = serde_json::from_str(&body)
            .map_err(|e| ModelError::Fatal(format!("malformed API response: {}", e)))?;

        let choice = chat_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ModelError::Fatal("API response contained no choices".to_string()))?;

        if let Some(usage) = chat_response.usage {
            tracing::debug!(
                "[DeepSeek] Usage: {} prompt + {} completion tokens",
                usage.prompt_tokens,
                usage.completion_tokens
            );
        }

        let tool_calls = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|tc| tc.into_request())
            .collect();

        Ok(ModelResponse {
            content: choice.message.content.unwrap_or_default(),
            tool_calls,
        })
    }

    fn model(&self) -> &str {
        &self.model
    }
}

// ============================================================================
// Wire types (OpenAI-compatible chat completions)
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<String>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireMessage {
    role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<WireToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

impl WireMessage {
    fn from_message(msg: &Message) -> Self {
        let role = match msg.role {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        };

        let tool_calls = if msg.tool_calls.is_empty() {
            None
        } else {
            Some(
                msg.tool_calls
                    .iter()
                    .map(|tc| WireToolCall {
                        id: tc.id.clone(),
                        call_type: "function".to_string(),
                        function: WireFunction {
                            name: tc.name.clone(),
                            arguments: tc.arguments.to_string(),
                        },
                    })
                    .collect(),
            )
        };

        Self {
            role: role.to_string(),
            content: Some(msg.content.clone()),
            tool_calls,
            tool_call_id: msg.tool_call_id.clone(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct WireToolCall {
    id: String,
    #[serde(rename = "type")]
    call_type: String,
    function: WireFunction,
}

impl WireToolCall {
    fn into_request(self) -> ToolCallRequest {
        // The wire carries arguments as a JSON-encoded string; a parse
        // failure is preserved as a raw field so the tool layer can report
        // invalid arguments instead of the provider failing the whole call.
        let arguments = serde_json::from_str(&self.function.arguments)
            .unwrap_or_else(|_| json!({ "raw": self.function.arguments }));

        ToolCallRequest::new(self.id, self.function.name, arguments)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct WireFunction {
    name: String,
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    usage: Option<WireUsage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: WireMessage,
    #[allow(dead_code)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}
