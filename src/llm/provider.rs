//! Model provider trait
//!
//! Abstracts the model endpoint so that the agent loop does not care which
//! backend it is talking to. Providers translate the crate-internal message
//! types to their own wire format.

use thiserror::Error;

use crate::tools::ToolDeclaration;

use super::types::{Message, ToolCallRequest};

/// Failure kinds of the model interface
///
/// Transient failures (timeouts, rate limits, 5xx) are eligible for a
/// bounded retry by the agent loop. Fatal failures (auth, quota, malformed
/// responses) are surfaced immediately and end the session.
#[derive(Error, Debug)]
pub enum ModelError {
    /// Eligible for a bounded retry with backoff
    #[error("transient model interface error: {0}")]
    Transient(String),

    /// Not retried; terminates the session
    #[error("model interface error: {0}")]
    Fatal(String),
}

impl ModelError {
    /// Check if this error is eligible for retry
    pub fn is_transient(&self) -> bool {
        matches!(self, ModelError::Transient(_))
    }
}

/// Response from a model call
///
/// Either a terminal assistant message (no tool calls) or a request for one
/// or more tool invocations, in the order the model emitted them.
#[derive(Debug, Clone)]
pub struct ModelResponse {
    /// Assistant text (may be empty when the model only requests tools)
    pub content: String,
    /// Requested tool invocations, in request order
    pub tool_calls: Vec<ToolCallRequest>,
}

impl ModelResponse {
    /// Check if the model requested any tool invocations
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

/// Trait for model backends usable by the agent loop
#[async_trait::async_trait]
pub trait ModelProvider: Send + Sync {
    /// Send the full ordered message history plus the current tool
    /// declarations and get the model's next step.
    async fn chat(
        &self,
        messages: &[Message],
        tools: &[ToolDeclaration],
    ) -> Result<ModelResponse, ModelError>;

    /// Get the model name in use
    fn model(&self) -> &str;
}
