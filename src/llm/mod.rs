//! Model interface
//!
//! This module provides:
//! - Conversation message types shared across the crate
//! - `ModelProvider` trait - the opaque request/response interface to the LLM
//! - `DeepSeekProvider` - implementation for the DeepSeek chat-completions API
//! - `ModelError` - transient vs. fatal failure kinds

mod deepseek;
mod provider;
pub mod types;

pub use deepseek::DeepSeekProvider;
pub use provider::{ModelError, ModelProvider, ModelResponse};
pub use types::{Message, Role, ToolCallRequest};
