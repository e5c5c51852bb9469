//! Hooks for rendering agent activity

use serde_json::Value;

use crate::tools::ToolResult;

/// Receives agent events as they happen; the CLI implements this to render
/// the conversation live
pub trait AgentObserver: Send + Sync {
    fn on_assistant_text(&self, _text: &str) {}
    fn on_tool_call(&self, _name: &str, _arguments: &Value) {}
    fn on_tool_result(&self, _name: &str, _result: &ToolResult) {}
}

/// Observer that renders nothing
pub struct NullObserver;

impl AgentObserver for NullObserver {}
