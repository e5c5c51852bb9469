//! Tool registry
//!
//! Owns the set of available tools, validates arguments before dispatch, and
//! converts tool faults into error results so a misbehaving tool can never
//! take down the agent loop.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::permissions::PermissionLevel;

use super::tool::{Tool, ToolDeclaration, ToolResult};

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("tool '{0}' is already registered")]
    DuplicateTool(String),

    #[error("unknown tool '{0}'")]
    UnknownTool(String),

    #[error("invalid arguments for '{tool}': {reason}")]
    InvalidArguments { tool: String, reason: String },
}

/// Registry of available tools, preserving registration order
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<(), RegistryError> {
        let name = tool.declaration().name.clone();
        if self.index.contains_key(&name) {
            return Err(RegistryError::DuplicateTool(name));
        }
        self.index.insert(name, self.tools.len());
        self.tools.push(tool);
        Ok(())
    }

    /// Declarations in registration order
    pub fn declarations(&self) -> Vec<ToolDeclaration> {
        self.tools.iter().map(|t| t.declaration().clone()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.index.get(name).map(|&i| &self.tools[i])
    }

    pub fn permission_level(&self, name: &str) -> Option<PermissionLevel> {
        self.get(name).map(|t| t.declaration().permission)
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Validate and execute a tool by name
    ///
    /// Lookup and validation failures surface as errors; once a tool runs,
    /// any fault it raises is folded into an error `ToolResult`.
    pub async fn execute(&self, name: &str, arguments: &Value) -> Result<ToolResult, RegistryError> {
        let tool = self
            .get(name)
            .ok_or_else(|| RegistryError::UnknownTool(name.to_string()))?;

        tool.declaration()
            .validate(arguments)
            .map_err(|reason| RegistryError::InvalidArguments {
                tool: name.to_string(),
                reason,
            })?;

        match tool.execute(arguments).await {
            Ok(result) => Ok(result),
            Err(e) => {
                tracing::warn!("[Registry] Tool '{}' faulted: {:#}", name, e);
                Ok(ToolResult::error(format!("Tool execution failed: {:#}", e)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::tool::ParamKind;
    use serde_json::json;

    struct EchoTool {
        decl: ToolDeclaration,
    }

    impl EchoTool {
        fn new() -> Self {
            Self {
                decl: ToolDeclaration::new("echo", "Echo text back", PermissionLevel::Auto)
                    .param("text", ParamKind::String, "Text to echo", true),
            }
        }
    }

    #[async_trait::async_trait]
    impl Tool for EchoTool {
        fn declaration(&self) -> &ToolDeclaration {
            &self.decl
        }

        async fn execute(&self, arguments: &Value) -> anyhow::Result<ToolResult> {
            let text = arguments["text"].as_str().unwrap_or_default();
            Ok(ToolResult::success(text))
        }
    }

    struct FaultyTool {
        decl: ToolDeclaration,
    }

    #[async_trait::async_trait]
    impl Tool for FaultyTool {
        fn declaration(&self) -> &ToolDeclaration {
            &self.decl
        }

        async fn execute(&self, _arguments: &Value) -> anyhow::Result<ToolResult> {
            anyhow::bail!("disk on fire")
        }
    }

    #[test]
    fn test_register_rejects_duplicates() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool::new())).unwrap();
        let err = registry.register(Arc::new(EchoTool::new())).unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateTool(name) if name == "echo"));
    }

    #[test]
    fn test_declarations_preserve_order() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool::new())).unwrap();
        registry
            .register(Arc::new(FaultyTool {
                decl: ToolDeclaration::new("faulty", "Always faults", PermissionLevel::Auto),
            }))
            .unwrap();

        let names: Vec<_> = registry
            .declarations()
            .into_iter()
            .map(|d| d.name)
            .collect();
        assert_eq!(names, vec!["echo", "faulty"]);
    }

    #[tokio::test]
    async fn test_execute_unknown_tool() {
        let registry = ToolRegistry::new();
        let err = registry.execute("nope", &json!({})).await.unwrap_err();
        assert!(matches!(err, RegistryError::UnknownTool(name) if name == "nope"));
    }

    #[tokio::test]
    async fn test_execute_invalid_arguments() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool::new())).unwrap();
        let err = registry.execute("echo", &json!({})).await.unwrap_err();
        assert!(matches!(err, RegistryError::InvalidArguments { .. }));
    }

    #[tokio::test]
    async fn test_execute_success() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool::new())).unwrap();
        let result = registry
            .execute("echo", &json!({"text": "hello"}))
            .await
            .unwrap();
        assert!(!result.is_error);
        assert_eq!(result.output, "hello");
    }

    #[tokio::test]
    async fn test_fault_becomes_error_result() {
        let mut registry = ToolRegistry::new();
        registry
            .register(Arc::new(FaultyTool {
                decl: ToolDeclaration::new("faulty", "Always faults", PermissionLevel::Auto),
            }))
            .unwrap();

        let result = registry.execute("faulty", &json!({})).await.unwrap();
        assert!(result.is_error);
        assert!(result.output.contains("disk on fire"));
    }
}
