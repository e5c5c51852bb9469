//! Tool trait and declaration types

use serde_json::{json, Value};

use crate::permissions::PermissionLevel;

/// Parameter value types accepted in tool schemas
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    String,
    Integer,
    Boolean,
}

impl ParamKind {
    fn json_type(&self) -> &'static str {
        match self {
            ParamKind::String => "string",
            ParamKind::Integer => "integer",
            ParamKind::Boolean => "boolean",
        }
    }

    fn matches(&self, value: &Value) -> bool {
        match self {
            ParamKind::String => value.is_string(),
            ParamKind::Integer => value.is_i64() || value.is_u64(),
            ParamKind::Boolean => value.is_boolean(),
        }
    }
}

/// A single declared parameter
#[derive(Debug, Clone)]
pub struct ParamSpec {
    pub name: String,
    pub kind: ParamKind,
    pub description: String,
    pub required: bool,
}

/// Static description of a tool: its name, parameters, and permission level
#[derive(Debug, Clone)]
pub struct ToolDeclaration {
    pub name: String,
    pub description: String,
    pub parameters: Vec<ParamSpec>,
    pub permission: PermissionLevel,
}

impl ToolDeclaration {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        permission: PermissionLevel,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: Vec::new(),
            permission,
        }
    }

    /// Add a parameter (builder style)
    pub fn param(
        mut self,
        name: impl Into<String>,
        kind: ParamKind,
        description: impl Into<String>,
        required: bool,
    ) -> Self {
        self.parameters.push(ParamSpec {
            name: name.into(),
            kind,
            description: description.into(),
            required,
        });
        self
    }

    /// Render as an OpenAI-style function schema
    pub fn to_schema(&self) -> Value {
        let mut properties = serde_json::Map::new();
        let mut required = Vec::new();

        for p in &self.parameters {
            properties.insert(
                p.name.clone(),
                json!({
                    "type": p.kind.json_type(),
                    "description": p.description,
                }),
            );
            if p.required {
                required.push(p.name.clone());
            }
        }

        json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description,
                "parameters": {
                    "type": "object",
                    "properties": properties,
                    "required": required,
                },
            },
        })
    }

    /// Check arguments against the declared parameters
    ///
    /// Required parameters must be present, and present parameters must have
    /// the declared type. Unknown fields are ignored.
    pub fn validate(&self, arguments: &Value) -> Result<(), String> {
        let obj = arguments
            .as_object()
            .ok_or_else(|| "arguments must be a JSON object".to_string())?;

        for p in &self.parameters {
            match obj.get(&p.name) {
                Some(value) => {
                    if !p.kind.matches(value) {
                        return Err(format!(
                            "parameter '{}' must be a {}",
                            p.name,
                            p.kind.json_type()
                        ));
                    }
                }
                None if p.required => {
                    return Err(format!("missing required parameter '{}'", p.name));
                }
                None => {}
            }
        }

        Ok(())
    }
}

/// Result of executing a tool
#[derive(Debug, Clone)]
pub struct ToolResult {
    pub output: String,
    pub is_error: bool,
}

impl ToolResult {
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            is_error: false,
        }
    }

    pub fn error(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            is_error: true,
        }
    }
}

/// A tool the agent can invoke
#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    fn declaration(&self) -> &ToolDeclaration;

    /// Execute with already-validated arguments
    ///
    /// Expected failures (missing file, command exit codes) are reported as
    /// error `ToolResult`s; an `Err` here means the tool itself faulted.
    async fn execute(&self, arguments: &Value) -> anyhow::Result<ToolResult>;
}
