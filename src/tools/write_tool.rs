//! File write tool

use std::path::{Component, Path, PathBuf};

use serde_json::Value;

use crate::permissions::PermissionLevel;

use super::tool::{ParamKind, Tool, ToolDeclaration, ToolResult};

/// Writes files, creating parent directories as needed
///
/// Writes are confined to the project root; a path that escapes it after
/// lexical normalization is refused.
pub struct WriteTool {
    decl: ToolDeclaration,
    project_root: PathBuf,
}

impl WriteTool {
    pub fn new() -> Self {
        Self::with_project_root(std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
    }

    pub fn with_project_root(project_root: impl Into<PathBuf>) -> Self {
        Self {
            decl: ToolDeclaration::new(
                "write_file",
                "Write content to a file, creating it (and parent directories) \
                 if needed. Overwrites existing content.",
                PermissionLevel::Ask,
            )
            .param("path", ParamKind::String, "Path to the file to write", true)
            .param("content", ParamKind::String, "Content to write", true),
            project_root: project_root.into(),
        }
    }

    /// Resolve a path within the project root, or refuse it
    ///
    /// Normalization is lexical so the check works for files that do not
    /// exist yet.
    fn resolve(&self, path: &str) -> Result<PathBuf, String> {
        let p = Path::new(path);
        let joined = if p.is_absolute() {
            p.to_path_buf()
        } else {
            self.project_root.join(p)
        };

        let mut normalized = PathBuf::new();
        for component in joined.components() {
            match component {
                Component::ParentDir => {
                    if !normalized.pop() {
                        return Err(format!("path is outside the project root: {}", path));
                    }
                }
                Component::CurDir => {}
                other => normalized.push(other),
            }
        }

        if !normalized.starts_with(&self.project_root) {
            return Err(format!("path is outside the project root: {}", path));
        }

        Ok(normalized)
    }
}

impl Default for WriteTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Tool for WriteTool {
    fn declaration(&self) -> &ToolDeclaration {
        &self.decl
    }

    async fn execute(&self, arguments: &Value) -> anyhow::Result<ToolResult> {
        let path = arguments["path"].as_str().unwrap_or_default();
        let content = arguments["content"].as_str().unwrap_or_default();

        let full_path = match self.resolve(path) {
            Ok(p) => p,
            Err(reason) => return Ok(ToolResult::error(reason)),
        };

        let existed = full_path.exists();

        if let Some(parent) = full_path.parent() {
            if let Err(e) = tokio::fs::create_dir_all(parent).await {
                return Ok(ToolResult::error(format!(
                    "Failed to create directories for {}: {}",
                    path, e
                )));
            }
        }

        if let Err(e) = tokio::fs::write(&full_path, content).await {
            return Ok(ToolResult::error(format!("Failed to write {}: {}", path, e)));
        }

        let lines = content.lines().count();
        let verb = if existed { "Updated" } else { "Created" };
        Ok(ToolResult::success(format!(
            "{} {} ({} lines)",
            verb, path, lines
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_write_creates_file_and_parents() {
        let dir = TempDir::new().unwrap();
        let tool = WriteTool::with_project_root(dir.path());

        let result = tool
            .execute(&json!({"path": "sub/dir/a.txt", "content": "hello\n"}))
            .await
            .unwrap();
        assert!(!result.is_error);
        assert!(result.output.starts_with("Created"));
        assert_eq!(
            std::fs::read_to_string(dir.path().join("sub/dir/a.txt")).unwrap(),
            "hello\n"
        );
    }

    #[tokio::test]
    async fn test_write_overwrites_existing() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.txt"), "old").unwrap();
        let tool = WriteTool::with_project_root(dir.path());

        let result = tool
            .execute(&json!({"path": "a.txt", "content": "new"}))
            .await
            .unwrap();
        assert!(result.output.starts_with("Updated"));
        assert_eq!(std::fs::read_to_string(dir.path().join("a.txt")).unwrap(), "new");
    }

    #[tokio::test]
    async fn test_write_outside_root_rejected() {
        let dir = TempDir::new().unwrap();
        let tool = WriteTool::with_project_root(dir.path());

        let result = tool
            .execute(&json!({"path": "../escape.txt", "content": "x"}))
            .await
            .unwrap();
        assert!(result.is_error);
        assert!(result.output.contains("outside the project root"));
        assert!(!dir.path().parent().unwrap().join("escape.txt").exists());
    }

    #[tokio::test]
    async fn test_write_sneaky_traversal_rejected() {
        let dir = TempDir::new().unwrap();
        let tool = WriteTool::with_project_root(dir.path());

        let result = tool
            .execute(&json!({"path": "sub/../../escape.txt", "content": "x"}))
            .await
            .unwrap();
        assert!(result.is_error);
    }
}
