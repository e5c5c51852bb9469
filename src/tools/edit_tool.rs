//! File edit tool

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::permissions::PermissionLevel;

use super::tool::{ParamKind, Tool, ToolDeclaration, ToolResult};

/// Replaces an exact string in a file
///
/// The old string must appear exactly once; zero or multiple occurrences
/// leave the file untouched.
pub struct EditTool {
    decl: ToolDeclaration,
    base_dir: PathBuf,
}

impl EditTool {
    pub fn new() -> Self {
        Self::with_base_dir(std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
    }

    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            decl: ToolDeclaration::new(
                "edit_file",
                "Replace an exact string in a file. The old string must match \
                 exactly once; include enough surrounding context to make it unique.",
                PermissionLevel::Ask,
            )
            .param("path", ParamKind::String, "Path to the file to edit", true)
            .param("old_string", ParamKind::String, "Exact text to replace", true)
            .param("new_string", ParamKind::String, "Replacement text", true),
            base_dir: base_dir.into(),
        }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        let p = Path::new(path);
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            self.base_dir.join(p)
        }
    }
}

impl Default for EditTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Tool for EditTool {
    fn declaration(&self) -> &ToolDeclaration {
        &self.decl
    }

    async fn execute(&self, arguments: &Value) -> anyhow::Result<ToolResult> {
        let path = arguments["path"].as_str().unwrap_or_default();
        let old_string = arguments["old_string"].as_str().unwrap_or_default();
        let new_string = arguments["new_string"].as_str().unwrap_or_default();

        if old_string.is_empty() {
            return Ok(ToolResult::error("old_string must not be empty"));
        }
        if old_string == new_string {
            return Ok(ToolResult::error("old_string and new_string are identical"));
        }

        let full_path = self.resolve(path);
        if !full_path.is_file() {
            return Ok(ToolResult::error(format!("File not found: {}", path)));
        }

        let content = match tokio::fs::read_to_string(&full_path).await {
            Ok(c) => c,
            Err(e) => {
                return Ok(ToolResult::error(format!("Failed to read {}: {}", path, e)));
            }
        };

        let occurrences = content.matches(old_string).count();
        match occurrences {
            0 => {
                return Ok(ToolResult::error(format!(
                    "old_string not found in {}",
                    path
                )));
            }
            1 => {}
            n => {
                return Ok(ToolResult::error(format!(
                    "old_string matches {} times in {}; add surrounding context to make it unique",
                    n, path
                )));
            }
        }

        let updated = content.replacen(old_string, new_string, 1);
        if let Err(e) = tokio::fs::write(&full_path, updated).await {
            return Ok(ToolResult::error(format!("Failed to write {}: {}", path, e)));
        }

        Ok(ToolResult::success(format!("Edited {}", path)))
    }
}
