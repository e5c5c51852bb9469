//! File read tool

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::permissions::PermissionLevel;

use super::tool::{ParamKind, Tool, ToolDeclaration, ToolResult};

const DEFAULT_LINE_LIMIT: usize = 2000;
const MAX_LINE_LENGTH: usize = 2000;

/// Reads files with numbered lines, with optional offset and limit
pub struct ReadTool {
    decl: ToolDeclaration,
    base_dir: PathBuf,
}

impl ReadTool {
    pub fn new() -> Self {
        Self::with_base_dir(std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
    }

    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            decl: ToolDeclaration::new(
                "read_file",
                "Read a file from the filesystem. Returns numbered lines. \
                 Use offset and limit for large files.",
                PermissionLevel::Auto,
            )
            .param("path", ParamKind::String, "Path to the file to read", true)
            .param(
                "offset",
                ParamKind::Integer,
                "1-based line number to start reading from",
                false,
            )
            .param(
                "limit",
                ParamKind::Integer,
                "Maximum number of lines to return",
                false,
            ),
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

impl Default for ReadTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Tool for ReadTool {
    fn declaration(&self) -> &ToolDeclaration {
        &self.decl
    }

    async fn execute(&self, arguments: &Value) -> anyhow::Result<ToolResult> {
        let path = arguments["path"].as_str().unwrap_or_default();
        let offset = arguments["offset"].as_u64().map(|o| o as usize).unwrap_or(1);
        let limit = arguments["limit"]
            .as_u64()
            .map(|l| l as usize)
            .unwrap_or(DEFAULT_LINE_LIMIT);

        let full_path = self.resolve(path);

        if !full_path.exists() {
            return Ok(ToolResult::error(format!("File not found: {}", path)));
        }
        if !full_path.is_file() {
            return Ok(ToolResult::error(format!("Not a file: {}", path)));
        }

        let content = match tokio::fs::read_to_string(&full_path).await {
            Ok(c) => c,
            Err(e) => {
                return Ok(ToolResult::error(format!("Failed to read {}: {}", path, e)));
            }
        };

        let start = offset.saturating_sub(1);
        let mut lines = Vec::new();
        for (i, line) in content.lines().enumerate().skip(start).take(limit) {
            let line = if line.len() > MAX_LINE_LENGTH {
                let mut cut = MAX_LINE_LENGTH;
                while !line.is_char_boundary(cut) {
                    cut -= 1;
                }
                format!("{}... (line truncated)", &line[..cut])
            } else {
                line.to_string()
            };
            lines.push(format!("{:>6}\t{}", i + 1, line));
        }

        if lines.is_empty() {
            return Ok(ToolResult::success(format!(
                "{} is empty or offset is past the end of the file",
                path
            )));
        }

        let total = content.lines().count();
        let mut output = lines.join("\n");
        if start + limit < total {
            output.push_str(&format!(
                "\n... ({} more lines, use offset to continue)",
                total - start - limit
            ));
        }

        Ok(ToolResult::success(output))
    }
}
