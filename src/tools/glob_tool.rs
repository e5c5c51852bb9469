//! File pattern matching tool

use std::path::PathBuf;
use std::time::SystemTime;

use serde_json::Value;

use crate::permissions::PermissionLevel;

use super::tool::{ParamKind, Tool, ToolDeclaration, ToolResult};

const MAX_RESULTS: usize = 100;

/// Directories that never contain anything worth matching
const SKIP_DIRS: &[&str] = &[
    ".git",
    "node_modules",
    "target",
    "__pycache__",
    ".venv",
    "venv",
    "dist",
    "build",
    ".idea",
    ".vscode",
];

/// Finds files matching a glob pattern, newest first
pub struct GlobTool {
    decl: ToolDeclaration,
    base_dir: PathBuf,
}

impl GlobTool {
    pub fn new() -> Self {
        Self::with_base_dir(std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
    }

    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            decl: ToolDeclaration::new(
                "glob",
                "Find files matching a glob pattern (e.g. '**/*.rs', 'src/*.toml'). \
                 Results are sorted by modification time, newest first.",
                PermissionLevel::Auto,
            )
            .param("pattern", ParamKind::String, "Glob pattern to match", true)
            .param(
                "path",
                ParamKind::String,
                "Directory to search in, relative to the project root",
                false,
            ),
            base_dir: base_dir.into(),
        }
    }

    fn search_root(&self, path: Option<&str>) -> PathBuf {
        match path {
            Some(p) if std::path::Path::new(p).is_absolute() => PathBuf::from(p),
            Some(p) => self.base_dir.join(p),
            None => self.base_dir.clone(),
        }
    }

    pub(crate) fn skipped_path(path: &std::path::Path) -> bool {
        path.components().any(|c| {
            c.as_os_str()
                .to_str()
                .map(|s| SKIP_DIRS.contains(&s))
                .unwrap_or(false)
        })
    }
}

impl Default for GlobTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Tool for GlobTool {
    fn declaration(&self) -> &ToolDeclaration {
        &self.decl
    }

    async fn execute(&self, arguments: &Value) -> anyhow::Result<ToolResult> {
        let pattern = arguments["pattern"].as_str().unwrap_or_default();
        if pattern.is_empty() {
            return Ok(ToolResult::error("pattern must not be empty"));
        }

        let search_root = self.search_root(arguments["path"].as_str());
        if !search_root.is_dir() {
            return Ok(ToolResult::error(format!(
                "Not a directory: {}",
                search_root.display()
            )));
        }
        let full_pattern = search_root.join(pattern);
        let full_pattern = full_pattern.to_string_lossy();

        let paths = match glob::glob(&full_pattern) {
            Ok(paths) => paths,
            Err(e) => {
                return Ok(ToolResult::error(format!("Invalid pattern '{}': {}", pattern, e)));
            }
        };

        let mut matches: Vec<(PathBuf, SystemTime)> = paths
            .filter_map(|entry| entry.ok())
            .filter(|p| p.is_file() && !Self::skipped_path(p))
            .map(|p| {
                let mtime = p
                    .metadata()
                    .and_then(|m| m.modified())
                    .unwrap_or(SystemTime::UNIX_EPOCH);
                (p, mtime)
            })
            .collect();

        matches.sort_by(|a, b| b.1.cmp(&a.1));

        if matches.is_empty() {
            return Ok(ToolResult::success(format!("No files match '{}'", pattern)));
        }

        let truncated = matches.len() > MAX_RESULTS;
        let mut lines: Vec<String> = matches
            .into_iter()
            .take(MAX_RESULTS)
            .map(|(p, _)| {
                p.strip_prefix(&self.base_dir)
                    .unwrap_or(&p)
                    .display()
                    .to_string()
            })
            .collect();

        if truncated {
            lines.push(format!("... (showing first {} matches)", MAX_RESULTS));
        }

        Ok(ToolResult::success(lines.join("\n")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_glob_matches_pattern() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.rs"), "").unwrap();
        std::fs::write(dir.path().join("b.rs"), "").unwrap();
        std::fs::write(dir.path().join("c.txt"), "").unwrap();

        let tool = GlobTool::with_base_dir(dir.path());
        let result = tool.execute(&json!({"pattern": "*.rs"})).await.unwrap();
        assert!(!result.is_error);
        assert!(result.output.contains("a.rs"));
        assert!(result.output.contains("b.rs"));
        assert!(!result.output.contains("c.txt"));
    }

    #[tokio::test]
    async fn test_glob_skips_vendor_dirs() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("node_modules/pkg")).unwrap();
        std::fs::write(dir.path().join("node_modules/pkg/x.js"), "").unwrap();
        std::fs::write(dir.path().join("y.js"), "").unwrap();

        let tool = GlobTool::with_base_dir(dir.path());
        let result = tool.execute(&json!({"pattern": "**/*.js"})).await.unwrap();
        assert!(result.output.contains("y.js"));
        assert!(!result.output.contains("node_modules"));
    }

    #[tokio::test]
    async fn test_glob_scoped_to_path() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("top.rs"), "").unwrap();
        std::fs::write(dir.path().join("sub/inner.rs"), "").unwrap();

        let tool = GlobTool::with_base_dir(dir.path());
        let result = tool
            .execute(&json!({"pattern": "*.rs", "path": "sub"}))
            .await
            .unwrap();
        assert!(result.output.contains("inner.rs"));
        assert!(!result.output.contains("top.rs"));
    }

    #[tokio::test]
    async fn test_glob_missing_path_rejected() {
        let dir = TempDir::new().unwrap();
        let tool = GlobTool::with_base_dir(dir.path());
        let result = tool
            .execute(&json!({"pattern": "*.rs", "path": "nope"}))
            .await
            .unwrap();
        assert!(result.is_error);
        assert!(result.output.contains("Not a directory"));
    }

    #[tokio::test]
    async fn test_glob_no_matches() {
        let dir = TempDir::new().unwrap();
        let tool = GlobTool::with_base_dir(dir.path());
        let result = tool.execute(&json!({"pattern": "*.zig"})).await.unwrap();
        assert!(!result.is_error);
        assert!(result.output.contains("No files match"));
    }
}
