//! Content search tool

use std::path::PathBuf;

use regex::RegexBuilder;
use serde_json::Value;

use crate::permissions::PermissionLevel;

use super::glob_tool;
use super::tool::{ParamKind, Tool, ToolDeclaration, ToolResult};

const MAX_MATCHES: usize = 50;
const MAX_LINE_DISPLAY: usize = 200;

const BINARY_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "ico", "pdf", "zip", "tar", "gz", "so", "dylib", "dll", "exe",
    "bin", "o", "a", "class", "pyc", "wasm", "woff", "woff2", "ttf",
];

/// Searches file contents for a regular expression
pub struct GrepTool {
    decl: ToolDeclaration,
    base_dir: PathBuf,
}

impl GrepTool {
    pub fn new() -> Self {
        Self::with_base_dir(std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
    }

    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            decl: ToolDeclaration::new(
                "grep",
                "Search file contents for a regular expression. Returns matching \
                 lines as path:line:text.",
                PermissionLevel::Auto,
            )
            .param("pattern", ParamKind::String, "Regular expression to search for", true)
            .param(
                "path",
                ParamKind::String,
                "Directory to search in, relative to the project root",
                false,
            )
            .param(
                "include",
                ParamKind::String,
                "Glob filter for file names (e.g. '*.rs')",
                false,
            )
            .param(
                "ignore_case",
                ParamKind::Boolean,
                "Case-insensitive search",
                false,
            ),
            base_dir: base_dir.into(),
        }
    }

    fn is_binary(path: &std::path::Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| BINARY_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
            .unwrap_or(false)
    }
}

impl Default for GrepTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Tool for GrepTool {
    fn declaration(&self) -> &ToolDeclaration {
        &self.decl
    }

    async fn execute(&self, arguments: &Value) -> anyhow::Result<ToolResult> {
        let pattern = arguments["pattern"].as_str().unwrap_or_default();
        let include = arguments["include"].as_str();
        let ignore_case = arguments["ignore_case"].as_bool().unwrap_or(false);

        if pattern.is_empty() {
            return Ok(ToolResult::error("pattern must not be empty"));
        }

        let regex = match RegexBuilder::new(pattern).case_insensitive(ignore_case).build() {
            Ok(r) => r,
            Err(e) => {
                return Ok(ToolResult::error(format!("Invalid pattern '{}': {}", pattern, e)));
            }
        };

        let include_filter = match include {
            Some(i) => match glob::Pattern::new(i) {
                Ok(p) => Some(p),
                Err(e) => {
                    return Ok(ToolResult::error(format!("Invalid include filter '{}': {}", i, e)));
                }
            },
            None => None,
        };

        let search_root = match arguments["path"].as_str() {
            Some(p) if std::path::Path::new(p).is_absolute() => PathBuf::from(p),
            Some(p) => self.base_dir.join(p),
            None => self.base_dir.clone(),
        };
        if !search_root.is_dir() {
            return Ok(ToolResult::error(format!(
                "Not a directory: {}",
                search_root.display()
            )));
        }

        let walk_pattern = search_root.join("**/*");
        let paths = match glob::glob(&walk_pattern.to_string_lossy()) {
            Ok(paths) => paths,
            Err(e) => return Ok(ToolResult::error(format!("Search failed: {}", e))),
        };

        let mut matches = Vec::new();
        let mut hit_limit = false;

        'files: for path in paths.filter_map(|p| p.ok()) {
            if !path.is_file() || glob_tool::GlobTool::skipped_path(&path) || Self::is_binary(&path) {
                continue;
            }
            if let Some(filter) = &include_filter {
                let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
                if !filter.matches(name) {
                    continue;
                }
            }

            // Binary content slips past the extension check sometimes
            let content = match std::fs::read_to_string(&path) {
                Ok(c) => c,
                Err(_) => continue,
            };

            let display = path
                .strip_prefix(&self.base_dir)
                .unwrap_or(&path)
                .display()
                .to_string();

            for (i, line) in content.lines().enumerate() {
                if regex.is_match(line) {
                    let shown = if line.len() > MAX_LINE_DISPLAY {
                        let mut cut = MAX_LINE_DISPLAY;
                        while !line.is_char_boundary(cut) {
                            cut -= 1;
                        }
                        format!("{}...", &line[..cut])
                    } else {
                        line.to_string()
                    };
                    matches.push(format!("{}:{}:{}", display, i + 1, shown.trim_end()));
                    if matches.len() >= MAX_MATCHES {
                        hit_limit = true;
                        break 'files;
                    }
                }
            }
        }

        if matches.is_empty() {
            return Ok(ToolResult::success(format!("No matches for '{}'", pattern)));
        }

        let mut output = matches.join("\n");
        if hit_limit {
            output.push_str(&format!("\n... (stopped at {} matches)", MAX_MATCHES));
        }

        Ok(ToolResult::success(output))
    }
}
