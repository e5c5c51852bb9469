//! Shell command tool

use std::path::PathBuf;
use std::time::Duration;

use serde_json::Value;
use tokio::process::Command;

use crate::permissions::PermissionLevel;

use super::tool::{ParamKind, Tool, ToolDeclaration, ToolResult};

const DEFAULT_TIMEOUT_SECS: u64 = 120;
const MAX_TIMEOUT_SECS: u64 = 600;
const MAX_OUTPUT_CHARS: usize = 50_000;

/// Runs shell commands with a timeout and bounded output
pub struct BashTool {
    decl: ToolDeclaration,
    working_dir: PathBuf,
}

impl BashTool {
    pub fn new() -> Self {
        Self::with_working_dir(std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
    }

    pub fn with_working_dir(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            decl: ToolDeclaration::new(
                "bash",
                "Run a shell command and return its combined stdout and stderr. \
                 Commands run in the project directory.",
                PermissionLevel::Ask,
            )
            .param("command", ParamKind::String, "Shell command to run", true)
            .param(
                "timeout",
                ParamKind::Integer,
                "Timeout in seconds (default 120, max 600)",
                false,
            ),
            working_dir: working_dir.into(),
        }
    }
}

impl Default for BashTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Tool for BashTool {
    fn declaration(&self) -> &ToolDeclaration {
        &self.decl
    }

    async fn execute(&self, arguments: &Value) -> anyhow::Result<ToolResult> {
        let command = arguments["command"].as_str().unwrap_or_default();
        if command.trim().is_empty() {
            return Ok(ToolResult::error("command must not be empty"));
        }

        let timeout_secs = arguments["timeout"]
            .as_u64()
            .unwrap_or(DEFAULT_TIMEOUT_SECS)
            .min(MAX_TIMEOUT_SECS);

        tracing::debug!("[Bash] Running: {}", command);

        let output = tokio::time::timeout(
            Duration::from_secs(timeout_secs),
            Command::new("bash")
                .arg("-c")
                .arg(command)
                .current_dir(&self.working_dir)
                .kill_on_drop(true)
                .output(),
        )
        .await;

        let output = match output {
            Ok(Ok(o)) => o,
            Ok(Err(e)) => {
                return Ok(ToolResult::error(format!("Failed to run command: {}", e)));
            }
            Err(_) => {
                return Ok(ToolResult::error(format!(
                    "Command timed out after {}s",
                    timeout_secs
                )));
            }
        };

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.is_empty() {
            if !combined.is_empty() && !combined.ends_with('\n') {
                combined.push('\n');
            }
            combined.push_str(&stderr);
        }

        if combined.len() > MAX_OUTPUT_CHARS {
            let mut cut = MAX_OUTPUT_CHARS;
            while !combined.is_char_boundary(cut) {
                cut -= 1;
            }
            combined.truncate(cut);
            combined.push_str("\n... (output truncated)");
        }

        if output.status.success() {
            if combined.trim().is_empty() {
                combined = "(no output)".to_string();
            }
            Ok(ToolResult::success(combined))
        } else {
            let code = output
                .status
                .code()
                .map(|c| c.to_string())
                .unwrap_or_else(|| "signal".to_string());
            Ok(ToolResult::error(format!(
                "Command exited with status {}\n{}",
                code, combined
            )))
        }
    }
}
