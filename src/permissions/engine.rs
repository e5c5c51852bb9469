//! Permission decision engine

use std::collections::HashSet;

use regex::{Regex, RegexBuilder};
use serde_json::Value;

use super::{OperatingMode, PermissionDecision, PermissionLevel};

/// Command patterns refused in every mode, including yolo
const DANGER_PATTERNS: &[(&str, &str)] = &[
    (r"rm\s+(-[a-zA-Z]*\s+)*(-[a-zA-Z]*r[a-zA-Z]*f|-[a-zA-Z]*f[a-zA-Z]*r)[a-zA-Z]*\s+(/|~|\*)", "recursive force-delete of a root path"),
    (r"rm\s+-rf?\s+(/|~)\s*$", "recursive delete of a root path"),
    (r"\bsudo\b", "privilege escalation"),
    (r"chmod\s+777\b", "world-writable permissions"),
    (r">\s*/dev/sd[a-z]", "raw write to a block device"),
    (r"\bdd\b.*\bof=/dev/", "raw write to a block device"),
    (r"\bmkfs\.", "filesystem format"),
    (r"curl\b[^|]*\|\s*(ba)?sh", "piping a download into a shell"),
    (r"wget\b[^|]*\|\s*(ba)?sh", "piping a download into a shell"),
    (r":\(\)\s*\{.*\};\s*:", "fork bomb"),
];

/// Remembers in-session "allow always" approvals by action signature
#[derive(Debug, Default, Clone)]
pub struct ApprovalMemory {
    approved: HashSet<String>,
}

impl ApprovalMemory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn remember(&mut self, signature: impl Into<String>) {
        self.approved.insert(signature.into());
    }

    pub fn contains(&self, signature: &str) -> bool {
        self.approved.contains(signature)
    }

    pub fn clear(&mut self) {
        self.approved.clear();
    }

    pub fn len(&self) -> usize {
        self.approved.len()
    }

    pub fn is_empty(&self) -> bool {
        self.approved.is_empty()
    }
}

/// Normalized signature for an action, used as the approval-memory key
///
/// Bash commands are keyed by their first word so approving `cargo build`
/// also covers `cargo test`; file mutations are keyed by tool and path.
pub fn action_signature(tool_name: &str, arguments: &Value) -> String {
    match tool_name {
        "bash" => {
            let command = arguments["command"].as_str().unwrap_or_default();
            let head = command.split_whitespace().next().unwrap_or_default();
            format!("bash:{}", head)
        }
        "write_file" | "edit_file" => {
            let path = arguments["path"].as_str().unwrap_or_default();
            format!("{}:{}", tool_name, path)
        }
        other => other.to_string(),
    }
}

/// Decides whether a tool call may run
pub struct PermissionEngine {
    mode: OperatingMode,
    danger: Vec<(Regex, &'static str)>,
}

impl PermissionEngine {
    pub fn new(mode: OperatingMode) -> Self {
        // Case-insensitive so obfuscated casing does not slip past
        let danger = DANGER_PATTERNS
            .iter()
            .filter_map(|(pattern, reason)| {
                RegexBuilder::new(pattern)
                    .case_insensitive(true)
                    .build()
                    .ok()
                    .map(|re| (re, *reason))
            })
            .collect();
        Self { mode, danger }
    }

    pub fn mode(&self) -> OperatingMode {
        self.mode
    }

    /// Check a bash command against the danger list
    pub fn danger_reason(&self, command: &str) -> Option<&'static str> {
        self.danger
            .iter()
            .find(|(re, _)| re.is_match(command))
            .map(|(_, reason)| *reason)
    }

    /// Decide whether a tool call may run
    ///
    /// Dangerous bash commands are denied in every mode. Anything the engine
    /// cannot positively allow or send to a prompt is denied.
    pub fn decide(
        &self,
        tool_name: &str,
        level: PermissionLevel,
        arguments: &Value,
        approvals: &ApprovalMemory,
    ) -> PermissionDecision {
        if tool_name == "bash" {
            let command = arguments["command"].as_str().unwrap_or_default();
            if let Some(reason) = self.danger_reason(command) {
                tracing::warn!("[Permissions] Refused dangerous command ({}): {}", reason, command);
                return PermissionDecision::Deny {
                    reason: format!("dangerous command refused: {}", reason),
                };
            }
        }

        let decision = match level {
            PermissionLevel::Auto => Some(PermissionDecision::Allow),
            PermissionLevel::Ask => {
                if approvals.contains(&action_signature(tool_name, arguments)) {
                    Some(PermissionDecision::Allow)
                } else {
                    match self.mode {
                        OperatingMode::Trust | OperatingMode::Yolo => {
                            Some(PermissionDecision::Allow)
                        }
                        OperatingMode::Default => Some(PermissionDecision::Prompt),
                    }
                }
            }
        };

        decision.unwrap_or(PermissionDecision::Deny {
            reason: "no permission rule matched".to_string(),
        })
    }
}
