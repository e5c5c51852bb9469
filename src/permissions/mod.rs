//! Permission model
//!
//! Every tool call passes through the permission engine before it runs. The
//! engine combines the tool's declared permission level, the session's
//! operating mode, and earlier in-session approvals into a single decision.

mod engine;

pub use engine::{action_signature, ApprovalMemory, PermissionEngine};

use std::io;

/// How much scrutiny a tool needs before running
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionLevel {
    /// Read-only or otherwise harmless; runs without asking
    Auto,
    /// Mutates state; needs approval unless the mode grants it
    Ask,
}

/// Session-wide permission posture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OperatingMode {
    /// Prompt for every Ask-level tool
    #[default]
    Default,
    /// Auto-approve Ask-level tools
    Trust,
    /// Auto-approve everything that is not flagged dangerous
    Yolo,
}

impl OperatingMode {
    pub fn label(&self) -> &'static str {
        match self {
            OperatingMode::Default => "default",
            OperatingMode::Trust => "trust",
            OperatingMode::Yolo => "yolo",
        }
    }
}

/// Outcome of a permission check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PermissionDecision {
    Allow,
    Deny { reason: String },
    Prompt,
}

/// What the user chose at a prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptResolution {
    AllowOnce,
    /// Allow now and remember the action for the rest of the session
    AllowAlways,
    Deny,
}

/// What a prompter shows the user
#[derive(Debug, Clone)]
pub struct PermissionRequest {
    pub tool_name: String,
    pub action_description: String,
    pub details: Option<String>,
}

/// Asks the user to approve or refuse an action
///
/// An `Err` from the prompter is treated as a denial downstream; the check
/// fails closed.
pub trait PermissionPrompter: Send + Sync {
    fn resolve(&self, request: &PermissionRequest) -> io::Result<PromptResolution>;
}
