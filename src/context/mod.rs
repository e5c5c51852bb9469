//! Project context discovery
//!
//! Gathers the working directory, project instructions from `KORVO.md`, and
//! git state into the system prompt.

use std::path::{Path, PathBuf};
use std::process::Command;

pub const CONTEXT_FILE: &str = "KORVO.md";

const ROOT_INDICATORS: &[&str] = &[
    ".git",
    CONTEXT_FILE,
    "Cargo.toml",
    "package.json",
    "pyproject.toml",
    "go.mod",
];

/// What we know about the project the agent is working in
#[derive(Debug, Clone, Default)]
pub struct ProjectContext {
    pub working_dir: PathBuf,
    pub context_md: Option<String>,
    pub git_branch: Option<String>,
    pub git_repo: bool,
}

impl ProjectContext {
    /// Discover context starting from a directory
    pub fn discover(start: impl AsRef<Path>) -> Self {
        let start = start.as_ref();
        let root = find_project_root(start).unwrap_or_else(|| start.to_path_buf());

        let context_md = std::fs::read_to_string(root.join(CONTEXT_FILE))
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let git_repo = root.join(".git").exists();
        let git_branch = if git_repo { current_branch(&root) } else { None };

        tracing::debug!(
            "[Context] root={} context_md={} branch={:?}",
            root.display(),
            context_md.is_some(),
            git_branch
        );

        Self {
            working_dir: root,
            context_md,
            git_branch,
            git_repo,
        }
    }

    /// Context with nothing but the working directory
    pub fn empty(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
            ..Default::default()
        }
    }

    /// Render the system prompt for this project
    pub fn build_system_prompt(&self) -> String {
        let mut prompt = String::from(
            "You are Korvo, an autonomous coding assistant working in the user's \
             project directory. Use the available tools to inspect and modify the \
             project. Read files before editing them. Prefer small, focused edits. \
             When the task is complete, reply with a short summary and no tool calls.",
        );

        prompt.push_str(&format!(
            "\n\nWorking directory: {}",
            self.working_dir.display()
        ));

        if self.git_repo {
            match &self.git_branch {
                Some(branch) => prompt.push_str(&format!("\nGit branch: {}", branch)),
                None => prompt.push_str("\nGit repository (detached HEAD)"),
            }
        }

        if let Some(instructions) = &self.context_md {
            prompt.push_str("\n\nProject instructions (from KORVO.md):\n");
            prompt.push_str(instructions);
        }

        prompt
    }
}

/// Walk upward looking for a directory that looks like a project root
pub fn find_project_root(start: &Path) -> Option<PathBuf> {
    let mut dir = Some(start);
    while let Some(d) = dir {
        if ROOT_INDICATORS.iter().any(|i| d.join(i).exists()) {
            return Some(d.to_path_buf());
        }
        dir = d.parent();
    }
    None
}

fn current_branch(root: &Path) -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--abbrev-ref", "HEAD"])
        .current_dir(root)
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let branch = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!branch.is_empty() && branch != "HEAD").then_some(branch)
}
