//! Terminal rendering and interactive prompts

use std::io::{self, BufRead, Write};

use colored::Colorize;
use serde_json::Value;

use crate::agent::AgentObserver;
use crate::permissions::{
    OperatingMode, PermissionPrompter, PermissionRequest, PromptResolution,
};
use crate::tools::ToolResult;

const RESULT_PREVIEW_LINES: usize = 6;

/// Renders agent output and reads user input from the terminal
#[derive(Clone, Default)]
pub struct Console;

impl Console {
    pub fn new() -> Self {
        Self
    }

    pub fn print_banner(&self, model: &str, mode: OperatingMode, version: &str) {
        println!();
        println!("{}", format!("  korvo v{}", version).bold());
        println!("  model: {}  mode: {}", model.cyan(), mode.label().yellow());
        println!();
    }

    pub fn print_assistant(&self, text: &str) {
        println!("{}", text);
    }

    pub fn print_tool_call(&self, name: &str, arguments: &Value) {
        let summary = match name {
            "bash" => arguments["command"].as_str().unwrap_or("").to_string(),
            "read_file" | "write_file" | "edit_file" => {
                arguments["path"].as_str().unwrap_or("").to_string()
            }
            "glob" | "grep" => arguments["pattern"].as_str().unwrap_or("").to_string(),
            _ => arguments.to_string(),
        };
        println!("{} {}({})", "•".blue(), name.blue().bold(), summary.dimmed());
    }

    pub fn print_tool_result(&self, result: &ToolResult) {
        let lines: Vec<&str> = result.output.lines().collect();
        let shown = lines.len().min(RESULT_PREVIEW_LINES);
        for line in &lines[..shown] {
            if result.is_error {
                println!("  {}", line.red());
            } else {
                println!("  {}", line.dimmed());
            }
        }
        if lines.len() > shown {
            println!("  {}", format!("... ({} more lines)", lines.len() - shown).dimmed());
        }
    }

    pub fn print_error(&self, message: &str) {
        eprintln!("{} {}", "error:".red().bold(), message);
    }

    pub fn print_system(&self, message: &str) {
        println!("{}", message.dimmed());
    }

    pub fn print_status(&self, model: &str, mode: OperatingMode, turn: usize, max_turns: usize) {
        println!("model: {}", model);
        println!("mode: {}", mode.label());
        println!("turns used: {}/{}", turn, max_turns);
    }

    pub fn print_help(&self) {
        println!("commands:");
        println!("  quit, exit, q   leave the session");
        println!("  clear           start a fresh conversation");
        println!("  /status         show session info");
        println!("  help            show this message");
    }

    pub fn print_goodbye(&self) {
        println!("{}", "bye".dimmed());
    }

    /// Read one line of input, None on EOF
    pub fn read_input(&self, prompt: &str) -> io::Result<Option<String>> {
        print!("{} ", prompt.green().bold());
        io::stdout().flush()?;

        let mut line = String::new();
        let n = io::stdin().lock().read_line(&mut line)?;
        if n == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }
}

impl PermissionPrompter for Console {
    fn resolve(&self, request: &PermissionRequest) -> io::Result<PromptResolution> {
        println!();
        println!(
            "{} {}",
            "permission:".yellow().bold(),
            request.action_description
        );
        if let Some(details) = &request.details {
            println!("  {}", details.dimmed());
        }
        print!("  allow? {} ", "[y]es / [n]o / [a]lways:".dimmed());
        io::stdout().flush()?;

        let mut line = String::new();
        let n = io::stdin().lock().read_line(&mut line)?;
        if n == 0 {
            // EOF counts as a refusal
            return Ok(PromptResolution::Deny);
        }

        match line.trim().to_ascii_lowercase().as_str() {
            "y" | "yes" => Ok(PromptResolution::AllowOnce),
            "a" | "always" => Ok(PromptResolution::AllowAlways),
            _ => Ok(PromptResolution::Deny),
        }
    }
}

impl AgentObserver for Console {
    fn on_assistant_text(&self, text: &str) {
        self.print_assistant(text);
    }

    fn on_tool_call(&self, name: &str, arguments: &Value) {
        self.print_tool_call(name, arguments);
    }

    fn on_tool_result(&self, _name: &str, result: &ToolResult) {
        self.print_tool_result(result);
    }
}
