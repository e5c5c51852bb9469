//! Conversation persistence
//!
//! Each session lives in its own directory under the history root:
//! `metadata.json` for summary fields and `history.jsonl` with one message
//! per line.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::llm::Message;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub message_count: usize,
    #[serde(default)]
    pub first_task: String,
}

/// Filesystem-backed conversation store
pub struct ConversationStore {
    base_dir: PathBuf,
}

impl ConversationStore {
    /// Store under the default location, `~/.korvo/history`
    pub fn new() -> Result<Self> {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        Ok(Self::with_dir(PathBuf::from(home).join(".korvo").join("history")))
    }

    pub fn with_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    fn session_dir(&self, id: &str) -> PathBuf {
        self.base_dir.join(id)
    }

    /// Persist a session, replacing any previous snapshot of it
    pub fn save(&self, id: &str, messages: &[Message]) -> Result<()> {
        let dir = self.session_dir(id);
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create session directory {}", dir.display()))?;

        let now = Utc::now();
        let metadata_path = dir.join("metadata.json");
        let created_at = std::fs::read_to_string(&metadata_path)
            .ok()
            .and_then(|s| serde_json::from_str::<SessionSummary>(&s).ok())
            .map(|m| m.created_at)
            .unwrap_or(now);

        let first_task = messages
            .iter()
            .find(|m| m.role == crate::llm::Role::User)
            .map(|m| {
                let mut t: String = m.content.chars().take(80).collect();
                if m.content.chars().count() > 80 {
                    t.push_str("...");
                }
                t
            })
            .unwrap_or_default();

        let summary = SessionSummary {
            id: id.to_string(),
            created_at,
            updated_at: now,
            message_count: messages.len(),
            first_task,
        };

        std::fs::write(&metadata_path, serde_json::to_string_pretty(&summary)?)
            .with_context(|| format!("failed to write {}", metadata_path.display()))?;

        let mut lines = String::new();
        for message in messages {
            lines.push_str(&serde_json::to_string(message)?);
            lines.push('\n');
        }
        let history_path = dir.join("history.jsonl");
        std::fs::write(&history_path, lines)
            .with_context(|| format!("failed to write {}", history_path.display()))?;

        tracing::debug!("[Store] Saved session {} ({} messages)", id, messages.len());
        Ok(())
    }

    pub fn load_messages(&self, id: &str) -> Result<Vec<Message>> {
        let path = self.session_dir(id).join("history.jsonl");
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;

        let mut messages = Vec::new();
        for line in content.lines().filter(|l| !l.trim().is_empty()) {
            messages.push(
                serde_json::from_str(line)
                    .with_context(|| format!("corrupt history line in session {}", id))?,
            );
        }
        Ok(messages)
    }

    pub fn session_exists(&self, id: &str) -> bool {
        self.session_dir(id).join("history.jsonl").is_file()
    }

    /// List stored sessions, most recently updated first
    pub fn list_sessions(&self) -> Result<Vec<SessionSummary>> {
        let mut summaries = Vec::new();
        let entries = match std::fs::read_dir(&self.base_dir) {
            Ok(e) => e,
            Err(_) => return Ok(summaries),
        };

        for entry in entries.filter_map(|e| e.ok()) {
            let metadata_path = entry.path().join("metadata.json");
            if let Ok(content) = std::fs::read_to_string(&metadata_path) {
                match serde_json::from_str::<SessionSummary>(&content) {
                    Ok(summary) => summaries.push(summary),
                    Err(e) => {
                        tracing::warn!(
                            "[Store] Skipping corrupt metadata {}: {}",
                            metadata_path.display(),
                            e
                        );
                    }
                }
            }
        }

        summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(summaries)
    }

    pub fn delete(&self, id: &str) -> Result<()> {
        let dir = self.session_dir(id);
        std::fs::remove_dir_all(&dir)
            .with_context(|| format!("failed to delete session {}", id))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let store = ConversationStore::with_dir(dir.path());

        let messages = vec![
            Message::system("be helpful"),
            Message::user("fix the bug in main.rs"),
            Message::assistant("done"),
        ];
        store.save("abc", &messages).unwrap();

        assert!(store.session_exists("abc"));
        let loaded = store.load_messages("abc").unwrap();
        assert_eq!(loaded.len(), 3);
        assert_eq!(loaded[1].content, "fix the bug in main.rs");
    }

    #[test]
    fn test_list_sessions_includes_first_task() {
        let dir = TempDir::new().unwrap();
        let store = ConversationStore::with_dir(dir.path());

        store
            .save("s1", &[Message::user("add tests")])
            .unwrap();

        let sessions = store.list_sessions().unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].id, "s1");
        assert_eq!(sessions[0].first_task, "add tests");
        assert_eq!(sessions[0].message_count, 1);
    }

    #[test]
    fn test_list_empty_store() {
        let dir = TempDir::new().unwrap();
        let store = ConversationStore::with_dir(dir.path().join("missing"));
        assert!(store.list_sessions().unwrap().is_empty());
    }

    #[test]
    fn test_delete_session() {
        let dir = TempDir::new().unwrap();
        let store = ConversationStore::with_dir(dir.path());
        store.save("gone", &[Message::user("task")]).unwrap();
        store.delete("gone").unwrap();
        assert!(!store.session_exists("gone"));
    }

    #[test]
    fn test_save_preserves_created_at() {
        let dir = TempDir::new().unwrap();
        let store = ConversationStore::with_dir(dir.path());

        store.save("s", &[Message::user("one")]).unwrap();
        let first = store.list_sessions().unwrap()[0].created_at;

        store
            .save("s", &[Message::user("one"), Message::assistant("two")])
            .unwrap();
        let after = &store.list_sessions().unwrap()[0];
        assert_eq!(after.created_at, first);
        assert_eq!(after.message_count, 2);
    }
}
