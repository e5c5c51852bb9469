//! In-memory session state

use uuid::Uuid;

use crate::llm::{Message, Role};
use crate::permissions::ApprovalMemory;

/// History size (total content characters) beyond which older messages are
/// summarized away
const COMPACTION_CHAR_BUDGET: usize = 100_000;

/// Most recent messages kept verbatim through a compaction
const KEEP_RECENT_MESSAGES: usize = 8;

/// Conversation history, turn accounting, and approval memory for one session
#[derive(Debug, Clone)]
pub struct SessionState {
    id: String,
    messages: Vec<Message>,
    turn: usize,
    max_turns: usize,
    pub approvals: ApprovalMemory,
}

impl SessionState {
    pub fn new(max_turns: usize, system_prompt: Option<String>) -> Self {
        let mut messages = Vec::new();
        if let Some(prompt) = system_prompt {
            messages.push(Message::system(prompt));
        }
        Self {
            id: Uuid::new_v4().to_string(),
            messages,
            turn: 0,
            max_turns,
            approvals: ApprovalMemory::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn turn(&self) -> usize {
        self.turn
    }

    pub fn max_turns(&self) -> usize {
        self.max_turns
    }

    /// Consume one turn of budget; false when the budget is spent
    pub fn begin_turn(&mut self) -> bool {
        if self.turn >= self.max_turns {
            return false;
        }
        self.turn += 1;
        true
    }

    /// Reset the turn counter for a fresh task in the same session
    pub fn reset_turns(&mut self) {
        self.turn = 0;
    }

    /// Drop the conversation, keeping the system prompt and approvals
    pub fn clear(&mut self) {
        self.messages.retain(|m| m.role == Role::System);
        self.turn = 0;
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    /// Adopt a stored conversation, replacing this session's identity and
    /// history
    pub fn load_history(&mut self, id: impl Into<String>, messages: Vec<Message>) {
        self.id = id.into();
        self.messages = messages;
        self.turn = 0;
    }

    /// Index before which history should be summarized, or None if the
    /// conversation is still small enough
    ///
    /// The kept suffix never starts with a tool result, so a tool-call
    /// request and its results are always compacted or kept together.
    pub fn compaction_plan(&self) -> Option<usize> {
        let total: usize = self.messages.iter().map(|m| m.content.len()).sum();
        if total < COMPACTION_CHAR_BUDGET {
            return None;
        }

        let start = usize::from(matches!(
            self.messages.first(),
            Some(m) if m.role == Role::System
        ));
        if self.messages.len() <= start + KEEP_RECENT_MESSAGES {
            return None;
        }

        let mut cut = self.messages.len() - KEEP_RECENT_MESSAGES;
        while cut > start && self.messages[cut].role == Role::Tool {
            cut -= 1;
        }
        (cut > start).then_some(cut)
    }

    /// Replace messages before `cut` with a summary, keeping the system
    /// prompt and the recent suffix
    pub fn apply_compaction(&mut self, cut: usize, summary: impl Into<String>) {
        let suffix = self.messages.split_off(cut);
        let system = self
            .messages
            .first()
            .filter(|m| m.role == Role::System)
            .cloned();

        self.messages.clear();
        if let Some(system) = system {
            self.messages.push(system);
        }
        self.messages.push(Message::user(format!(
            "Summary of the conversation so far:\n{}",
            summary.into()
        )));
        self.messages.extend(suffix);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turn_budget() {
        let mut session = SessionState::new(2, None);
        assert!(session.begin_turn());
        assert!(session.begin_turn());
        assert!(!session.begin_turn());
        assert_eq!(session.turn(), 2);

        session.reset_turns();
        assert!(session.begin_turn());
    }

    #[test]
    fn test_clear_keeps_system_prompt() {
        let mut session = SessionState::new(10, Some("You are an assistant.".to_string()));
        session.push(Message::user("hello"));
        session.push(Message::assistant("hi"));
        assert_eq!(session.message_count(), 3);

        session.clear();
        assert_eq!(session.message_count(), 1);
        assert_eq!(session.messages()[0].role, Role::System);
    }

    #[test]
    fn test_sessions_get_unique_ids() {
        let a = SessionState::new(1, None);
        let b = SessionState::new(1, None);
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_load_history_adopts_stored_conversation() {
        let mut session = SessionState::new(10, Some("fresh prompt".to_string()));
        session.push(Message::user("new task"));

        session.load_history(
            "stored-id",
            vec![Message::system("old prompt"), Message::user("old task")],
        );
        assert_eq!(session.id(), "stored-id");
        assert_eq!(session.message_count(), 2);
        assert_eq!(session.messages()[1].content, "old task");
        assert_eq!(session.turn(), 0);
    }

    #[test]
    fn test_small_conversation_needs_no_compaction() {
        let mut session = SessionState::new(50, Some("sys".to_string()));
        for _ in 0..20 {
            session.push(Message::user("short"));
        }
        assert!(session.compaction_plan().is_none());
    }

    #[test]
    fn test_compaction_plan_keeps_tool_pairs_together() {
        use crate::llm::ToolCallRequest;
        use serde_json::json;

        let mut session = SessionState::new(50, Some("sys".to_string()));
        session.push(Message::user("x".repeat(150_000)));
        for _ in 0..3 {
            session.push(Message::user("go on"));
        }
        // An assistant tool-call request followed by its results, positioned
        // so a naive cut would land between them
        session.push(Message::assistant_with_tool_calls(
            "",
            vec![ToolCallRequest::new("c1", "read_file", json!({"path": "a"}))],
        ));
        session.push(Message::tool_result("c1", "contents"));
        for _ in 0..7 {
            session.push(Message::assistant("working"));
        }

        let cut = session.compaction_plan().unwrap();
        assert_ne!(session.messages()[cut].role, Role::Tool);
        // Everything before the cut is summarizable, and there is something
        // to summarize
        assert!(cut > 1);
    }

    #[test]
    fn test_apply_compaction_keeps_system_and_suffix() {
        let mut session = SessionState::new(50, Some("sys".to_string()));
        session.push(Message::user("x".repeat(150_000)));
        for i in 0..12 {
            session.push(Message::assistant(format!("step {}", i)));
        }

        let cut = session.compaction_plan().unwrap();
        let kept_after = session.message_count() - cut;
        session.apply_compaction(cut, "earlier work summarized");

        assert_eq!(session.messages()[0].role, Role::System);
        assert!(session.messages()[1]
            .content
            .contains("earlier work summarized"));
        assert_eq!(session.message_count(), 2 + kept_after);
        assert!(session.compaction_plan().is_none());
    }
}
