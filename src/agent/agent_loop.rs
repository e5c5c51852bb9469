//! The agent execution loop
//!
//! Each turn sends the conversation to the model, then runs any requested
//! tool calls in order. Every tool call request receives exactly one result
//! message before the next model call, including denials, faults, and
//! interruptions.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::core::{AgentError, TaskOutcome};
use crate::llm::{Message, ModelError, ModelProvider, ModelResponse, Role, ToolCallRequest};
use crate::permissions::{
    action_signature, PermissionDecision, PermissionEngine, PermissionPrompter, PermissionRequest,
    PromptResolution,
};
use crate::session::SessionState;
use crate::tools::{ToolRegistry, ToolResult};

use super::config::AgentConfig;
use super::observer::AgentObserver;

const MODEL_RETRY_ATTEMPTS: u32 = 3;
const MODEL_RETRY_BASE_MS: u64 = 500;

/// Drives a session to completion against a model provider
pub struct Agent {
    provider: Arc<dyn ModelProvider>,
    registry: ToolRegistry,
    engine: PermissionEngine,
    prompter: Arc<dyn PermissionPrompter>,
    observer: Arc<dyn AgentObserver>,
    config: AgentConfig,
    session: SessionState,
    cancel: CancellationToken,
}

impl Agent {
    pub fn new(
        provider: Arc<dyn ModelProvider>,
        registry: ToolRegistry,
        prompter: Arc<dyn PermissionPrompter>,
        config: AgentConfig,
        system_prompt: Option<String>,
    ) -> Self {
        let engine = PermissionEngine::new(config.mode);
        let session = SessionState::new(config.max_turns, system_prompt);
        Self {
            provider,
            registry,
            engine,
            prompter,
            observer: Arc::new(super::observer::NullObserver),
            config,
            session,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn AgentObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Token callers can use to interrupt the next task
    ///
    /// A cancellation is consumed by the task it aborts; the agent re-arms a
    /// fresh token afterwards, so fetch this again before each run.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut SessionState {
        &mut self.session
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Run one task to completion
    ///
    /// Pushes the task as a user message, then loops: model call, tool
    /// batch, repeat. Returns when the model answers without tool calls,
    /// the turn budget runs out, or the task is interrupted.
    pub async fn run_task(&mut self, task: impl Into<String>) -> Result<TaskOutcome, AgentError> {
        self.session.push(Message::user(task));
        self.session.reset_turns();

        loop {
            if self.cancel.is_cancelled() {
                tracing::info!("[Agent] Task aborted before model call");
                return Ok(self.abort_task());
            }

            self.maybe_compact().await;

            if !self.session.begin_turn() {
                tracing::warn!(
                    "[Agent] Turn budget of {} exhausted",
                    self.session.max_turns()
                );
                return Ok(TaskOutcome::max_turns_exceeded());
            }

            tracing::debug!(
                "[Agent] Turn {}/{}",
                self.session.turn(),
                self.session.max_turns()
            );

            let response = self.call_model().await?;

            if !response.content.is_empty() {
                self.observer.on_assistant_text(&response.content);
            }

            if !response.has_tool_calls() {
                self.session.push(Message::assistant(&response.content));
                return Ok(TaskOutcome::done(response.content));
            }

            let tool_calls = response.tool_calls.clone();
            self.session.push(Message::assistant_with_tool_calls(
                response.content,
                tool_calls.clone(),
            ));

            let interrupted = self.run_tool_batch(&tool_calls).await;
            if interrupted {
                tracing::info!("[Agent] Task aborted during tool batch");
                return Ok(self.abort_task());
            }
        }
    }

    /// Consume the cancellation and re-arm a fresh token, so one interrupt
    /// aborts exactly one task
    fn abort_task(&mut self) -> TaskOutcome {
        self.cancel = CancellationToken::new();
        TaskOutcome::aborted()
    }

    /// Summarize older history when the conversation grows too large
    ///
    /// Compaction failures are not fatal; the turn proceeds with the full
    /// history and compaction is retried on the next one.
    async fn maybe_compact(&mut self) {
        let cut = match self.session.compaction_plan() {
            Some(cut) => cut,
            None => return,
        };

        let mut request = Vec::with_capacity(cut + 2);
        request.push(Message::system(
            "You condense coding-assistant conversations. Produce a compact \
             summary that preserves the task, decisions made, files created or \
             modified, command results that still matter, and unresolved work.",
        ));
        request.extend(
            self.session.messages()[..cut]
                .iter()
                .filter(|m| m.role != Role::System)
                .cloned(),
        );
        request.push(Message::user(
            "Summarize the conversation above for a fresh context.",
        ));

        match self.provider.chat(&request, &[]).await {
            Ok(response) if !response.content.is_empty() => {
                tracing::info!("[Agent] Compacted {} messages into a summary", cut);
                self.session.apply_compaction(cut, response.content);
            }
            Ok(_) => tracing::warn!("[Agent] Compaction skipped: model returned no summary"),
            Err(e) => tracing::warn!("[Agent] Compaction skipped: {}", e),
        }
    }

    /// Call the model, retrying transient failures with backoff
    async fn call_model(&self) -> Result<ModelResponse, AgentError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self
                .provider
                .chat(self.session.messages(), &self.registry.declarations())
                .await
            {
                Ok(response) => return Ok(response),
                Err(e) if e.is_transient() && attempt < MODEL_RETRY_ATTEMPTS => {
                    let delay = Duration::from_millis(MODEL_RETRY_BASE_MS * attempt as u64);
                    tracing::warn!(
                        "[Agent] Transient model failure (attempt {}/{}): {}; retrying in {:?}",
                        attempt,
                        MODEL_RETRY_ATTEMPTS,
                        e,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(AgentError::Model(e)),
            }
        }
    }

    /// Execute a batch of tool calls in request order
    ///
    /// Returns true if the batch was interrupted. Either way, every call in
    /// the batch has a result message appended when this returns.
    async fn run_tool_batch(&mut self, calls: &[ToolCallRequest]) -> bool {
        let mut interrupted = false;
        for call in calls {
            let result = if interrupted || self.cancel.is_cancelled() {
                interrupted = true;
                ToolResult::error("Interrupted")
            } else {
                self.process_tool_call(call).await
            };

            self.observer.on_tool_result(&call.name, &result);
            self.session.push(Message::tool_result(&call.id, &result.output));
        }
        interrupted
    }

    /// Permission-check and execute a single tool call
    ///
    /// Never returns an error: unknown tools, bad arguments, denials, and
    /// tool faults all become error results the model can react to.
    async fn process_tool_call(&mut self, call: &ToolCallRequest) -> ToolResult {
        self.observer.on_tool_call(&call.name, &call.arguments);
        tracing::info!("[Agent] Tool call: {} {}", call.name, call.arguments);

        let level = match self.registry.permission_level(&call.name) {
            Some(level) => level,
            None => {
                return ToolResult::error(format!("Unknown tool: {}", call.name));
            }
        };

        match self
            .engine
            .decide(&call.name, level, &call.arguments, &self.session.approvals)
        {
            PermissionDecision::Allow => {}
            PermissionDecision::Deny { reason } => {
                tracing::info!("[Agent] Denied {}: {}", call.name, reason);
                return ToolResult::error(format!("Permission denied: {}", reason));
            }
            PermissionDecision::Prompt => {
                let request = PermissionRequest {
                    tool_name: call.name.clone(),
                    action_description: describe_action(call),
                    details: action_details(call),
                };
                match self.prompter.resolve(&request) {
                    Ok(PromptResolution::AllowOnce) => {}
                    Ok(PromptResolution::AllowAlways) => {
                        let signature = action_signature(&call.name, &call.arguments);
                        self.session.approvals.remember(signature);
                    }
                    Ok(PromptResolution::Deny) => {
                        return ToolResult::error("Permission denied by user");
                    }
                    Err(e) => {
                        // No working prompt means no approval
                        tracing::warn!("[Agent] Permission prompt failed: {}", e);
                        return ToolResult::error(format!(
                            "Permission denied: prompt unavailable ({})",
                            e
                        ));
                    }
                }
            }
        }

        match self.registry.execute(&call.name, &call.arguments).await {
            Ok(result) => result,
            Err(e) => ToolResult::error(e.to_string()),
        }
    }
}

fn describe_action(call: &ToolCallRequest) -> String {
    match call.name.as_str() {
        "bash" => format!(
            "Run: {}",
            call.arguments["command"].as_str().unwrap_or("(unknown)")
        ),
        "write_file" => format!(
            "Write file: {}",
            call.arguments["path"].as_str().unwrap_or("(unknown)")
        ),
        "edit_file" => format!(
            "Edit file: {}",
            call.arguments["path"].as_str().unwrap_or("(unknown)")
        ),
        other => format!("Run tool: {}", other),
    }
}

fn action_details(call: &ToolCallRequest) -> Option<String> {
    match call.name.as_str() {
        "write_file" => call.arguments["content"].as_str().map(|c| {
            let lines = c.lines().count();
            format!("{} lines", lines)
        }),
        "edit_file" => call.arguments["old_string"]
            .as_str()
            .zip(call.arguments["new_string"].as_str())
            .map(|(old, new)| format!("-{} +{} chars", old.len(), new.len())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SessionOutcome;
    use crate::llm::Role;
    use crate::permissions::{OperatingMode, PermissionLevel};
    use crate::tools::{ParamKind, Tool, ToolDeclaration};
    use serde_json::{json, Value};
    use std::sync::Mutex;

    /// Provider that replays a fixed list of responses
    struct MockProvider {
        responses: Mutex<Vec<Result<ModelResponse, ModelError>>>,
        calls: Mutex<usize>,
    }

    impl MockProvider {
        fn new(responses: Vec<Result<ModelResponse, ModelError>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses),
                calls: Mutex::new(0),
            })
        }

        fn call_count(&self) -> usize {
            *self.calls.lock().unwrap()
        }

        fn text(content: &str) -> Result<ModelResponse, ModelError> {
            Ok(ModelResponse {
                content: content.to_string(),
                tool_calls: vec![],
            })
        }

        fn tool_calls(calls: Vec<(&str, &str, Value)>) -> Result<ModelResponse, ModelError> {
            Ok(ModelResponse {
                content: String::new(),
                tool_calls: calls
                    .into_iter()
                    .map(|(id, name, args)| ToolCallRequest::new(id, name, args))
                    .collect(),
            })
        }
    }

    #[async_trait::async_trait]
    impl ModelProvider for MockProvider {
        async fn chat(
            &self,
            _messages: &[Message],
            _tools: &[crate::tools::ToolDeclaration],
        ) -> Result<ModelResponse, ModelError> {
            *self.calls.lock().unwrap() += 1;
            let mut responses = self.responses.lock().unwrap();
            if responses.is_empty() {
                return Err(ModelError::Fatal("mock provider exhausted".to_string()));
            }
            responses.remove(0)
        }

        fn model(&self) -> &str {
            "mock"
        }
    }

    /// Prompter that replays a fixed list of resolutions
    struct ScriptedPrompter {
        resolutions: Mutex<Vec<PromptResolution>>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedPrompter {
        fn new(resolutions: Vec<PromptResolution>) -> Arc<Self> {
            Arc::new(Self {
                resolutions: Mutex::new(resolutions),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn prompt_count(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    impl PermissionPrompter for ScriptedPrompter {
        fn resolve(&self, request: &PermissionRequest) -> std::io::Result<PromptResolution> {
            self.prompts.lock().unwrap().push(request.tool_name.clone());
            let mut r = self.resolutions.lock().unwrap();
            if r.is_empty() {
                return Ok(PromptResolution::Deny);
            }
            Ok(r.remove(0))
        }
    }

    /// Tool that records the order it was called in
    struct RecordingTool {
        decl: ToolDeclaration,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl RecordingTool {
        fn new(name: &str, level: PermissionLevel, log: Arc<Mutex<Vec<String>>>) -> Self {
            Self {
                decl: ToolDeclaration::new(name, "Records invocations", level).param(
                    "tag",
                    ParamKind::String,
                    "Marker",
                    false,
                ),
                log,
            }
        }
    }

    #[async_trait::async_trait]
    impl Tool for RecordingTool {
        fn declaration(&self) -> &ToolDeclaration {
            &self.decl
        }

        async fn execute(&self, arguments: &Value) -> anyhow::Result<ToolResult> {
            let tag = arguments["tag"].as_str().unwrap_or_default().to_string();
            self.log.lock().unwrap().push(tag.clone());
            Ok(ToolResult::success(format!("ran {}", tag)))
        }
    }

    fn agent_with(
        provider: Arc<MockProvider>,
        prompter: Arc<ScriptedPrompter>,
        registry: ToolRegistry,
        mode: OperatingMode,
    ) -> Agent {
        Agent::new(
            provider,
            registry,
            prompter,
            AgentConfig::new().with_mode(mode).with_max_turns(10),
            None,
        )
    }

    #[tokio::test]
    async fn test_plain_answer_completes_task() {
        let provider = MockProvider::new(vec![MockProvider::text("all done")]);
        let prompter = ScriptedPrompter::new(vec![]);
        let mut agent = agent_with(
            provider.clone(),
            prompter,
            ToolRegistry::new(),
            OperatingMode::Default,
        );

        let outcome = agent.run_task("say hi").await.unwrap();
        assert_eq!(outcome.outcome, SessionOutcome::Done);
        assert_eq!(outcome.final_text, "all done");
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_tool_batch_runs_in_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut registry = ToolRegistry::new();
        registry
            .register(Arc::new(RecordingTool::new(
                "record",
                PermissionLevel::Auto,
                log.clone(),
            )))
            .unwrap();

        let provider = MockProvider::new(vec![
            MockProvider::tool_calls(vec![
                ("c1", "record", json!({"tag": "A"})),
                ("c2", "record", json!({"tag": "B"})),
                ("c3", "record", json!({"tag": "C"})),
            ]),
            MockProvider::text("finished"),
        ]);
        let prompter = ScriptedPrompter::new(vec![]);
        let mut agent = agent_with(provider, prompter, registry, OperatingMode::Default);

        let outcome = agent.run_task("do three things").await.unwrap();
        assert_eq!(outcome.outcome, SessionOutcome::Done);
        assert_eq!(*log.lock().unwrap(), vec!["A", "B", "C"]);

        // Every tool call got exactly one result message
        let tool_messages: Vec<_> = agent
            .session()
            .messages()
            .iter()
            .filter(|m| m.role == Role::Tool)
            .collect();
        assert_eq!(tool_messages.len(), 3);
        assert_eq!(tool_messages[0].tool_call_id.as_deref(), Some("c1"));
        assert_eq!(tool_messages[2].tool_call_id.as_deref(), Some("c3"));
    }

    #[tokio::test]
    async fn test_turn_budget_bounds_model_calls() {
        // Model asks for a tool every turn and never finishes
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut registry = ToolRegistry::new();
        registry
            .register(Arc::new(RecordingTool::new(
                "record",
                PermissionLevel::Auto,
                log.clone(),
            )))
            .unwrap();

        let responses = (0..10)
            .map(|_| MockProvider::tool_calls(vec![("c", "record", json!({"tag": "x"}))]))
            .collect();
        let provider = MockProvider::new(responses);
        let prompter = ScriptedPrompter::new(vec![]);
        let mut agent = Agent::new(
            provider.clone(),
            registry,
            prompter,
            AgentConfig::new().with_max_turns(3),
            None,
        );

        let outcome = agent.run_task("never stop").await.unwrap();
        assert_eq!(outcome.outcome, SessionOutcome::MaxTurnsExceeded);
        assert_eq!(provider.call_count(), 3);
    }

    #[tokio::test]
    async fn test_unknown_tool_becomes_error_result() {
        let provider = MockProvider::new(vec![
            MockProvider::tool_calls(vec![("c1", "teleport", json!({}))]),
            MockProvider::text("recovered"),
        ]);
        let prompter = ScriptedPrompter::new(vec![]);
        let mut agent = agent_with(
            provider,
            prompter.clone(),
            ToolRegistry::new(),
            OperatingMode::Default,
        );

        let outcome = agent.run_task("try something odd").await.unwrap();
        assert_eq!(outcome.outcome, SessionOutcome::Done);
        assert_eq!(prompter.prompt_count(), 0);

        let tool_msg = agent
            .session()
            .messages()
            .iter()
            .find(|m| m.role == Role::Tool)
            .unwrap();
        assert!(tool_msg.content.contains("Unknown tool: teleport"));
    }

    #[tokio::test]
    async fn test_denied_prompt_reported_to_model() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut registry = ToolRegistry::new();
        registry
            .register(Arc::new(RecordingTool::new(
                "record",
                PermissionLevel::Ask,
                log.clone(),
            )))
            .unwrap();

        let provider = MockProvider::new(vec![
            MockProvider::tool_calls(vec![("c1", "record", json!({"tag": "A"}))]),
            MockProvider::text("understood"),
        ]);
        let prompter = ScriptedPrompter::new(vec![PromptResolution::Deny]);
        let mut agent = agent_with(provider, prompter.clone(), registry, OperatingMode::Default);

        let outcome = agent.run_task("do the thing").await.unwrap();
        assert_eq!(outcome.outcome, SessionOutcome::Done);
        assert_eq!(prompter.prompt_count(), 1);
        assert!(log.lock().unwrap().is_empty());

        let tool_msg = agent
            .session()
            .messages()
            .iter()
            .find(|m| m.role == Role::Tool)
            .unwrap();
        assert!(tool_msg.content.contains("Permission denied by user"));
    }

    #[tokio::test]
    async fn test_allow_always_skips_later_prompts() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut registry = ToolRegistry::new();
        registry
            .register(Arc::new(RecordingTool::new(
                "record",
                PermissionLevel::Ask,
                log.clone(),
            )))
            .unwrap();

        let provider = MockProvider::new(vec![
            MockProvider::tool_calls(vec![("c1", "record", json!({"tag": "A"}))]),
            MockProvider::tool_calls(vec![("c2", "record", json!({"tag": "B"}))]),
            MockProvider::text("done"),
        ]);
        let prompter = ScriptedPrompter::new(vec![PromptResolution::AllowAlways]);
        let mut agent = agent_with(provider, prompter.clone(), registry, OperatingMode::Default);

        let outcome = agent.run_task("twice").await.unwrap();
        assert_eq!(outcome.outcome, SessionOutcome::Done);
        // Second call was covered by the remembered approval
        assert_eq!(prompter.prompt_count(), 1);
        assert_eq!(*log.lock().unwrap(), vec!["A", "B"]);
    }

    #[tokio::test]
    async fn test_transient_model_failure_is_retried() {
        let provider = MockProvider::new(vec![
            Err(ModelError::Transient("hiccup".to_string())),
            MockProvider::text("recovered"),
        ]);
        let prompter = ScriptedPrompter::new(vec![]);
        let mut agent = agent_with(
            provider.clone(),
            prompter,
            ToolRegistry::new(),
            OperatingMode::Default,
        );

        let outcome = agent.run_task("hello").await.unwrap();
        assert_eq!(outcome.outcome, SessionOutcome::Done);
        assert_eq!(provider.call_count(), 2);
    }

    #[tokio::test]
    async fn test_fatal_model_failure_surfaces() {
        let provider = MockProvider::new(vec![Err(ModelError::Fatal("bad key".to_string()))]);
        let prompter = ScriptedPrompter::new(vec![]);
        let mut agent = agent_with(
            provider,
            prompter,
            ToolRegistry::new(),
            OperatingMode::Default,
        );

        let err = agent.run_task("hello").await.unwrap_err();
        assert!(matches!(err, AgentError::Model(_)));
    }

    #[tokio::test]
    async fn test_cancellation_aborts_before_model_call() {
        let provider = MockProvider::new(vec![MockProvider::text("never sent")]);
        let prompter = ScriptedPrompter::new(vec![]);
        let mut agent = agent_with(
            provider.clone(),
            prompter,
            ToolRegistry::new(),
            OperatingMode::Default,
        );

        agent.cancellation_token().cancel();
        let outcome = agent.run_task("hello").await.unwrap();
        assert_eq!(outcome.outcome, SessionOutcome::Aborted);
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_abort_consumes_one_task_only() {
        let provider = MockProvider::new(vec![MockProvider::text("second task answer")]);
        let prompter = ScriptedPrompter::new(vec![]);
        let mut agent = agent_with(
            provider.clone(),
            prompter,
            ToolRegistry::new(),
            OperatingMode::Default,
        );

        let token = agent.cancellation_token();
        token.cancel();
        let outcome = agent.run_task("task one").await.unwrap();
        assert_eq!(outcome.outcome, SessionOutcome::Aborted);
        assert_eq!(provider.call_count(), 0);

        // The consumed cancellation must not poison the next task, and the
        // agent hands out a fresh, un-cancelled token for it
        assert!(!agent.cancellation_token().is_cancelled());
        let outcome = agent.run_task("task two").await.unwrap();
        assert_eq!(outcome.outcome, SessionOutcome::Done);
        assert_eq!(outcome.final_text, "second task answer");
        assert_eq!(provider.call_count(), 1);
    }

    /// Tool that cancels the session's token when it runs
    struct CancelOnRunTool {
        decl: ToolDeclaration,
        token: Arc<Mutex<Option<CancellationToken>>>,
    }

    #[async_trait::async_trait]
    impl Tool for CancelOnRunTool {
        fn declaration(&self) -> &ToolDeclaration {
            &self.decl
        }

        async fn execute(&self, _arguments: &Value) -> anyhow::Result<ToolResult> {
            if let Some(token) = self.token.lock().unwrap().as_ref() {
                token.cancel();
            }
            Ok(ToolResult::success("ran"))
        }
    }

    #[tokio::test]
    async fn test_mid_batch_abort_rearms_token() {
        let token_slot = Arc::new(Mutex::new(None));
        let mut registry = ToolRegistry::new();
        registry
            .register(Arc::new(CancelOnRunTool {
                decl: ToolDeclaration::new("interrupting", "Cancels the run", PermissionLevel::Auto),
                token: token_slot.clone(),
            }))
            .unwrap();

        let provider = MockProvider::new(vec![
            MockProvider::tool_calls(vec![
                ("c1", "interrupting", json!({})),
                ("c2", "interrupting", json!({})),
            ]),
            MockProvider::text("after resume"),
        ]);
        let prompter = ScriptedPrompter::new(vec![]);
        let mut agent = agent_with(provider, prompter, registry, OperatingMode::Default);
        *token_slot.lock().unwrap() = Some(agent.cancellation_token());

        let outcome = agent.run_task("task one").await.unwrap();
        assert_eq!(outcome.outcome, SessionOutcome::Aborted);

        // The first call ran; the second was cut off but still got a result
        let tool_messages: Vec<_> = agent
            .session()
            .messages()
            .iter()
            .filter(|m| m.role == Role::Tool)
            .collect();
        assert_eq!(tool_messages.len(), 2);
        assert_eq!(tool_messages[0].content, "ran");
        assert_eq!(tool_messages[1].content, "Interrupted");

        // And the abort does not bleed into the next task
        let outcome = agent.run_task("task two").await.unwrap();
        assert_eq!(outcome.outcome, SessionOutcome::Done);
    }

    #[tokio::test]
    async fn test_oversized_history_is_compacted() {
        let provider = MockProvider::new(vec![
            MockProvider::text("condensed earlier work"),
            MockProvider::text("carrying on"),
        ]);
        let prompter = ScriptedPrompter::new(vec![]);
        let mut agent = agent_with(
            provider.clone(),
            prompter,
            ToolRegistry::new(),
            OperatingMode::Default,
        );

        agent.session_mut().push(Message::user("x".repeat(150_000)));
        for i in 0..10 {
            agent.session_mut().push(Message::assistant(format!("step {}", i)));
        }
        let before = agent.session().message_count();

        let outcome = agent.run_task("keep going").await.unwrap();
        assert_eq!(outcome.outcome, SessionOutcome::Done);
        assert_eq!(outcome.final_text, "carrying on");
        // One summarization call plus the task's own model call
        assert_eq!(provider.call_count(), 2);

        assert!(agent.session().message_count() < before);
        assert!(agent
            .session()
            .messages()
            .iter()
            .any(|m| m.content.contains("condensed earlier work")));
    }

    #[tokio::test]
    async fn test_dangerous_command_denied_without_prompt() {
        let mut registry = ToolRegistry::new();
        registry
            .register(Arc::new(crate::tools::BashTool::with_working_dir(".")))
            .unwrap();

        let provider = MockProvider::new(vec![
            MockProvider::tool_calls(vec![("c1", "bash", json!({"command": "sudo rm -rf /"}))]),
            MockProvider::text("sorry"),
        ]);
        let prompter = ScriptedPrompter::new(vec![PromptResolution::AllowOnce]);
        let mut agent = agent_with(provider, prompter.clone(), registry, OperatingMode::Yolo);

        let outcome = agent.run_task("wipe it").await.unwrap();
        assert_eq!(outcome.outcome, SessionOutcome::Done);
        assert_eq!(prompter.prompt_count(), 0);

        let tool_msg = agent
            .session()
            .messages()
            .iter()
            .find(|m| m.role == Role::Tool)
            .unwrap();
        assert!(tool_msg.content.contains("Permission denied"));
    }
}
