//! Agent configuration

use crate::permissions::OperatingMode;

pub const DEFAULT_MAX_TURNS: usize = 50;

/// Tunables for an agent session
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub mode: OperatingMode,
    pub max_turns: usize,
    pub auto_save_history: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            mode: OperatingMode::Default,
            max_turns: DEFAULT_MAX_TURNS,
            auto_save_history: true,
        }
    }
}

impl AgentConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mode(mut self, mode: OperatingMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_max_turns(mut self, max_turns: usize) -> Self {
        self.max_turns = max_turns;
        self
    }

    pub fn with_auto_save_history(mut self, auto_save: bool) -> Self {
        self.auto_save_history = auto_save;
        self
    }
}
