//! Types for the conversation loop

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::AgentSettings;
use crate::orchestration::SystemPrompt;
use crate::provider::{Message, ToolCallRequest};

/// Answer used when the model finishes with no text
pub const FALLBACK_RESPONSE: &str = "Task processed successfully.";

/// Answer used when a run exhausts its completion budget
pub const ITERATION_LIMIT_RESPONSE: &str =
    "I could not complete the request within the allowed number of steps.";

/// Configuration for the conversation loop
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// System message that seeds every run
    pub system_prompt: String,
    /// Maximum completion requests per run
    pub max_iterations: usize,
    /// Wall-clock bound on a whole run
    pub timeout: Option<Duration>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            system_prompt: SystemPrompt::new().build(),
            max_iterations: 10,
            timeout: None,
        }
    }
}

impl AgentConfig {
    /// Build from the `[agent]` config section
    pub fn from_settings(settings: &AgentSettings) -> Self {
        let system_prompt = match &settings.system_prompt {
            Some(prompt) => SystemPrompt::with_base(prompt.clone()).build(),
            None => SystemPrompt::new().build(),
        };
        Self {
            system_prompt,
            max_iterations: settings.max_iterations,
            timeout: settings.timeout_secs.map(Duration::from_secs),
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Why a run stopped
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// The model answered without requesting tools
    Completed,
    /// The completion budget ran out while tools were still requested
    IterationLimit,
}

/// State of a single run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopState {
    AwaitingCompletion,
    ExecutingTools(Vec<ToolCallRequest>),
    Done(String, FinishReason),
}

/// Result of a finished run
#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    /// Final text for the caller
    pub response: String,
    /// Full history of the run, system message first
    pub messages: Vec<Message>,
    /// Completion requests made
    pub iterations: usize,
    /// Tool invocations executed
    pub tool_calls: usize,
    pub finish_reason: FinishReason,
}
