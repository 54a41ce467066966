//! System prompt management
//!
//! Provides a single source of truth for the system prompt used by both CLI and server.

/// System prompt configuration and generation
#[derive(Debug, Clone)]
pub struct SystemPrompt {
    base: String,
}

impl Default for SystemPrompt {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemPrompt {
    /// Create a new system prompt with the default content
    pub fn new() -> Self {
        Self::with_base(DEFAULT_SYSTEM_PROMPT)
    }

    /// Create with custom base prompt
    pub fn with_base(base: impl Into<String>) -> Self {
        Self { base: base.into() }
    }

    /// Build the final system prompt. A blank custom prompt falls back to the default.
    pub fn build(&self) -> String {
        if self.base.trim().is_empty() {
            DEFAULT_SYSTEM_PROMPT.to_string()
        } else {
            self.base.clone()
        }
    }
}

/// Default system prompt
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a specialized Todo Assistant. \
When a user asks to 'add', 'buy', 'create', 'update', 'complete' or 'delete' something, \
you MUST use the provided tools to update the task list. \
Always confirm the action was successful based on the tool output. \
Do NOT output raw XML tags like <tool_call> in your final response.";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_prompt_mentions_tools() {
        let prompt = SystemPrompt::new().build();
        assert!(prompt.contains("MUST use the provided tools"));
    }

    #[test]
    fn test_custom_prompt() {
        assert_eq!(SystemPrompt::with_base("Base.").build(), "Base.");
        assert_eq!(SystemPrompt::with_base("  ").build(), DEFAULT_SYSTEM_PROMPT);
    }
}
