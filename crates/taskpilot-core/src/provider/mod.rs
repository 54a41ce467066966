//! Completion provider abstraction
//!
//! The conversation loop talks to a language model only through the
//! [`CompletionProvider`] trait. Implementations:
//! - [`OpenAiCompatProvider`]: any OpenAI-compatible `/chat/completions`
//!   endpoint, OpenRouter by default
//! - [`GenAIProvider`]: the genai multi-provider client (OpenAI, Anthropic,
//!   Gemini, Groq, DeepSeek, xAI, Ollama)
//! - [`ScriptedProvider`]: canned replies for tests and offline runs

pub mod factory;
mod genai_provider;
mod logging;
mod openai_compat;
mod scripted;

pub use factory::create_provider;
pub use genai_provider::{GenAIProvider, ProviderType};
pub use logging::{log_llm_interaction, LogConfig};
pub use openai_compat::{OpenAiCompatProvider, OPENROUTER_BASE_URL};
pub use scripted::{RecordedRequest, ScriptedProvider};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::tools::ToolDefinition;

/// Author of a conversation message
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        }
    }
}

/// A tool invocation requested by the model
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolCallRequest {
    /// Opaque id, echoed back on the matching tool message
    pub id: String,
    pub name: String,
    /// Raw JSON text, decoded by the registry before dispatch
    pub arguments: String,
}

impl ToolCallRequest {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments: arguments.into(),
        }
    }
}

/// One entry of the conversation history
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: String,
    /// Requests carried by an assistant message
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCallRequest>,
    /// Request answered by a tool message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    /// Tool that produced a tool message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Opaque reasoning blocks returned with an assistant turn; sent back
    /// unchanged so the model keeps its reasoning across tool turns
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning_details: Option<Value>,
}

impl Message {
    fn plain(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
            name: None,
            reasoning_details: None,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::plain(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::plain(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::plain(Role::Assistant, content)
    }

    /// Assistant message carrying tool requests; content may be empty
    pub fn assistant_with_tool_calls(
        content: Option<String>,
        tool_calls: Vec<ToolCallRequest>,
    ) -> Self {
        Self {
            tool_calls,
            ..Self::plain(Role::Assistant, content.unwrap_or_default())
        }
    }

    /// Tool result answering `call_id`
    pub fn tool_result(
        call_id: impl Into<String>,
        name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            tool_call_id: Some(call_id.into()),
            name: Some(name.into()),
            ..Self::plain(Role::Tool, content)
        }
    }

    pub fn with_reasoning_details(mut self, details: Option<Value>) -> Self {
        self.reasoning_details = details;
        self
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

/// Response from a completion that may contain both content and tool calls
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletionResult {
    /// Text content from the assistant (may be present even with tool calls)
    pub content: Option<String>,
    /// Tool calls the loop must execute
    pub tool_calls: Vec<ToolCallRequest>,
    /// Provider reasoning blocks to replay on the next request
    pub reasoning_details: Option<Value>,
}

impl CompletionResult {
    /// Final text answer
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            tool_calls: Vec::new(),
            reasoning_details: None,
        }
    }

    /// Tool requests without text
    pub fn tool_calls(tool_calls: Vec<ToolCallRequest>) -> Self {
        Self {
            content: None,
            tool_calls,
            reasoning_details: None,
        }
    }

    /// Check if this result has any tool calls
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }

    /// Check if this result has text content
    pub fn has_content(&self) -> bool {
        self.content.as_ref().map(|c| !c.is_empty()).unwrap_or(false)
    }
}

/// A language model that produces the next assistant turn
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Provider name (e.g., "openrouter", "anthropic")
    fn name(&self) -> &str;

    /// Model identifier sent with each request
    fn model(&self) -> &str;

    /// Produce the next assistant turn for `messages`, offering `tools`.
    ///
    /// Any failure is an [`Error::Provider`](crate::Error::Provider).
    async fn complete(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<CompletionResult>;
}
