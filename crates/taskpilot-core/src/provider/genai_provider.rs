//! GenAI-based completion provider
//!
//! Uses the genai framework to reach multiple hosted model APIs with manual
//! tool control: tool calls are returned to the loop, never executed here.
//! Responses are streamed and accumulated to avoid long idle HTTP reads.

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use genai::chat::{ChatMessage, ChatRequest, ChatStreamEvent, Tool, ToolCall, ToolResponse};
use genai::resolver::{AuthData, AuthResolver};
use genai::Client;
use genai::WebConfig;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error};

use super::logging::{log_llm_interaction, LogConfig};
use super::{CompletionProvider, CompletionResult, Message, Role, ToolCallRequest};
use crate::error::{Error, Result};
use crate::tools::ToolDefinition;

/// Provider families reachable through genai
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    OpenAI,
    Anthropic,
    Gemini,
    Groq,
    DeepSeek,
    XAI,
    /// Local models, no API key
    Ollama,
}

impl std::fmt::Display for ProviderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProviderType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(ProviderType::OpenAI),
            "anthropic" => Ok(ProviderType::Anthropic),
            "gemini" | "google" => Ok(ProviderType::Gemini),
            "groq" => Ok(ProviderType::Groq),
            "deepseek" => Ok(ProviderType::DeepSeek),
            "xai" | "grok" => Ok(ProviderType::XAI),
            "ollama" => Ok(ProviderType::Ollama),
            _ => Err(format!("Unknown provider: {}", s)),
        }
    }
}

impl ProviderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderType::OpenAI => "openai",
            ProviderType::Anthropic => "anthropic",
            ProviderType::Gemini => "gemini",
            ProviderType::Groq => "groq",
            ProviderType::DeepSeek => "deepseek",
            ProviderType::XAI => "xai",
            ProviderType::Ollama => "ollama",
        }
    }

    /// Model used when none is configured
    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderType::OpenAI => "gpt-4o-mini",
            ProviderType::Anthropic => "claude-3-5-haiku-latest",
            ProviderType::Gemini => "gemini-2.0-flash",
            ProviderType::Groq => "llama-3.3-70b-versatile",
            ProviderType::DeepSeek => "deepseek-chat",
            ProviderType::XAI => "grok-3-mini",
            ProviderType::Ollama => "llama3.2",
        }
    }

    /// Get the environment variable name for API key
    pub fn api_key_env(&self) -> Option<&'static str> {
        match self {
            ProviderType::OpenAI => Some("OPENAI_API_KEY"),
            ProviderType::Anthropic => Some("ANTHROPIC_API_KEY"),
            ProviderType::Gemini => Some("GEMINI_API_KEY"),
            ProviderType::Groq => Some("GROQ_API_KEY"),
            ProviderType::DeepSeek => Some("DEEPSEEK_API_KEY"),
            ProviderType::XAI => Some("XAI_API_KEY"),
            ProviderType::Ollama => None,
        }
    }
}

/// A provider implementation using genai
pub struct GenAIProvider {
    client: Client,
    provider_type: ProviderType,
    model: String,
}

impl GenAIProvider {
    /// Default timeout for LLM API requests
    const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

    /// Create WebConfig with appropriate timeouts for LLM requests
    fn default_web_config() -> WebConfig {
        WebConfig::default()
            .with_timeout(Self::DEFAULT_TIMEOUT)
            .with_connect_timeout(Duration::from_secs(30))
    }

    /// Create a new provider with default settings (uses environment variables for auth)
    pub fn new(provider_type: ProviderType, model: Option<&str>) -> Self {
        let client = Client::builder()
            .with_web_config(Self::default_web_config())
            .build();
        Self {
            client,
            provider_type,
            model: model.unwrap_or(provider_type.default_model()).to_string(),
        }
    }

    /// Create a provider with a specific API key
    pub fn with_api_key(provider_type: ProviderType, api_key: &str, model: Option<&str>) -> Self {
        let api_key = api_key.to_string();
        let auth_resolver = AuthResolver::from_resolver_fn(
            move |_model_iden| -> std::result::Result<Option<AuthData>, genai::resolver::Error> {
                Ok(Some(AuthData::from_single(api_key.clone())))
            },
        );

        let client = Client::builder()
            .with_web_config(Self::default_web_config())
            .with_auth_resolver(auth_resolver)
            .build();

        Self {
            client,
            provider_type,
            model: model.unwrap_or(provider_type.default_model()).to_string(),
        }
    }

    /// Convert the history into a genai request
    fn build_request(messages: &[Message], tools: &[ToolDefinition]) -> ChatRequest {
        let mut chat_req = ChatRequest::default();

        for msg in messages {
            chat_req = match msg.role {
                Role::System => chat_req.append_message(ChatMessage::system(&msg.content)),
                Role::User => chat_req.append_message(ChatMessage::user(&msg.content)),
                // OpenAI-style APIs want the tool calls as one assistant message,
                // so any text alongside them is dropped.
                Role::Assistant if msg.has_tool_calls() => {
                    let calls: Vec<ToolCall> = msg.tool_calls.iter().map(to_genai_call).collect();
                    chat_req.append_message(calls)
                }
                Role::Assistant => chat_req.append_message(ChatMessage::assistant(&msg.content)),
                Role::Tool => match &msg.tool_call_id {
                    Some(call_id) => chat_req
                        .append_message(ToolResponse::new(call_id.clone(), msg.content.clone())),
                    None => chat_req,
                },
            };
        }

        if !tools.is_empty() {
            let genai_tools: Vec<Tool> = tools
                .iter()
                .map(|t| {
                    Tool::new(&t.name)
                        .with_description(&t.description)
                        .with_schema(t.parameters.clone())
                })
                .collect();
            chat_req = chat_req.with_tools(genai_tools);
        }

        chat_req
    }

    async fn stream_completion(&self, chat_req: ChatRequest) -> Result<CompletionResult> {
        let stream_response = self
            .client
            .exec_chat_stream(&self.model, chat_req, None)
            .await
            .map_err(|e| Error::Provider(format!("GenAI error: {:?}", e)))?;

        let mut content = String::new();
        let mut tool_calls = Vec::new();
        let mut stream = stream_response.stream;

        while let Some(event) = stream.next().await {
            match event {
                Ok(ChatStreamEvent::Chunk(chunk)) => {
                    content.push_str(&chunk.content);
                }
                Ok(ChatStreamEvent::ReasoningChunk(chunk)) => {
                    debug!(chars = chunk.content.len(), "Reasoning chunk");
                }
                Ok(ChatStreamEvent::ToolCallChunk(tc)) => {
                    // Each ToolCallChunk contains a complete ToolCall
                    tool_calls.push(from_genai_call(tc.tool_call));
                }
                Ok(ChatStreamEvent::End(_)) => break,
                Ok(_) => {}
                Err(e) => {
                    return Err(Error::Provider(format!("GenAI stream error: {:?}", e)));
                }
            }
        }

        Ok(CompletionResult {
            content: if content.is_empty() { None } else { Some(content) },
            tool_calls,
            reasoning_details: None,
        })
    }
}

#[async_trait]
impl CompletionProvider for GenAIProvider {
    fn name(&self) -> &str {
        self.provider_type.as_str()
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<CompletionResult> {
        let chat_req = Self::build_request(messages, tools);
        let outcome = self.stream_completion(chat_req).await;

        let error_text = outcome.as_ref().err().map(|e| e.to_string());
        log_llm_interaction(LogConfig {
            model: &self.model,
            provider: Some(self.provider_type.as_str()),
            messages,
            tools: Some(tools),
            result: outcome.as_ref().ok(),
            error: error_text.as_deref(),
        });
        if let Some(e) = &error_text {
            error!(error = %e, model = %self.model, "LLM request failed");
        }

        outcome
    }
}

fn to_genai_call(tc: &ToolCallRequest) -> ToolCall {
    // Arguments that never decoded are sent back verbatim as a string.
    let fn_arguments = serde_json::from_str(&tc.arguments)
        .unwrap_or_else(|_| Value::String(tc.arguments.clone()));
    ToolCall {
        call_id: tc.id.clone(),
        fn_name: tc.name.clone(),
        fn_arguments,
        thought_signatures: None,
    }
}

fn from_genai_call(tc: ToolCall) -> ToolCallRequest {
    let arguments = match tc.fn_arguments {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    };
    ToolCallRequest::new(tc.call_id, tc.fn_name, arguments)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_type_parsing() {
        assert_eq!("Anthropic".parse::<ProviderType>(), Ok(ProviderType::Anthropic));
        assert_eq!("google".parse::<ProviderType>(), Ok(ProviderType::Gemini));
        assert!("openrouter".parse::<ProviderType>().is_err());
    }

    #[test]
    fn test_default_model_used() {
        let provider = GenAIProvider::with_api_key(ProviderType::OpenAI, "sk-test", None);
        assert_eq!(provider.model(), "gpt-4o-mini");
        assert_eq!(provider.name(), "openai");
    }

    #[test]
    fn test_call_conversion() {
        let ours = ToolCallRequest::new("c1", "add_task", r#"{"title":"milk"}"#);
        let theirs = to_genai_call(&ours);
        assert_eq!(theirs.fn_arguments["title"], "milk");
        assert_eq!(from_genai_call(theirs), ours);

        let garbled = to_genai_call(&ToolCallRequest::new("c2", "add_task", "{oops"));
        assert_eq!(garbled.fn_arguments, Value::String("{oops".to_string()));
    }
}
