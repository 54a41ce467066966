//! OpenAI-compatible chat completions over reqwest
//!
//! Speaks the `/chat/completions` wire format used by OpenAI, OpenRouter
//! and most self-hosted gateways. OpenRouter is the default endpoint and
//! receives its attribution headers.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, error};

use super::logging::{log_llm_interaction, LogConfig};
use super::{CompletionProvider, CompletionResult, Message, Role, ToolCallRequest};
use crate::error::{Error, Result};
use crate::tools::ToolDefinition;

pub const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";

const REFERER: &str = "http://localhost:3000";
const APP_TITLE: &str = "Taskpilot";

/// Provider for OpenAI-compatible HTTP endpoints
pub struct OpenAiCompatProvider {
    client: reqwest::Client,
    name: String,
    base_url: String,
    api_key: String,
    model: String,
    reasoning: bool,
}

impl OpenAiCompatProvider {
    /// Default timeout for a single completion request
    const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

    /// OpenRouter with the given key and model
    pub fn openrouter(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        Self::new("openrouter", OPENROUTER_BASE_URL, api_key, model)
    }

    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Self::DEFAULT_TIMEOUT)
            .connect_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| Error::Provider(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
            reasoning: false,
        })
    }

    /// Replace the HTTP client, e.g. to change timeouts
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Request reasoning tokens (OpenRouter `reasoning` extension)
    pub fn with_reasoning(mut self, enabled: bool) -> Self {
        self.reasoning = enabled;
        self
    }

    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn is_openrouter(&self) -> bool {
        self.base_url.contains("openrouter.ai")
    }

    /// Build the JSON request body
    pub(crate) fn request_body(&self, messages: &[Message], tools: &[ToolDefinition]) -> Value {
        let mut body = json!({
            "model": self.model,
            "messages": messages.iter().map(wire_message).collect::<Vec<_>>(),
        });

        if !tools.is_empty() {
            body["tools"] = Value::Array(
                tools
                    .iter()
                    .map(|t| {
                        json!({
                            "type": "function",
                            "function": {
                                "name": t.name,
                                "description": t.description,
                                "parameters": t.parameters,
                            }
                        })
                    })
                    .collect(),
            );
            body["tool_choice"] = json!("auto");
        }

        if self.reasoning {
            body["reasoning"] = json!({ "enabled": true });
        }

        body
    }

    async fn send(&self, body: &Value) -> Result<CompletionResult> {
        let mut request = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(body);
        if self.is_openrouter() {
            request = request.header("HTTP-Referer", REFERER).header("X-Title", APP_TITLE);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::Provider(format!("{} request failed: {}", self.name, e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| Error::Provider(format!("{} response read failed: {}", self.name, e)))?;

        if !status.is_success() {
            return Err(Error::Provider(format!(
                "{} returned {}: {}",
                self.name,
                status,
                truncate(&text, 500)
            )));
        }

        parse_response(&text)
    }
}

#[async_trait]
impl CompletionProvider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<CompletionResult> {
        let body = self.request_body(messages, tools);
        debug!(
            provider = %self.name,
            model = %self.model,
            messages = messages.len(),
            tools = tools.len(),
            "Sending completion request"
        );

        let outcome = self.send(&body).await;

        let error_text = outcome.as_ref().err().map(|e| e.to_string());
        log_llm_interaction(LogConfig {
            model: &self.model,
            provider: Some(&self.name),
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

fn wire_message(msg: &Message) -> Value {
    match msg.role {
        Role::Assistant if msg.has_tool_calls() => {
            let content = if msg.content.is_empty() {
                Value::Null
            } else {
                Value::String(msg.content.clone())
            };
            let tool_calls: Vec<Value> = msg
                .tool_calls
                .iter()
                .map(|tc| {
                    json!({
                        "id": tc.id,
                        "type": "function",
                        "function": { "name": tc.name, "arguments": tc.arguments },
                    })
                })
                .collect();
            let mut wire = json!({
                "role": "assistant",
                "content": content,
                "tool_calls": tool_calls,
            });
            if let Some(details) = &msg.reasoning_details {
                wire["reasoning_details"] = details.clone();
            }
            wire
        }
        Role::Tool => json!({
            "role": "tool",
            "tool_call_id": msg.tool_call_id,
            "name": msg.name,
            "content": msg.content,
        }),
        role => json!({ "role": role.as_str(), "content": msg.content }),
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: WireAssistantMessage,
}

#[derive(Debug, Deserialize)]
struct WireAssistantMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<WireToolCall>>,
    #[serde(default)]
    reasoning_details: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct WireToolCall {
    id: String,
    function: WireFunction,
}

#[derive(Debug, Deserialize)]
struct WireFunction {
    name: String,
    #[serde(default)]
    arguments: Value,
}

/// Parse a `/chat/completions` response body
pub(crate) fn parse_response(body: &str) -> Result<CompletionResult> {
    let parsed: ChatCompletionResponse = serde_json::from_str(body)
        .map_err(|e| Error::Provider(format!("Malformed completion response: {}", e)))?;

    let choice = parsed
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| Error::Provider("Completion response has no choices".to_string()))?;

    let tool_calls = choice
        .message
        .tool_calls
        .unwrap_or_default()
        .into_iter()
        .map(|tc| {
            // Some gateways send arguments as an object instead of encoded text.
            let arguments = match tc.function.arguments {
                Value::String(s) => s,
                Value::Null => String::new(),
                other => other.to_string(),
            };
            ToolCallRequest::new(tc.id, tc.function.name, arguments)
        })
        .collect();

    Ok(CompletionResult {
        content: choice.message.content.filter(|c| !c.is_empty()),
        tool_calls,
        reasoning_details: choice.message.reasoning_details.filter(|d| !d.is_null()),
    })
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> OpenAiCompatProvider {
        OpenAiCompatProvider::openrouter("sk-test", "xiaomi/mimo-v2-flash:free").unwrap()
    }

    fn tool() -> ToolDefinition {
        ToolDefinition {
            name: "list_tasks".to_string(),
            description: "List tasks".to_string(),
            parameters: json!({"type": "object", "properties": {}}),
        }
    }

    #[test]
    fn test_endpoint() {
        assert_eq!(provider().endpoint(), "https://openrouter.ai/api/v1/chat/completions");
        let custom = OpenAiCompatProvider::new("local", "http://localhost:8080/v1/", "k", "m").unwrap();
        assert_eq!(custom.endpoint(), "http://localhost:8080/v1/chat/completions");
    }

    #[test]
    fn test_request_body_with_tools() {
        let messages = vec![
            Message::system("sys"),
            Message::user("show my tasks"),
            Message::assistant_with_tool_calls(
                None,
                vec![ToolCallRequest::new("call_1", "list_tasks", "{}")],
            ),
            Message::tool_result("call_1", "list_tasks", "[]"),
        ];
        let body = provider().with_reasoning(true).request_body(&messages, &[tool()]);

        assert_eq!(body["model"], "xiaomi/mimo-v2-flash:free");
        assert_eq!(body["tool_choice"], "auto");
        assert_eq!(body["tools"][0]["type"], "function");
        assert_eq!(body["tools"][0]["function"]["name"], "list_tasks");
        assert_eq!(body["reasoning"]["enabled"], true);

        let wire = body["messages"].as_array().unwrap();
        assert_eq!(wire.len(), 4);
        assert_eq!(wire[2]["content"], Value::Null);
        assert_eq!(wire[2]["tool_calls"][0]["function"]["arguments"], "{}");
        assert_eq!(wire[3]["role"], "tool");
        assert_eq!(wire[3]["tool_call_id"], "call_1");
    }

    #[test]
    fn test_request_body_without_tools() {
        let body = provider().request_body(&[Message::user("hi")], &[]);
        assert!(body.get("tools").is_none());
        assert!(body.get("tool_choice").is_none());
        assert!(body.get("reasoning").is_none());
    }

    #[test]
    fn test_parse_text_response() {
        let result = parse_response(
            r#"{"choices":[{"message":{"role":"assistant","content":"Done."}}]}"#,
        )
        .unwrap();
        assert_eq!(result.content.as_deref(), Some("Done."));
        assert!(!result.has_tool_calls());
    }

    #[test]
    fn test_parse_tool_call_response() {
        let result = parse_response(
            r#"{"choices":[{"message":{"content":null,"tool_calls":[
                {"id":"c1","type":"function","function":{"name":"add_task","arguments":"{\"title\":\"milk\"}"}},
                {"id":"c2","type":"function","function":{"name":"list_tasks","arguments":{"status":"pending"}}}
            ]}}]}"#,
        )
        .unwrap();
        assert!(result.content.is_none());
        assert_eq!(result.tool_calls.len(), 2);
        assert_eq!(result.tool_calls[0].arguments, r#"{"title":"milk"}"#);
        assert_eq!(result.tool_calls[1].arguments, r#"{"status":"pending"}"#);
    }

    #[test]
    fn test_reasoning_details_round_trip() {
        let result = parse_response(
            r#"{"choices":[{"message":{"content":null,
                "reasoning_details":[{"type":"reasoning.text","text":"look up tasks first"}],
                "tool_calls":[{"id":"c1","type":"function","function":{"name":"list_tasks","arguments":"{}"}}]
            }}]}"#,
        )
        .unwrap();
        let details = result.reasoning_details.clone().unwrap();
        assert_eq!(details[0]["text"], "look up tasks first");

        let assistant = Message::assistant_with_tool_calls(result.content, result.tool_calls)
            .with_reasoning_details(result.reasoning_details);
        let body = provider()
            .with_reasoning(true)
            .request_body(&[Message::user("what's left?"), assistant], &[tool()]);
        assert_eq!(body["messages"][1]["reasoning_details"], details);
        assert!(body["messages"][0].get("reasoning_details").is_none());
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(parse_response("not json"), Err(Error::Provider(_))));
        assert!(matches!(parse_response(r#"{"choices":[]}"#), Err(Error::Provider(_))));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("abc", 5), "abc");
        assert_eq!(truncate("abcdef", 3), "abc...");
    }
}
