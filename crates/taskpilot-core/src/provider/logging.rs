//! LLM request/response logging utilities
//!
//! Set the `LLM_LOG_FILE` environment variable to append one JSON object
//! per completion request, successful or not, to that file.
//!
//! Example: `LLM_LOG_FILE=/tmp/llm.log taskpilot ask "buy milk"`

use serde_json::json;
use std::io::Write;
use tracing::{debug, warn};

use super::{CompletionResult, Message};
use crate::tools::ToolDefinition;

/// Configuration for what to include in the log entry
#[derive(Default)]
pub struct LogConfig<'a> {
    /// The model used for this request
    pub model: &'a str,
    /// Provider name (e.g., "openrouter", "genai")
    pub provider: Option<&'a str>,
    /// Messages in the request
    pub messages: &'a [Message],
    /// Tools available for the request
    pub tools: Option<&'a [ToolDefinition]>,
    /// Parsed completion result
    pub result: Option<&'a CompletionResult>,
    /// Error message if the request failed
    pub error: Option<&'a str>,
}

/// Build the JSON entry written for one interaction
pub(crate) fn log_entry(config: &LogConfig<'_>) -> serde_json::Value {
    json!({
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "model": config.model,
        "provider": config.provider,
        "request": {
            "messages": config.messages,
            "message_count": config.messages.len(),
            "tools": config.tools.map(|t| t.iter().map(|tool| tool.name.as_str()).collect::<Vec<_>>()),
            "tool_count": config.tools.map(|t| t.len()).unwrap_or(0),
        },
        "response": config.result.map(|r| json!({
            "type": if r.has_tool_calls() { "tool_calls" } else { "message" },
            "content": r.content,
            "tool_calls": r.tool_calls,
        })),
        "error": config.error,
    })
}

/// Log an LLM request/response interaction to file if LLM_LOG_FILE is set
pub fn log_llm_interaction(config: LogConfig<'_>) {
    let log_file = match std::env::var("LLM_LOG_FILE") {
        Ok(path) if !path.is_empty() => path,
        _ => return,
    };

    let entry = log_entry(&config);

    match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_file)
    {
        Ok(mut file) => {
            let line = serde_json::to_string(&entry).unwrap_or_default();
            if let Err(e) = writeln!(file, "{}", line) {
                warn!("Failed to write to LLM log file: {}", e);
            }
        }
        Err(e) => {
            warn!("Failed to open LLM log file {}: {}", log_file, e);
        }
    }

    debug!("Logged LLM interaction to {}", log_file);
}
