//! Tool system for the Taskpilot agent
//!
//! Tools are the actions the model can request. Each tool has:
//! - A name and description for the LLM
//! - A JSON schema for parameters
//! - An execute method
//!
//! The registry is the boundary where every outcome, success or failure,
//! becomes a text payload for the conversation.

pub mod args;
pub mod task;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::ToolError;
use crate::model::Task;

/// Boxed future type for object-safe async trait methods
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Result value of a successful tool execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolOutput {
    /// A single task (created or updated)
    Task(Task),
    /// A sequence of tasks (listing)
    Tasks(Vec<Task>),
    /// A yes/no outcome (deletion)
    Flag(bool),
}

impl ToolOutput {
    /// Canonical text encoding handed back to the model
    pub fn to_text(&self) -> String {
        let encoded = match self {
            ToolOutput::Task(task) => serde_json::to_string(task),
            ToolOutput::Tasks(tasks) => serde_json::to_string(tasks),
            ToolOutput::Flag(flag) => return flag.to_string(),
        };
        encoded.unwrap_or_else(|e| format!("Error: failed to encode tool result: {}", e))
    }
}

/// Render a tool outcome as the text stored in a `tool` message
pub fn render_result(result: &Result<ToolOutput, ToolError>) -> String {
    match result {
        Ok(output) => output.to_text(),
        Err(e) => format!("Error: {}", e),
    }
}

/// Tool definition for LLM consumption
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// Core trait for all tools
pub trait Tool: Send + Sync {
    /// Tool name (used by LLM to invoke)
    fn name(&self) -> &str;

    /// Description of what the tool does
    fn description(&self) -> &str;

    /// JSON schema for parameters
    fn parameters_schema(&self) -> Value;

    /// Execute the tool with decoded arguments
    fn execute(&self, args: Value) -> BoxFuture<'_, Result<ToolOutput, ToolError>>;

    /// Whether the tool only reads state. Read-only batches may run concurrently.
    fn read_only(&self) -> bool {
        false
    }

    /// Convert to tool definition for LLM
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

/// Ordered registry of available tools
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. A tool with the same name replaces the earlier one in place.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        match self.tools.iter().position(|t| t.name() == tool.name()) {
            Some(idx) => self.tools[idx] = tool,
            None => self.tools.push(tool),
        }
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name).cloned()
    }

    /// Tool descriptors in registration order
    pub fn list_descriptors(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.to_definition()).collect()
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Whether `name` refers to a registered read-only tool
    pub fn is_read_only(&self, name: &str) -> bool {
        self.get(name).is_some_and(|t| t.read_only())
    }

    /// Dispatch to the named tool and return its typed result
    pub async fn invoke_raw(&self, name: &str, args: Value) -> Result<ToolOutput, ToolError> {
        let tool = self
            .get(name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;
        tool.execute(args).await
    }

    /// Dispatch with already decoded arguments. Never fails: errors become `Error: ...` text.
    pub async fn invoke(&self, name: &str, args: Value) -> String {
        let result = self.invoke_raw(name, args).await;
        if let Err(e) = &result {
            warn!(tool = name, error = %e, "Tool invocation failed");
        } else {
            debug!(tool = name, "Tool invocation succeeded");
        }
        render_result(&result)
    }

    /// Decode a raw argument payload and dispatch. Never fails.
    pub async fn invoke_encoded(&self, name: &str, raw_arguments: &str) -> String {
        match args::decode_arguments(raw_arguments) {
            Ok(args) => self.invoke(name, args).await,
            Err(e) => {
                warn!(tool = name, error = %e, "Could not decode tool arguments");
                render_result(&Err(e))
            }
        }
    }
}
