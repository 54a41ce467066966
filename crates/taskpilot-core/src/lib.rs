//! Taskpilot Core - a tool-calling todo assistant
//!
//! This crate provides the core functionality for Taskpilot:
//! - Task model, record stores (in-memory and SQLite) and the task service
//! - Tool registry exposing task operations to a language model
//! - Completion providers (OpenAI-compatible, genai, scripted)
//! - The conversation loop that drives tool calls to a final answer
//! - Task lifecycle events and configuration

pub mod config;
pub mod error;
pub mod events;
pub mod model;
pub mod orchestration;
pub mod provider;
pub mod service;
pub mod session;
pub mod store;
pub mod tools;

pub use config::{Config, ConfigManager, ProviderConfig};
pub use error::{Error, Result, StoreError, ToolError};
pub use events::{EventPublisher, TaskEvent, TaskEventType};
pub use model::{NewTask, Task, TaskPatch, TaskStatus};
pub use provider::{CompletionProvider, CompletionResult, Message, Role, ToolCallRequest};
pub use service::TaskService;
pub use store::{MemoryTaskStore, TaskStore};
#[cfg(feature = "sqlite")]
pub use store::SqliteTaskStore;
pub use tools::{Tool, ToolDefinition, ToolOutput, ToolRegistry};

// Orchestration exports
pub use orchestration::{
    create_agent, create_task_service, create_task_tool_registry, SystemPrompt,
};

// Session exports
pub use session::{AgentConfig, AgentLoop, FinishReason, RunOutcome};
