//! Orchestration module for wiring the agent
//!
//! This module contains shared code between the CLI and the REST server for:
//! - System prompts
//! - Tool registry construction
//! - Store, service and agent construction from configuration

mod bootstrap;
mod system_prompt;
mod tool_registry;

pub use bootstrap::{create_agent, create_task_service, open_store};
pub use system_prompt::{SystemPrompt, DEFAULT_SYSTEM_PROMPT};
pub use tool_registry::create_task_tool_registry;
