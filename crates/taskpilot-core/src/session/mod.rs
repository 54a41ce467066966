//! Session module - the tool-calling conversation loop
//!
//! One [`AgentLoop`] is constructed at startup and shared (behind an `Arc`)
//! by every caller. Each call to [`AgentLoop::run`] is an independent run
//! with its own history; runs share nothing but the task store.
//!
//! # Example Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use taskpilot_core::orchestration::create_task_tool_registry;
//! use taskpilot_core::provider::ScriptedProvider;
//! use taskpilot_core::service::TaskService;
//! use taskpilot_core::session::{AgentConfig, AgentLoop};
//!
//! let registry = create_task_tool_registry(TaskService::in_memory());
//! let provider = ScriptedProvider::new().reply_text("Nothing to do.");
//! let agent = AgentLoop::new(Arc::new(provider), Arc::new(registry), AgentConfig::default());
//!
//! let outcome = agent.run("hello").await?;
//! println!("{}", outcome.response);
//! ```

mod agent_loop;
mod types;

pub use agent_loop::AgentLoop;
pub use types::{
    AgentConfig, FinishReason, LoopState, RunOutcome, FALLBACK_RESPONSE, ITERATION_LIMIT_RESPONSE,
};
