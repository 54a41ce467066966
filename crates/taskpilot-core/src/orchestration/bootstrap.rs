//! Startup wiring shared by the CLI and the server
//!
//! Both entry points build exactly one task service and one agent from
//! the effective configuration and hand them to their handlers.

use std::sync::Arc;

use tracing::info;

use crate::config::{Config, StorageConfig};
use crate::error::{Error, Result};
use crate::events::publisher_from_config;
use crate::provider::create_provider;
use crate::service::TaskService;
use crate::session::{AgentConfig, AgentLoop};
use crate::store::{MemoryTaskStore, TaskStore};

use super::create_task_tool_registry;

/// Open the configured record store; in memory when no database URL is set
pub async fn open_store(config: &StorageConfig) -> Result<Arc<dyn TaskStore>> {
    match config.database_url.as_deref() {
        None => {
            info!("Using in-memory task store");
            Ok(Arc::new(MemoryTaskStore::new()))
        }
        Some(url) => open_database(url).await,
    }
}

#[cfg(feature = "sqlite")]
async fn open_database(url: &str) -> Result<Arc<dyn TaskStore>> {
    if !url.starts_with("sqlite:") {
        return Err(Error::Config(format!(
            "Unsupported database URL '{}': only sqlite: URLs are supported",
            url
        )));
    }
    let store = crate::store::SqliteTaskStore::connect(url).await?;
    Ok(Arc::new(store))
}

#[cfg(not(feature = "sqlite"))]
async fn open_database(url: &str) -> Result<Arc<dyn TaskStore>> {
    Err(Error::Config(format!(
        "Database URL '{}' requires the sqlite feature",
        url
    )))
}

/// Task service over the configured store and event publisher
pub async fn create_task_service(config: &Config) -> Result<TaskService> {
    let store = open_store(&config.storage).await?;
    let events = publisher_from_config(&config.events);
    Ok(TaskService::new(store, events))
}

/// Agent over the configured provider with the task tools
pub fn create_agent(config: &Config, service: TaskService) -> Result<AgentLoop> {
    let provider = create_provider(&config.provider)?;
    let registry = create_task_tool_registry(service);
    Ok(AgentLoop::new(
        provider,
        Arc::new(registry),
        AgentConfig::from_settings(&config.agent),
    ))
}
