//! Tool Registry Factory Module
//!
//! Shared tool registry creation for both CLI and server.

use std::sync::Arc;

use crate::service::TaskService;
use crate::tools::task::{AddTask, DeleteTask, ListTasks, UpdateTask};
use crate::tools::ToolRegistry;

/// Registry with the four task tools, in advertised order
pub fn create_task_tool_registry(service: TaskService) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(AddTask::new(service.clone())));
    registry.register(Arc::new(ListTasks::new(service.clone())));
    registry.register(Arc::new(UpdateTask::new(service.clone())));
    registry.register(Arc::new(DeleteTask::new(service)));
    registry
}
