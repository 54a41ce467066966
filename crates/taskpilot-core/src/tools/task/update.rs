//! update_task tool

use serde_json::{json, Value};

use crate::error::ToolError;
use crate::model::TaskPatch;
use crate::service::TaskService;
use crate::tools::args::{optional_status, optional_str, task_id};
use crate::tools::{BoxFuture, Tool, ToolOutput};

pub struct UpdateTask {
    service: TaskService,
}

impl UpdateTask {
    pub fn new(service: TaskService) -> Self {
        Self { service }
    }
}

impl Tool for UpdateTask {
    fn name(&self) -> &str {
        "update_task"
    }

    fn description(&self) -> &str {
        "Update a task's title, description, or status"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "task_id": {
                    "type": "integer",
                    "description": "The ID of the task"
                },
                "title": {
                    "type": "string",
                    "description": "New title"
                },
                "description": {
                    "type": "string",
                    "description": "New description"
                },
                "status": {
                    "type": "string",
                    "enum": super::status_enum(),
                    "description": "New status"
                }
            },
            "required": ["task_id"]
        })
    }

    fn execute(&self, args: Value) -> BoxFuture<'_, Result<ToolOutput, ToolError>> {
        Box::pin(async move {
            let id = task_id(&args)?;
            let title = optional_str(&args, "title")?;
            if title.as_deref().is_some_and(|t| t.trim().is_empty()) {
                return Err(ToolError::InvalidParams("title must not be empty".into()));
            }

            let patch = TaskPatch {
                title,
                description: optional_str(&args, "description")?,
                status: optional_status(&args, "status")?,
            };

            match self.service.update(id, patch).await? {
                Some(task) => Ok(ToolOutput::Task(task)),
                None => Err(ToolError::NotFound(id)),
            }
        })
    }
}
