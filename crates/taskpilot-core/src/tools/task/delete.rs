//! delete_task tool

use serde_json::{json, Value};

use crate::error::ToolError;
use crate::service::TaskService;
use crate::tools::args::task_id;
use crate::tools::{BoxFuture, Tool, ToolOutput};

pub struct DeleteTask {
    service: TaskService,
}

impl DeleteTask {
    pub fn new(service: TaskService) -> Self {
        Self { service }
    }
}

impl Tool for DeleteTask {
    fn name(&self) -> &str {
        "delete_task"
    }

    fn description(&self) -> &str {
        "Delete a task by ID"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "task_id": {
                    "type": "integer",
                    "description": "The ID of the task"
                }
            },
            "required": ["task_id"]
        })
    }

    fn execute(&self, args: Value) -> BoxFuture<'_, Result<ToolOutput, ToolError>> {
        Box::pin(async move {
            let id = task_id(&args)?;
            if self.service.delete(id).await? {
                Ok(ToolOutput::Flag(true))
            } else {
                Err(ToolError::NotFound(id))
            }
        })
    }
}
