//! list_tasks tool

use serde_json::{json, Value};

use crate::error::ToolError;
use crate::service::TaskService;
use crate::tools::args::optional_status;
use crate::tools::{BoxFuture, Tool, ToolOutput};

pub struct ListTasks {
    service: TaskService,
}

impl ListTasks {
    pub fn new(service: TaskService) -> Self {
        Self { service }
    }
}

impl Tool for ListTasks {
    fn name(&self) -> &str {
        "list_tasks"
    }

    fn description(&self) -> &str {
        "List all tasks, optionally filtered by status"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "status": {
                    "type": "string",
                    "enum": super::status_enum(),
                    "description": "Filter by status"
                }
            }
        })
    }

    fn read_only(&self) -> bool {
        true
    }

    fn execute(&self, args: Value) -> BoxFuture<'_, Result<ToolOutput, ToolError>> {
        Box::pin(async move {
            let status = optional_status(&args, "status")?;
            let tasks = self.service.list(status).await?;
            Ok(ToolOutput::Tasks(tasks))
        })
    }
}
