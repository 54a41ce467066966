//! add_task tool

use serde_json::{json, Value};

use crate::error::ToolError;
use crate::model::NewTask;
use crate::service::TaskService;
use crate::tools::args::{optional_str, required_text};
use crate::tools::{BoxFuture, Tool, ToolOutput};

pub struct AddTask {
    service: TaskService,
}

impl AddTask {
    pub fn new(service: TaskService) -> Self {
        Self { service }
    }
}

impl Tool for AddTask {
    fn name(&self) -> &str {
        "add_task"
    }

    fn description(&self) -> &str {
        "Add a new task to the todo list"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "title": {
                    "type": "string",
                    "description": "The title of the task"
                },
                "description": {
                    "type": "string",
                    "description": "Optional description"
                }
            },
            "required": ["title"]
        })
    }

    fn execute(&self, args: Value) -> BoxFuture<'_, Result<ToolOutput, ToolError>> {
        Box::pin(async move {
            let title = required_text(&args, "title")?;
            let description = optional_str(&args, "description")?;

            let task = self
                .service
                .create(NewTask {
                    title,
                    description,
                    user_id: None,
                })
                .await?;
            Ok(ToolOutput::Task(task))
        })
    }
}
