//! Task management tools
//!
//! The four tools advertised to the model, in the order they are listed.

mod add;
mod delete;
mod list;
mod update;

pub use add::AddTask;
pub use delete::DeleteTask;
pub use list::ListTasks;
pub use update::UpdateTask;

/// Enum values advertised for the `status` parameter
pub(crate) fn status_enum() -> serde_json::Value {
    serde_json::Value::from(
        crate::model::TaskStatus::ALL
            .iter()
            .map(|s| s.as_str())
            .collect::<Vec<_>>(),
    )
}
