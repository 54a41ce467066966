//! Record store abstraction
//!
//! A store keeps tasks keyed by integer id. Listing returns tasks in
//! ascending id order, which is creation order for both backends.

mod memory;
#[cfg(feature = "sqlite")]
mod sqlite;

pub use memory::MemoryTaskStore;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteTaskStore;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::model::{NewTask, Task, TaskPatch, TaskStatus};

/// Result type for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Persistence backend for tasks
///
/// Implementations must be safe for concurrent use from independent
/// agent runs and request handlers. Overlapping updates resolve as
/// last write wins per field.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Insert a new pending task and return it with its assigned id
    async fn create(&self, new: NewTask) -> StoreResult<Task>;

    /// All tasks, or only those with `status`, in ascending id order
    async fn list(&self, status: Option<TaskStatus>) -> StoreResult<Vec<Task>>;

    async fn get(&self, id: i64) -> StoreResult<Option<Task>>;

    /// Apply a partial update. `None` when no task has this id.
    async fn update(&self, id: i64, patch: TaskPatch) -> StoreResult<Option<Task>>;

    /// `false` when no task has this id
    async fn delete(&self, id: i64) -> StoreResult<bool>;

    /// Remove every task and restart id assignment. Returns how many were removed.
    async fn clear(&self) -> StoreResult<u64>;
}
