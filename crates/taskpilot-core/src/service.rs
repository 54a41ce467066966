//! Task service: the store plus lifecycle event publishing
//!
//! Both the REST routes and the tools mutate tasks through this type so
//! every successful change emits the same events.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::error::StoreError;
use crate::events::{publish_in_background, EventPublisher, LogPublisher, TaskEvent, TaskEventType};
use crate::model::{NewTask, Task, TaskPatch, TaskStatus};
use crate::store::{MemoryTaskStore, TaskStore};

type ServiceResult<T> = std::result::Result<T, StoreError>;

#[derive(Clone)]
pub struct TaskService {
    store: Arc<dyn TaskStore>,
    events: Arc<dyn EventPublisher>,
    /// Event publishes still in flight
    pending: Arc<Mutex<JoinSet<()>>>,
}

impl TaskService {
    pub fn new(store: Arc<dyn TaskStore>, events: Arc<dyn EventPublisher>) -> Self {
        Self {
            store,
            events,
            pending: Arc::new(Mutex::new(JoinSet::new())),
        }
    }

    /// In-memory store with log-only events
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryTaskStore::new()), Arc::new(LogPublisher))
    }

    pub fn store(&self) -> &Arc<dyn TaskStore> {
        &self.store
    }

    fn emit(&self, event_type: TaskEventType, task: &Task) {
        publish_in_background(
            &mut self.pending.lock(),
            self.events.clone(),
            TaskEvent::new(event_type, task),
        );
    }

    /// Wait for every event publish started so far.
    ///
    /// Call before the runtime shuts down; dropping the runtime cancels
    /// publishes that are still running.
    pub async fn flush(&self) {
        let mut in_flight = std::mem::take(&mut *self.pending.lock());
        while let Some(joined) = in_flight.join_next().await {
            if let Err(e) = joined {
                warn!(error = %e, "Event publish task failed");
            }
        }
    }

    pub async fn create(&self, new: NewTask) -> ServiceResult<Task> {
        let task = self.store.create(new).await?;
        debug!(task_id = task.id, "Task created");
        self.emit(TaskEventType::Created, &task);
        Ok(task)
    }

    pub async fn list(&self, status: Option<TaskStatus>) -> ServiceResult<Vec<Task>> {
        self.store.list(status).await
    }

    pub async fn get(&self, id: i64) -> ServiceResult<Option<Task>> {
        self.store.get(id).await
    }

    pub async fn update(&self, id: i64, patch: TaskPatch) -> ServiceResult<Option<Task>> {
        let completes = patch.status == Some(TaskStatus::Completed);
        let updated = self.store.update(id, patch).await?;
        if let Some(task) = &updated {
            debug!(task_id = task.id, "Task updated");
            let event_type = if completes {
                TaskEventType::Completed
            } else {
                TaskEventType::Updated
            };
            self.emit(event_type, task);
        }
        Ok(updated)
    }

    pub async fn delete(&self, id: i64) -> ServiceResult<bool> {
        // Fetch first so the event can carry the title.
        let existing = self.store.get(id).await?;
        let deleted = self.store.delete(id).await?;
        if deleted {
            debug!(task_id = id, "Task deleted");
            if let Some(task) = existing {
                self.emit(TaskEventType::Deleted, &task);
            }
        }
        Ok(deleted)
    }

    pub async fn clear(&self) -> ServiceResult<u64> {
        self.store.clear().await
    }
}
