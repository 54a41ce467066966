//! In-memory task store

use std::collections::BTreeMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::{StoreResult, TaskStore};
use crate::model::{NewTask, Task, TaskPatch, TaskStatus};

#[derive(Debug)]
struct Inner {
    tasks: BTreeMap<i64, Task>,
    next_id: i64,
}

/// Process-local store backed by an ordered map
#[derive(Debug)]
pub struct MemoryTaskStore {
    inner: RwLock<Inner>,
}

impl MemoryTaskStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                tasks: BTreeMap::new(),
                next_id: 1,
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.read().tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryTaskStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TaskStore for MemoryTaskStore {
    async fn create(&self, new: NewTask) -> StoreResult<Task> {
        let mut inner = self.inner.write();
        let id = inner.next_id;
        inner.next_id += 1;

        let task = Task {
            id,
            title: new.title,
            description: new.description,
            status: TaskStatus::Pending,
            user_id: new.user_id,
        };
        inner.tasks.insert(id, task.clone());
        Ok(task)
    }

    async fn list(&self, status: Option<TaskStatus>) -> StoreResult<Vec<Task>> {
        let inner = self.inner.read();
        Ok(inner
            .tasks
            .values()
            .filter(|t| status.is_none_or(|s| t.status == s))
            .cloned()
            .collect())
    }

    async fn get(&self, id: i64) -> StoreResult<Option<Task>> {
        Ok(self.inner.read().tasks.get(&id).cloned())
    }

    async fn update(&self, id: i64, patch: TaskPatch) -> StoreResult<Option<Task>> {
        let mut inner = self.inner.write();
        Ok(inner.tasks.get_mut(&id).map(|task| {
            patch.apply_to(task);
            task.clone()
        }))
    }

    async fn delete(&self, id: i64) -> StoreResult<bool> {
        Ok(self.inner.write().tasks.remove(&id).is_some())
    }

    async fn clear(&self) -> StoreResult<u64> {
        let mut inner = self.inner.write();
        let removed = inner.tasks.len() as u64;
        inner.tasks.clear();
        inner.next_id = 1;
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ids_are_never_reused_after_delete() {
        let store = MemoryTaskStore::new();
        let a = store.create(NewTask::new("a")).await.unwrap();
        let b = store.create(NewTask::new("b")).await.unwrap();
        assert!(store.delete(b.id).await.unwrap());

        let c = store.create(NewTask::new("c")).await.unwrap();
        assert_ne!(c.id, a.id);
        assert_ne!(c.id, b.id);
    }

    #[tokio::test]
    async fn test_clear_restarts_ids() {
        let store = MemoryTaskStore::new();
        store.create(NewTask::new("a")).await.unwrap();
        store.create(NewTask::new("b")).await.unwrap();

        assert_eq!(store.clear().await.unwrap(), 2);
        assert!(store.is_empty());
        let task = store.create(NewTask::new("c")).await.unwrap();
        assert_eq!(task.id, 1);
    }
}
