//! Record store contract tests
//!
//! The same checks run against every backend.

use std::sync::Arc;

use taskpilot_core::model::{NewTask, TaskPatch, TaskStatus};
use taskpilot_core::store::{MemoryTaskStore, TaskStore};

async fn check_create_and_get(store: &dyn TaskStore) {
    let a = store.create(NewTask::new("Buy milk")).await.unwrap();
    let b = store
        .create(NewTask::new("Call mom").with_description("Sunday").with_user("u1"))
        .await
        .unwrap();

    assert!(b.id > a.id);
    assert_eq!(a.status, TaskStatus::Pending);
    assert_eq!(b.description.as_deref(), Some("Sunday"));
    assert_eq!(b.user_id.as_deref(), Some("u1"));

    assert_eq!(store.get(a.id).await.unwrap(), Some(a));
    assert_eq!(store.get(9999).await.unwrap(), None);
}

async fn check_partial_update(store: &dyn TaskStore) {
    let task = store
        .create(NewTask::new("Water plants").with_description("Balcony"))
        .await
        .unwrap();

    let updated = store
        .update(task.id, TaskPatch::status(TaskStatus::Completed))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.title, "Water plants");
    assert_eq!(updated.description.as_deref(), Some("Balcony"));
    assert_eq!(updated.status, TaskStatus::Completed);

    let renamed = store
        .update(
            task.id,
            TaskPatch {
                title: Some("Water all plants".to_string()),
                ..TaskPatch::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(renamed.title, "Water all plants");
    assert_eq!(renamed.status, TaskStatus::Completed);

    assert!(store
        .update(9999, TaskPatch::status(TaskStatus::Pending))
        .await
        .unwrap()
        .is_none());
}

async fn check_list_and_delete(store: &dyn TaskStore) {
    let a = store.create(NewTask::new("a")).await.unwrap();
    let b = store.create(NewTask::new("b")).await.unwrap();
    let c = store.create(NewTask::new("c")).await.unwrap();
    store
        .update(b.id, TaskPatch::status(TaskStatus::Completed))
        .await
        .unwrap();

    let ids = |tasks: Vec<taskpilot_core::Task>| tasks.into_iter().map(|t| t.id).collect::<Vec<_>>();
    assert_eq!(ids(store.list(None).await.unwrap()), vec![a.id, b.id, c.id]);
    assert_eq!(ids(store.list(Some(TaskStatus::Pending)).await.unwrap()), vec![a.id, c.id]);
    assert_eq!(ids(store.list(Some(TaskStatus::Completed)).await.unwrap()), vec![b.id]);

    assert!(store.delete(a.id).await.unwrap());
    assert!(!store.delete(a.id).await.unwrap());
    assert_eq!(ids(store.list(None).await.unwrap()), vec![b.id, c.id]);

    // Ids are never reused after a delete.
    let d = store.create(NewTask::new("d")).await.unwrap();
    assert!(d.id > c.id);
}

async fn check_clear(store: &dyn TaskStore) {
    store.create(NewTask::new("x")).await.unwrap();
    store.create(NewTask::new("y")).await.unwrap();

    assert_eq!(store.clear().await.unwrap(), 2);
    assert!(store.list(None).await.unwrap().is_empty());

    let fresh = store.create(NewTask::new("z")).await.unwrap();
    assert_eq!(fresh.id, 1);
}

async fn check_concurrent_creates(store: Arc<dyn TaskStore>) {
    let handles: Vec<_> = (0..10)
        .map(|i| {
            let store = store.clone();
            tokio::spawn(async move { store.create(NewTask::new(format!("task {}", i))).await })
        })
        .collect();

    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.unwrap().unwrap().id);
    }
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 10);
    assert_eq!(store.list(None).await.unwrap().len(), 10);
}

mod memory_store_tests {
    use super::*;

    #[tokio::test]
    async fn test_create_and_get() {
        check_create_and_get(&MemoryTaskStore::new()).await;
    }

    #[tokio::test]
    async fn test_partial_update() {
        check_partial_update(&MemoryTaskStore::new()).await;
    }

    #[tokio::test]
    async fn test_list_and_delete() {
        check_list_and_delete(&MemoryTaskStore::new()).await;
    }

    #[tokio::test]
    async fn test_clear() {
        check_clear(&MemoryTaskStore::new()).await;
    }

    #[tokio::test]
    async fn test_concurrent_creates() {
        check_concurrent_creates(Arc::new(MemoryTaskStore::new())).await;
    }
}

#[cfg(feature = "sqlite")]
mod sqlite_store_tests {
    use super::*;
    use taskpilot_core::store::SqliteTaskStore;
    use tempfile::TempDir;

    async fn memory_db() -> SqliteTaskStore {
        SqliteTaskStore::connect("sqlite::memory:").await.unwrap()
    }

    #[tokio::test]
    async fn test_create_and_get() {
        check_create_and_get(&memory_db().await).await;
    }

    #[tokio::test]
    async fn test_partial_update() {
        check_partial_update(&memory_db().await).await;
    }

    #[tokio::test]
    async fn test_list_and_delete() {
        check_list_and_delete(&memory_db().await).await;
    }

    #[tokio::test]
    async fn test_clear() {
        check_clear(&memory_db().await).await;
    }

    #[tokio::test]
    async fn test_concurrent_creates() {
        let dir = TempDir::new().unwrap();
        let url = format!("sqlite://{}", dir.path().join("tasks.db").display());
        let store = SqliteTaskStore::connect(&url).await.unwrap();
        check_concurrent_creates(Arc::new(store)).await;
    }

    #[tokio::test]
    async fn test_tasks_survive_reconnect() {
        let dir = TempDir::new().unwrap();
        let url = format!("sqlite://{}", dir.path().join("tasks.db").display());

        let created = {
            let store = SqliteTaskStore::connect(&url).await.unwrap();
            store.create(NewTask::new("Persist me")).await.unwrap()
        };

        let store = SqliteTaskStore::connect(&url).await.unwrap();
        assert_eq!(store.get(created.id).await.unwrap(), Some(created));
    }
}
