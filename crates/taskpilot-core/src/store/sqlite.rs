//! SQLite task store
//!
//! Keeps tasks in a single `task` table. The table is created on connect
//! when missing; there is no migration tooling.

use std::str::FromStr;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use tracing::{debug, info};

use super::{StoreResult, TaskStore};
use crate::error::StoreError;
use crate::model::{NewTask, Task, TaskPatch, TaskStatus};

const CREATE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS task (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    title       TEXT NOT NULL,
    description TEXT,
    status      TEXT NOT NULL DEFAULT 'pending',
    user_id     TEXT
)"#;

const CREATE_TITLE_INDEX: &str = "CREATE INDEX IF NOT EXISTS ix_task_title ON task (title)";

const COLUMNS: &str = "id, title, description, status, user_id";

/// Store backed by an sqlx SQLite pool
#[derive(Debug, Clone)]
pub struct SqliteTaskStore {
    pool: SqlitePool,
}

impl SqliteTaskStore {
    /// Connect to `url` (e.g. `sqlite://tasks.db` or `sqlite::memory:`) and
    /// create the table if needed
    pub async fn connect(url: &str) -> StoreResult<Self> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);

        // Every connection to `:memory:` is its own database, so pin the
        // pool to one connection that never expires.
        let pool = if url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new()
                .max_connections(5)
                .connect_with(options)
                .await?
        };

        let store = Self { pool };
        store.init_schema().await?;
        info!(url, "SQLite task store ready");
        Ok(store)
    }

    async fn init_schema(&self) -> StoreResult<()> {
        sqlx::query(CREATE_TABLE).execute(&self.pool).await?;
        sqlx::query(CREATE_TITLE_INDEX).execute(&self.pool).await?;
        Ok(())
    }

    fn row_to_task(row: &SqliteRow) -> StoreResult<Task> {
        let status: String = row.try_get("status")?;
        let status = TaskStatus::from_str(&status).map_err(StoreError::Corrupt)?;

        Ok(Task {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            status,
            user_id: row.try_get("user_id")?,
        })
    }
}

#[async_trait]
impl TaskStore for SqliteTaskStore {
    async fn create(&self, new: NewTask) -> StoreResult<Task> {
        let sql = format!(
            "INSERT INTO task (title, description, status, user_id) VALUES (?, ?, ?, ?) RETURNING {}",
            COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(&new.title)
            .bind(&new.description)
            .bind(TaskStatus::Pending.as_str())
            .bind(&new.user_id)
            .fetch_one(&self.pool)
            .await?;
        let task = Self::row_to_task(&row)?;
        debug!(task_id = task.id, "Inserted task");
        Ok(task)
    }

    async fn list(&self, status: Option<TaskStatus>) -> StoreResult<Vec<Task>> {
        let rows = match status {
            Some(status) => {
                let sql = format!("SELECT {} FROM task WHERE status = ? ORDER BY id", COLUMNS);
                sqlx::query(&sql)
                    .bind(status.as_str())
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                let sql = format!("SELECT {} FROM task ORDER BY id", COLUMNS);
                sqlx::query(&sql).fetch_all(&self.pool).await?
            }
        };
        rows.iter().map(Self::row_to_task).collect()
    }

    async fn get(&self, id: i64) -> StoreResult<Option<Task>> {
        let sql = format!("SELECT {} FROM task WHERE id = ?", COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(Self::row_to_task).transpose()
    }

    async fn update(&self, id: i64, patch: TaskPatch) -> StoreResult<Option<Task>> {
        // Single statement so concurrent partial updates interleave per field.
        let sql = format!(
            "UPDATE task SET \
                title = COALESCE(?, title), \
                description = COALESCE(?, description), \
                status = COALESCE(?, status) \
             WHERE id = ? RETURNING {}",
            COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(&patch.title)
            .bind(&patch.description)
            .bind(patch.status.map(|s| s.as_str()))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(Self::row_to_task).transpose()
    }

    async fn delete(&self, id: i64) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM task WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn clear(&self) -> StoreResult<u64> {
        let mut tx = self.pool.begin().await?;
        let removed = sqlx::query("DELETE FROM task")
            .execute(&mut *tx)
            .await?
            .rows_affected();
        sqlx::query("DELETE FROM sqlite_sequence WHERE name = 'task'")
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        info!(removed, "Cleared task table");
        Ok(removed)
    }
}
