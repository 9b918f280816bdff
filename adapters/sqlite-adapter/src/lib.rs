//! sqlite-adapter: SQLite implementation of the `TasksDataSource` port used
//! as the durable local store.
//!
//! Purpose
//! - Keep a per-device copy of the task list that survives restarts.
//! - Follow the local-store convention: an empty table reads as "unavailable"
//!   so the repository falls back to the remote.
//!
//! Notes
//! - Uses `rusqlite` with the `bundled` feature for portability.
//! - Statements run on Tokio's blocking pool; the connection sits behind a
//!   mutex shared with those blocking tasks.
//! - Rows keep insertion order through an autoincrement `seq` column; saving
//!   an existing task updates it in place. Completing or activating a task
//!   value stores it even when the table did not hold it yet.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use domain::validate::{require_id, require_task};
use domain::{CoreError, Task, TasksDataSource};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

const SELECT_TASK: &str = "SELECT entryid, title, description, completed FROM tasks";

/// SQLite-backed local task store.
#[derive(Clone)]
pub struct SqliteTasksSource {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteTasksSource {
    /// Open (or create) a SQLite database at the given path and ensure schema.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, CoreError> {
        let conn = Connection::open(path).map_err(map_sqerr)?;
        Self::with_connection(conn)
    }

    /// Private in-memory database; contents vanish with the value.
    pub fn in_memory() -> Result<Self, CoreError> {
        let conn = Connection::open_in_memory().map_err(map_sqerr)?;
        Self::with_connection(conn)
    }

    /// Open at `path`, creating missing parent directories first.
    pub fn open_creating_dirs<P: AsRef<Path>>(path: P) -> Result<Self, CoreError> {
        if let Some(dir) = path.as_ref().parent() {
            if !dir.as_os_str().is_empty() {
                std::fs::create_dir_all(dir)
                    .map_err(|e| CoreError::Repository(format!("create db dir: {e}")))?;
            }
        }
        Self::new(path)
    }

    fn with_connection(conn: Connection) -> Result<Self, CoreError> {
        init_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` against the connection on the blocking pool.
    async fn with_conn<T, F>(&self, f: F) -> Result<T, CoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, CoreError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let conn = conn
                .lock()
                .map_err(|_| CoreError::Repository("mutex poisoned".into()))?;
            f(&conn)
        })
        .await
        .map_err(|e| CoreError::Repository(format!("blocking task failed: {e}")))?
    }

    async fn set_completed(&self, task_id: String, completed: bool) -> Result<usize, CoreError> {
        self.with_conn(move |conn| {
            conn.execute(
                "UPDATE tasks SET completed = ?1 WHERE entryid = ?2",
                params![completed as i64, task_id],
            )
            .map_err(map_sqerr)
        })
        .await
    }
}

fn init_schema(conn: &Connection) -> Result<(), CoreError> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS tasks (
            seq INTEGER PRIMARY KEY AUTOINCREMENT,
            entryid TEXT NOT NULL UNIQUE,
            title TEXT NOT NULL DEFAULT '',
            description TEXT NOT NULL DEFAULT '',
            completed INTEGER NOT NULL DEFAULT 0
        );
        "#,
    )
    .map_err(map_sqerr)
}

fn map_sqerr<E: std::fmt::Display>(e: E) -> CoreError {
    CoreError::Repository(format!("sqlite error: {e}"))
}

fn row_to_task(row: &rusqlite::Row) -> Result<Task, CoreError> {
    let id: String = row.get(0).map_err(map_sqerr)?;
    let title: String = row.get(1).map_err(map_sqerr)?;
    let description: String = row.get(2).map_err(map_sqerr)?;
    let completed: i64 = row.get(3).map_err(map_sqerr)?;

    let task = Task::with_id(title, description, id)
        .map_err(|e| CoreError::Repository(format!("bad task row: {e}")))?;
    Ok(if completed != 0 { task.completed() } else { task })
}

fn upsert(conn: &Connection, task: &Task) -> Result<(), CoreError> {
    conn.execute(
        "INSERT INTO tasks(entryid, title, description, completed) VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(entryid) DO UPDATE SET
            title = excluded.title,
            description = excluded.description,
            completed = excluded.completed",
        params![
            task.id(),
            task.title(),
            task.description(),
            task.is_completed() as i64,
        ],
    )
    .map_err(map_sqerr)?;
    Ok(())
}

#[async_trait]
impl TasksDataSource for SqliteTasksSource {
    async fn get_tasks(&self) -> Result<Option<Vec<Task>>, CoreError> {
        let tasks = self
            .with_conn(|conn| {
                let mut stmt = conn
                    .prepare(&format!("{SELECT_TASK} ORDER BY seq ASC"))
                    .map_err(map_sqerr)?;
                let mut rows = stmt.query([]).map_err(map_sqerr)?;
                let mut out = Vec::new();
                while let Some(row) = rows.next().map_err(map_sqerr)? {
                    out.push(row_to_task(row)?);
                }
                Ok(out)
            })
            .await?;
        debug!(count = tasks.len(), "sqlite tasks loaded");
        // An empty table is the signal to try the remote.
        Ok(if tasks.is_empty() { None } else { Some(tasks) })
    }

    async fn get_task(&self, task_id: &str) -> Result<Option<Task>, CoreError> {
        require_id(task_id)?;
        let task_id = task_id.to_string();
        self.with_conn(move |conn| {
            let mut stmt = conn
                .prepare(&format!("{SELECT_TASK} WHERE entryid = ?1"))
                .map_err(map_sqerr)?;
            let row = stmt
                .query_row(params![task_id], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, i64>(3)?,
                    ))
                })
                .optional()
                .map_err(map_sqerr)?;
            row.map(|(id, title, description, completed)| {
                let task = Task::with_id(title, description, id)?;
                Ok(if completed != 0 { task.completed() } else { task })
            })
            .transpose()
        })
        .await
    }

    async fn save_task(&self, task: &Task) -> Result<(), CoreError> {
        require_task(task)?;
        let task = task.clone();
        self.with_conn(move |conn| upsert(conn, &task)).await
    }

    async fn complete_task(&self, task: &Task) -> Result<(), CoreError> {
        require_task(task)?;
        let task = task.completed();
        self.with_conn(move |conn| upsert(conn, &task)).await
    }

    async fn complete_task_by_id(&self, task_id: &str) -> Result<(), CoreError> {
        require_id(task_id)?;
        match self.set_completed(task_id.to_string(), true).await? {
            0 => Err(CoreError::NotFound(task_id.to_string())),
            _ => Ok(()),
        }
    }

    async fn activate_task(&self, task: &Task) -> Result<(), CoreError> {
        require_task(task)?;
        let task = task.activated();
        self.with_conn(move |conn| upsert(conn, &task)).await
    }

    async fn activate_task_by_id(&self, task_id: &str) -> Result<(), CoreError> {
        require_id(task_id)?;
        match self.set_completed(task_id.to_string(), false).await? {
            0 => Err(CoreError::NotFound(task_id.to_string())),
            _ => Ok(()),
        }
    }

    async fn clear_completed_tasks(&self) -> Result<(), CoreError> {
        let removed = self
            .with_conn(|conn| {
                conn.execute("DELETE FROM tasks WHERE completed = 1", [])
                    .map_err(map_sqerr)
            })
            .await?;
        debug!(removed, "sqlite completed tasks cleared");
        Ok(())
    }

    async fn refresh_tasks(&self) -> Result<(), CoreError> {
        // Reads always hit the database; nothing to invalidate.
        Ok(())
    }

    async fn delete_all_tasks(&self) -> Result<(), CoreError> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM tasks", []).map_err(map_sqerr)?;
            Ok(())
        })
        .await
    }

    async fn delete_task(&self, task_id: &str) -> Result<(), CoreError> {
        require_id(task_id)?;
        let task_id = task_id.to_string();
        self.with_conn(move |conn| {
            conn.execute("DELETE FROM tasks WHERE entryid = ?1", params![task_id])
                .map_err(map_sqerr)?;
            Ok(())
        })
        .await
    }
}
