use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use indexmap::IndexMap;

use crate::validate::{require_id, require_task};
use crate::{CoreError, Task, TasksDataSource};

/// Simple in-memory store for tests and demos. Keeps insertion order and
/// follows the local-store convention that an empty store is "unavailable".
pub struct InMemoryDataSource {
    inner: Mutex<IndexMap<String, Task>>,
}

impl InMemoryDataSource {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(IndexMap::new()),
        }
    }

    /// Build a store pre-populated with `tasks`, in iteration order.
    pub fn with_tasks<I: IntoIterator<Item = Task>>(tasks: I) -> Self {
        let map = tasks
            .into_iter()
            .map(|t| (t.id().to_string(), t))
            .collect();
        Self {
            inner: Mutex::new(map),
        }
    }

    /// Current contents, in insertion order.
    pub fn snapshot(&self) -> Result<Vec<Task>, CoreError> {
        Ok(self.map()?.values().cloned().collect())
    }

    pub fn len(&self) -> Result<usize, CoreError> {
        Ok(self.map()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, CoreError> {
        Ok(self.map()?.is_empty())
    }

    fn map(&self) -> Result<MutexGuard<'_, IndexMap<String, Task>>, CoreError> {
        self.inner
            .lock()
            .map_err(|_| CoreError::Repository("mutex poisoned".into()))
    }

    fn set_completed(&self, task_id: &str, completed: bool) -> Result<(), CoreError> {
        let mut map = self.map()?;
        match map.get_mut(task_id) {
            Some(task) => {
                *task = if completed {
                    task.completed()
                } else {
                    task.activated()
                };
                Ok(())
            }
            None => Err(CoreError::NotFound(task_id.to_string())),
        }
    }
}

impl Default for InMemoryDataSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TasksDataSource for InMemoryDataSource {
    async fn get_tasks(&self) -> Result<Option<Vec<Task>>, CoreError> {
        let map = self.map()?;
        if map.is_empty() {
            return Ok(None);
        }
        Ok(Some(map.values().cloned().collect()))
    }

    async fn get_task(&self, task_id: &str) -> Result<Option<Task>, CoreError> {
        require_id(task_id)?;
        Ok(self.map()?.get(task_id).cloned())
    }

    async fn save_task(&self, task: &Task) -> Result<(), CoreError> {
        require_task(task)?;
        self.map()?.insert(task.id().to_string(), task.clone());
        Ok(())
    }

    async fn complete_task(&self, task: &Task) -> Result<(), CoreError> {
        require_task(task)?;
        self.map()?
            .insert(task.id().to_string(), task.completed());
        Ok(())
    }

    async fn complete_task_by_id(&self, task_id: &str) -> Result<(), CoreError> {
        require_id(task_id)?;
        self.set_completed(task_id, true)
    }

    async fn activate_task(&self, task: &Task) -> Result<(), CoreError> {
        require_task(task)?;
        self.map()?
            .insert(task.id().to_string(), task.activated());
        Ok(())
    }

    async fn activate_task_by_id(&self, task_id: &str) -> Result<(), CoreError> {
        require_id(task_id)?;
        self.set_completed(task_id, false)
    }

    async fn clear_completed_tasks(&self) -> Result<(), CoreError> {
        self.map()?.retain(|_, t| t.is_active());
        Ok(())
    }

    async fn refresh_tasks(&self) -> Result<(), CoreError> {
        // Nothing cached on top of the map itself.
        Ok(())
    }

    async fn delete_all_tasks(&self) -> Result<(), CoreError> {
        self.map()?.clear();
        Ok(())
    }

    async fn delete_task(&self, task_id: &str) -> Result<(), CoreError> {
        require_id(task_id)?;
        self.map()?.shift_remove(task_id);
        Ok(())
    }
}
