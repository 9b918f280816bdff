//! Caching repository that composes a local and a remote store.
//!
//! Reads go cache → local → remote. A full-list read answered by a store
//! replaces the cache wholesale; when the answer came from the remote it is
//! also written back into the local store. Writes go to both stores and then
//! update the cache. `refresh_tasks` marks the cache dirty so the next
//! full-list read goes straight to the remote.
//!
//! Cache and dirty flag sit behind one mutex that is never held across an
//! `.await`, so interleaved futures see each step as a unit.

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use indexmap::IndexMap;
use tracing::{debug, info, warn};

use crate::validate::{require_id, require_task};
use crate::{CoreError, Task, TasksDataSource};

const LOCAL: &str = "local";
const REMOTE: &str = "remote";

#[derive(Default)]
struct CacheState {
    /// `None` until the first write or successful fetch.
    tasks: Option<IndexMap<String, Task>>,
    dirty: bool,
}

impl CacheState {
    fn cache_mut(&mut self) -> &mut IndexMap<String, Task> {
        self.tasks.get_or_insert_with(IndexMap::new)
    }
}

/// Single entry point for task data, backed by a local and a remote store.
///
/// Construct one per application and share it by reference; it implements
/// [`TasksDataSource`] itself so callers treat it like any other store.
pub struct TasksRepository<L, R> {
    local: L,
    remote: R,
    state: Mutex<CacheState>,
}

impl<L: TasksDataSource, R: TasksDataSource> TasksRepository<L, R> {
    pub fn new(local: L, remote: R) -> Self {
        Self {
            local,
            remote,
            state: Mutex::new(CacheState::default()),
        }
    }

    pub fn local(&self) -> &L {
        &self.local
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    /// Cache contents in insertion order, or `None` if never initialised.
    pub fn cached_tasks(&self) -> Result<Option<Vec<Task>>, CoreError> {
        let state = self.state()?;
        Ok(state
            .tasks
            .as_ref()
            .map(|cache| cache.values().cloned().collect()))
    }

    pub fn is_cache_dirty(&self) -> Result<bool, CoreError> {
        Ok(self.state()?.dirty)
    }

    fn state(&self) -> Result<MutexGuard<'_, CacheState>, CoreError> {
        self.state
            .lock()
            .map_err(|_| CoreError::Repository("cache mutex poisoned".into()))
    }

    fn task_with_id(&self, task_id: &str) -> Result<Option<Task>, CoreError> {
        let state = self.state()?;
        Ok(state
            .tasks
            .as_ref()
            .and_then(|cache| cache.get(task_id).cloned()))
    }

    fn cache_put(&self, task: Task) -> Result<(), CoreError> {
        let mut state = self.state()?;
        state.cache_mut().insert(task.id().to_string(), task);
        Ok(())
    }

    fn cache_snapshot(&self) -> Result<Vec<Task>, CoreError> {
        let state = self.state()?;
        Ok(state
            .tasks
            .as_ref()
            .map(|cache| cache.values().cloned().collect())
            .unwrap_or_default())
    }

    /// Replace the cache with `tasks` and mark it clean.
    fn refresh_cache(&self, tasks: &[Task]) -> Result<(), CoreError> {
        let mut state = self.state()?;
        let cache = state.cache_mut();
        cache.clear();
        for task in tasks {
            cache.insert(task.id().to_string(), task.clone());
        }
        state.dirty = false;
        Ok(())
    }

    async fn tasks_from_local(&self) -> Result<Option<Vec<Task>>, CoreError> {
        match self.local.get_tasks().await {
            Ok(Some(tasks)) => {
                debug!(count = tasks.len(), "loaded tasks from local store");
                self.refresh_cache(&tasks)?;
                Ok(Some(self.cache_snapshot()?))
            }
            Ok(None) => {
                debug!("local store has no tasks, asking remote");
                self.tasks_from_remote().await
            }
            Err(e) => {
                warn!(error = %e, "local store read failed, asking remote");
                self.tasks_from_remote().await
            }
        }
    }

    async fn tasks_from_remote(&self) -> Result<Option<Vec<Task>>, CoreError> {
        match self.remote.get_tasks().await {
            Ok(Some(tasks)) => {
                info!(count = tasks.len(), "loaded tasks from remote store");
                self.refresh_cache(&tasks)?;
                self.refresh_local_data_source(&tasks).await;
                Ok(Some(self.cache_snapshot()?))
            }
            Ok(None) => {
                debug!("remote store has no tasks");
                Ok(None)
            }
            Err(e) => {
                warn!(error = %e, "remote store read failed");
                Ok(None)
            }
        }
    }

    /// Make the local store mirror `tasks`.
    async fn refresh_local_data_source(&self, tasks: &[Task]) {
        log_write("delete_all_tasks", LOCAL, self.local.delete_all_tasks().await);
        for task in tasks {
            log_write("save_task", LOCAL, self.local.save_task(task).await);
        }
    }
}

/// Store write failures have no channel back to the caller; record them.
fn log_write(op: &'static str, store: &'static str, result: Result<(), CoreError>) {
    if let Err(e) = result {
        warn!(op, store, error = %e, "store write failed");
    }
}

#[async_trait]
impl<L: TasksDataSource, R: TasksDataSource> TasksDataSource for TasksRepository<L, R> {
    async fn get_tasks(&self) -> Result<Option<Vec<Task>>, CoreError> {
        let dirty = {
            let state = self.state()?;
            if let Some(cache) = state.tasks.as_ref().filter(|_| !state.dirty) {
                debug!(count = cache.len(), "serving tasks from cache");
                return Ok(Some(cache.values().cloned().collect()));
            }
            state.dirty
        };

        if dirty {
            debug!("cache dirty, going to remote");
            self.tasks_from_remote().await
        } else {
            self.tasks_from_local().await
        }
    }

    async fn get_task(&self, task_id: &str) -> Result<Option<Task>, CoreError> {
        require_id(task_id)?;

        if let Some(task) = self.task_with_id(task_id)? {
            debug!(task_id, "serving task from cache");
            return Ok(Some(task));
        }

        match self.local.get_task(task_id).await {
            Ok(Some(task)) => {
                self.cache_put(task.clone())?;
                return Ok(Some(task));
            }
            Ok(None) => {}
            Err(e) => warn!(task_id, error = %e, "local store read failed, asking remote"),
        }

        match self.remote.get_task(task_id).await {
            Ok(Some(task)) => {
                self.cache_put(task.clone())?;
                Ok(Some(task))
            }
            Ok(None) => Ok(None),
            Err(e) => {
                warn!(task_id, error = %e, "remote store read failed");
                Ok(None)
            }
        }
    }

    async fn save_task(&self, task: &Task) -> Result<(), CoreError> {
        require_task(task)?;
        log_write("save_task", REMOTE, self.remote.save_task(task).await);
        log_write("save_task", LOCAL, self.local.save_task(task).await);
        self.cache_put(task.clone())
    }

    async fn complete_task(&self, task: &Task) -> Result<(), CoreError> {
        require_task(task)?;
        log_write("complete_task", REMOTE, self.remote.complete_task(task).await);
        log_write("complete_task", LOCAL, self.local.complete_task(task).await);
        self.cache_put(task.completed())
    }

    async fn complete_task_by_id(&self, task_id: &str) -> Result<(), CoreError> {
        require_id(task_id)?;
        let task = self
            .task_with_id(task_id)?
            .ok_or_else(|| CoreError::NotFound(task_id.to_string()))?;
        self.complete_task(&task).await
    }

    async fn activate_task(&self, task: &Task) -> Result<(), CoreError> {
        require_task(task)?;
        log_write("activate_task", REMOTE, self.remote.activate_task(task).await);
        log_write("activate_task", LOCAL, self.local.activate_task(task).await);
        self.cache_put(task.activated())
    }

    async fn activate_task_by_id(&self, task_id: &str) -> Result<(), CoreError> {
        require_id(task_id)?;
        let task = self
            .task_with_id(task_id)?
            .ok_or_else(|| CoreError::NotFound(task_id.to_string()))?;
        self.activate_task(&task).await
    }

    async fn clear_completed_tasks(&self) -> Result<(), CoreError> {
        log_write(
            "clear_completed_tasks",
            REMOTE,
            self.remote.clear_completed_tasks().await,
        );
        log_write(
            "clear_completed_tasks",
            LOCAL,
            self.local.clear_completed_tasks().await,
        );
        let mut state = self.state()?;
        // An empty cache created here would be served as the full list.
        if let Some(cache) = state.tasks.as_mut() {
            cache.retain(|_, task| task.is_active());
        }
        Ok(())
    }

    async fn refresh_tasks(&self) -> Result<(), CoreError> {
        self.state()?.dirty = true;
        Ok(())
    }

    async fn delete_all_tasks(&self) -> Result<(), CoreError> {
        log_write("delete_all_tasks", REMOTE, self.remote.delete_all_tasks().await);
        log_write("delete_all_tasks", LOCAL, self.local.delete_all_tasks().await);
        let mut state = self.state()?;
        state.cache_mut().clear();
        Ok(())
    }

    async fn delete_task(&self, task_id: &str) -> Result<(), CoreError> {
        require_id(task_id)?;
        log_write("delete_task", REMOTE, self.remote.delete_task(task_id).await);
        log_write("delete_task", LOCAL, self.local.delete_task(task_id).await);
        let mut state = self.state()?;
        if let Some(cache) = state.tasks.as_mut() {
            cache.shift_remove(task_id);
        }
        Ok(())
    }
}
