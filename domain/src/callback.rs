//! Callback-shaped completion for callers that prefer listener objects over
//! awaiting a result directly.
//!
//! Each helper drives one fetch and invokes exactly one of the two callback
//! methods exactly once. Store failures are reported as "not available".
//! A rejected argument is returned as `Err` and no callback fires.

use tracing::warn;

use crate::validate::require_id;
use crate::{CoreError, Task, TasksDataSource};

/// Receives the outcome of a full-list fetch.
pub trait LoadTasksCallback {
    fn on_tasks_loaded(&mut self, tasks: Vec<Task>);
    fn on_data_not_available(&mut self);
}

/// Receives the outcome of a fetch by id.
pub trait GetTaskCallback {
    fn on_task_loaded(&mut self, task: Task);
    fn on_data_not_available(&mut self);
}

/// Fetch all tasks from `source` and report the outcome to `callback`.
pub async fn load_tasks<S, C>(source: &S, callback: &mut C) -> Result<(), CoreError>
where
    S: TasksDataSource + ?Sized,
    C: LoadTasksCallback + ?Sized,
{
    match source.get_tasks().await {
        Ok(Some(tasks)) => callback.on_tasks_loaded(tasks),
        Ok(None) => callback.on_data_not_available(),
        Err(e @ CoreError::InvalidArgument(_)) => return Err(e),
        Err(e) => {
            warn!(error = %e, "load tasks failed");
            callback.on_data_not_available();
        }
    }
    Ok(())
}

/// Fetch one task from `source` and report the outcome to `callback`.
///
/// A blank `task_id` fails with `InvalidArgument` before `source` is asked.
pub async fn get_task<S, C>(source: &S, task_id: &str, callback: &mut C) -> Result<(), CoreError>
where
    S: TasksDataSource + ?Sized,
    C: GetTaskCallback + ?Sized,
{
    require_id(task_id)?;
    match source.get_task(task_id).await {
        Ok(Some(task)) => callback.on_task_loaded(task),
        Ok(None) => callback.on_data_not_available(),
        Err(e @ CoreError::InvalidArgument(_)) => return Err(e),
        Err(e) => {
            warn!(error = %e, task_id, "get task failed");
            callback.on_data_not_available();
        }
    }
    Ok(())
}
