//! Domain library for the tasks repository.
//!
//! Holds the task model, the `TasksDataSource` port every store implements,
//! the caching `TasksRepository` that composes a local and a remote store, and
//! error definitions. Storage engines live in adapter crates; only the
//! in-memory and simulated stores used for tests and demos live here.

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// Immutable model for a to-do item.
///
/// Changing the completion state produces a new value with the same id; see
/// [`Task::completed`] and [`Task::activated`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Task {
    id: String,
    title: String,
    description: String,
    completed: bool,
}

impl Task {
    /// Create a new active task with a freshly generated id.
    pub fn new<T: Into<String>, D: Into<String>>(title: T, description: D) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            description: description.into(),
            completed: false,
        }
    }

    /// Create an active task with an existing id (e.g. loaded from a store).
    pub fn with_id<T, D, I>(title: T, description: D, id: I) -> Result<Self, CoreError>
    where
        T: Into<String>,
        D: Into<String>,
        I: Into<String>,
    {
        let id = id.into();
        validate::require_id(&id)?;
        Ok(Self {
            id,
            title: title.into(),
            description: description.into(),
            completed: false,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn is_active(&self) -> bool {
        !self.completed
    }

    /// True when both title and description are blank.
    pub fn is_empty(&self) -> bool {
        self.title.trim().is_empty() && self.description.trim().is_empty()
    }

    /// Title to show in a list, falling back to the description.
    pub fn title_for_list(&self) -> &str {
        if self.title.trim().is_empty() {
            &self.description
        } else {
            &self.title
        }
    }

    /// Same task, marked completed.
    pub fn completed(&self) -> Self {
        Self {
            completed: true,
            ..self.clone()
        }
    }

    /// Same task, marked active.
    pub fn activated(&self) -> Self {
        Self {
            completed: false,
            ..self.clone()
        }
    }
}

/// Which tasks a caller wants to see from a full list.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TasksFilter {
    #[default]
    All,
    Active,
    Completed,
}

impl TasksFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            TasksFilter::All => "all",
            TasksFilter::Active => "active",
            TasksFilter::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "all" => Some(TasksFilter::All),
            "active" => Some(TasksFilter::Active),
            "completed" => Some(TasksFilter::Completed),
            _ => None,
        }
    }

    pub fn matches(&self, task: &Task) -> bool {
        match self {
            TasksFilter::All => true,
            TasksFilter::Active => task.is_active(),
            TasksFilter::Completed => task.is_completed(),
        }
    }

    /// Keep the tasks accepted by this filter, preserving order.
    pub fn apply(&self, tasks: Vec<Task>) -> Vec<Task> {
        tasks.into_iter().filter(|t| self.matches(t)).collect()
    }
}

/// Store port shared by the local store, the remote store and the repository.
///
/// Reads resolve exactly once: `Ok(Some(..))` when data was loaded, `Ok(None)`
/// when the store has nothing to offer (empty, missing, or unreachable).
/// `Err` is reserved for rejected arguments and engine failures.
#[async_trait]
pub trait TasksDataSource: Send + Sync {
    async fn get_tasks(&self) -> Result<Option<Vec<Task>>, CoreError>;
    async fn get_task(&self, task_id: &str) -> Result<Option<Task>, CoreError>;
    async fn save_task(&self, task: &Task) -> Result<(), CoreError>;
    async fn complete_task(&self, task: &Task) -> Result<(), CoreError>;
    async fn complete_task_by_id(&self, task_id: &str) -> Result<(), CoreError>;
    async fn activate_task(&self, task: &Task) -> Result<(), CoreError>;
    async fn activate_task_by_id(&self, task_id: &str) -> Result<(), CoreError>;
    async fn clear_completed_tasks(&self) -> Result<(), CoreError>;
    /// Discard any caching the store does on its own.
    async fn refresh_tasks(&self) -> Result<(), CoreError>;
    async fn delete_all_tasks(&self) -> Result<(), CoreError>;
    async fn delete_task(&self, task_id: &str) -> Result<(), CoreError>;
}

/// Lets a boxed trait object stand in wherever a concrete store is expected,
/// e.g. a local store picked at runtime.
#[async_trait]
impl<T: TasksDataSource + ?Sized> TasksDataSource for Box<T> {
    async fn get_tasks(&self) -> Result<Option<Vec<Task>>, CoreError> {
        (**self).get_tasks().await
    }

    async fn get_task(&self, task_id: &str) -> Result<Option<Task>, CoreError> {
        (**self).get_task(task_id).await
    }

    async fn save_task(&self, task: &Task) -> Result<(), CoreError> {
        (**self).save_task(task).await
    }

    async fn complete_task(&self, task: &Task) -> Result<(), CoreError> {
        (**self).complete_task(task).await
    }

    async fn complete_task_by_id(&self, task_id: &str) -> Result<(), CoreError> {
        (**self).complete_task_by_id(task_id).await
    }

    async fn activate_task(&self, task: &Task) -> Result<(), CoreError> {
        (**self).activate_task(task).await
    }

    async fn activate_task_by_id(&self, task_id: &str) -> Result<(), CoreError> {
        (**self).activate_task_by_id(task_id).await
    }

    async fn clear_completed_tasks(&self) -> Result<(), CoreError> {
        (**self).clear_completed_tasks().await
    }

    async fn refresh_tasks(&self) -> Result<(), CoreError> {
        (**self).refresh_tasks().await
    }

    async fn delete_all_tasks(&self) -> Result<(), CoreError> {
        (**self).delete_all_tasks().await
    }

    async fn delete_task(&self, task_id: &str) -> Result<(), CoreError> {
        (**self).delete_task(task_id).await
    }
}

/// Core domain errors.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("task not found: {0}")]
    NotFound(String),
    #[error("repository error: {0}")]
    Repository(String),
}

/// Return a short about/version line for binaries to print.
pub fn about() -> String {
    let pkg = env!("CARGO_PKG_NAME");
    let ver = env!("CARGO_PKG_VERSION");
    format!("{} v{} - tasks domain library loaded", pkg, ver)
}

pub mod adapters;
pub mod callback;
pub mod repository;
pub mod validate;
