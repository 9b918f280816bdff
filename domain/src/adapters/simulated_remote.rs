//! Remote store stand-in that adds latency to every call.
//!
//! There is no transport: data lives in an in-memory store, and each call
//! sleeps for the configured latency before touching it. The store can be
//! switched offline to exercise the repository's unavailable paths.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use super::memory_source::InMemoryDataSource;
use crate::{CoreError, Task, TasksDataSource};

/// Default service latency.
pub const DEFAULT_LATENCY: Duration = Duration::from_millis(500);

pub struct SimulatedRemoteDataSource {
    store: InMemoryDataSource,
    latency: Duration,
    online: AtomicBool,
}

impl SimulatedRemoteDataSource {
    pub fn new(latency: Duration) -> Self {
        Self {
            store: InMemoryDataSource::new(),
            latency,
            online: AtomicBool::new(true),
        }
    }

    /// Remote pre-populated with a couple of sample tasks.
    pub fn with_sample_tasks(latency: Duration) -> Result<Self, CoreError> {
        let samples = [
            Task::with_id(
                "Build tower in Pisa",
                "Ground looks good, no foundation work required.",
                "sample-pisa",
            )?,
            Task::with_id(
                "Finish bridge in Tacoma",
                "Found awesome girders at half the cost!",
                "sample-tacoma",
            )?,
        ];
        Ok(Self::with_tasks(latency, samples))
    }

    pub fn with_tasks<I: IntoIterator<Item = Task>>(latency: Duration, tasks: I) -> Self {
        Self {
            store: InMemoryDataSource::with_tasks(tasks),
            latency,
            online: AtomicBool::new(true),
        }
    }

    /// Simulate losing or regaining the network.
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    /// Server-side contents, bypassing latency and connectivity.
    pub fn snapshot(&self) -> Result<Vec<Task>, CoreError> {
        self.store.snapshot()
    }

    async fn round_trip(&self, op: &'static str) -> bool {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let online = self.is_online();
        debug!(op, online, "simulated remote call");
        online
    }

    fn offline() -> CoreError {
        CoreError::Repository("remote unreachable".into())
    }
}

#[async_trait]
impl TasksDataSource for SimulatedRemoteDataSource {
    async fn get_tasks(&self) -> Result<Option<Vec<Task>>, CoreError> {
        if !self.round_trip("get_tasks").await {
            return Ok(None);
        }
        self.store.get_tasks().await
    }

    async fn get_task(&self, task_id: &str) -> Result<Option<Task>, CoreError> {
        if !self.round_trip("get_task").await {
            return Ok(None);
        }
        self.store.get_task(task_id).await
    }

    async fn save_task(&self, task: &Task) -> Result<(), CoreError> {
        if !self.round_trip("save_task").await {
            return Err(Self::offline());
        }
        self.store.save_task(task).await
    }

    async fn complete_task(&self, task: &Task) -> Result<(), CoreError> {
        if !self.round_trip("complete_task").await {
            return Err(Self::offline());
        }
        self.store.complete_task(task).await
    }

    async fn complete_task_by_id(&self, task_id: &str) -> Result<(), CoreError> {
        if !self.round_trip("complete_task_by_id").await {
            return Err(Self::offline());
        }
        self.store.complete_task_by_id(task_id).await
    }

    async fn activate_task(&self, task: &Task) -> Result<(), CoreError> {
        if !self.round_trip("activate_task").await {
            return Err(Self::offline());
        }
        self.store.activate_task(task).await
    }

    async fn activate_task_by_id(&self, task_id: &str) -> Result<(), CoreError> {
        if !self.round_trip("activate_task_by_id").await {
            return Err(Self::offline());
        }
        self.store.activate_task_by_id(task_id).await
    }

    async fn clear_completed_tasks(&self) -> Result<(), CoreError> {
        if !self.round_trip("clear_completed_tasks").await {
            return Err(Self::offline());
        }
        self.store.clear_completed_tasks().await
    }

    async fn refresh_tasks(&self) -> Result<(), CoreError> {
        // The repository owns cache invalidation; nothing to drop here.
        Ok(())
    }

    async fn delete_all_tasks(&self) -> Result<(), CoreError> {
        if !self.round_trip("delete_all_tasks").await {
            return Err(Self::offline());
        }
        self.store.delete_all_tasks().await
    }

    async fn delete_task(&self, task_id: &str) -> Result<(), CoreError> {
        if !self.round_trip("delete_task").await {
            return Err(Self::offline());
        }
        self.store.delete_task(task_id).await
    }
}
