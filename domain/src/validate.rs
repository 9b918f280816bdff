//! Lightweight argument checks shared by the repository and the stores.
//! Every check runs before a store is touched.

use crate::{CoreError, Task};

/// Reject a blank task id.
pub fn require_id(id: &str) -> Result<(), CoreError> {
    if id.trim().is_empty() {
        return Err(CoreError::InvalidArgument("task id must not be blank".into()));
    }
    Ok(())
}

/// Reject a task that cannot be stored under its id.
pub fn require_task(task: &Task) -> Result<(), CoreError> {
    require_id(task.id())
}

/// Reject a task with neither title nor description.
pub fn require_content(title: &str, description: &str) -> Result<(), CoreError> {
    if title.trim().is_empty() && description.trim().is_empty() {
        return Err(CoreError::InvalidArgument(
            "task needs a title or a description".into(),
        ));
    }
    Ok(())
}
