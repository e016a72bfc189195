//! Port trait for the remote entity-tracking service.
//!
//! Infrastructure crates implement [`EntityTracker`]; handlers depend only on
//! this trait. Every call goes to the remote service; implementations must not
//! cache entity records between calls.

use async_trait::async_trait;

use crate::{Shot, ShotId, Status, Task, TaskId, TrackerError, Version, VersionId};

/// Read and mutate access to Versions, Tasks, and Shots.
#[async_trait]
pub trait EntityTracker: Send + Sync {
    /// Fetches a Version. `Ok(None)` when no Version has this id.
    async fn find_version(&self, id: VersionId) -> Result<Option<Version>, TrackerError>;

    /// Fetches a Task. `Ok(None)` when no Task has this id.
    async fn find_task(&self, id: TaskId) -> Result<Option<Task>, TrackerError>;

    /// Fetches a Shot. `Ok(None)` when no Shot has this id.
    async fn find_shot(&self, id: ShotId) -> Result<Option<Shot>, TrackerError>;

    /// Sets the status of every Task in `ids` in a single batch request.
    ///
    /// Returns the updated records in request order.
    async fn set_task_statuses(
        &self,
        ids: &[TaskId],
        status: &Status,
    ) -> Result<Vec<Task>, TrackerError>;

    /// Sets a Shot's status and returns the updated record.
    async fn set_shot_status(&self, id: ShotId, status: &Status) -> Result<Shot, TrackerError>;

    /// Sets a Version's status and returns the updated record.
    async fn set_version_status(
        &self,
        id: VersionId,
        status: &Status,
    ) -> Result<Version, TrackerError>;
}
