//! Handler results, serialized verbatim into the HTTP response body.

use propagation::{Status, StepName, TaskId, VersionId};
use serde::Serialize;

/// What a handler did with an event.
///
/// Serialized untagged: each variant's fields become the top-level keys of
/// the JSON response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum WebhookOutcome {
    /// The event was valid but not relevant.
    Ignored(Ignored),
    /// The event could not be processed (missing id, missing entity).
    Failed(Failure),
    VersionStatus(VersionStatusReport),
    TaskStatus(TaskStatusReport),
    VersionCreated(VersionCreatedReport),
}

impl WebhookOutcome {
    pub(crate) fn ignored(reason: impl Into<String>) -> Self {
        Self::Ignored(Ignored {
            ignored: true,
            reason: reason.into(),
        })
    }

    pub(crate) fn failed(error: impl Into<String>) -> Self {
        Self::Failed(Failure {
            error: error.into(),
        })
    }
}

/// `{"ignored": true, "reason": "..."}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ignored {
    pub ignored: bool,
    pub reason: String,
}

/// `{"error": "..."}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionStatusReport {
    pub version_id: VersionId,
    pub task_id: Option<TaskId>,
    pub new_status: Option<Status>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskStatusReport {
    pub task_id: TaskId,
    pub new_status: Option<Status>,
    /// Shot status as read before any update; `None` if no Shot was read.
    pub shot_before: Option<Status>,
    /// Shot status returned by the update; `None` if no update happened.
    pub shot_after: Option<Status>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionCreatedReport {
    pub version_id: VersionId,
    pub pipeline_step: Option<StepName>,
    pub status_before: Option<Status>,
    pub status_after: Option<Status>,
    pub task_id: Option<TaskId>,
}
