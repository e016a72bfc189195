//! Reads and propagation steps shared by the handlers.

use propagation::{select_target, Shot, ShotId, Status, Task, TaskId, Version, VersionId};
use tracing::{error, info, warn};

use crate::Propagator;

/// Shot state around a linked-Shot update.
#[derive(Debug, Default)]
pub(crate) struct ShotChange {
    /// The Shot as read; `None` when no Shot was read.
    pub before: Option<Shot>,
    /// The Shot as returned by the update; `None` when no update happened.
    pub after: Option<Shot>,
}

impl Propagator {
    pub(crate) async fn read_version(&self, id: VersionId) -> Option<Version> {
        match self.tracker.find_version(id).await {
            Ok(Some(version)) => {
                info!(version_id = %id, status = ?version.status, task_id = ?version.task, "Found Version");
                Some(version)
            }
            Ok(None) => {
                warn!(version_id = %id, "Version not found");
                None
            }
            Err(e) => {
                error!(version_id = %id, error = %e, "Error finding Version");
                None
            }
        }
    }

    pub(crate) async fn read_task(&self, id: TaskId) -> Option<Task> {
        match self.tracker.find_task(id).await {
            Ok(Some(task)) => {
                info!(task_id = %id, status = ?task.status, step = ?task.step, "Found Task");
                Some(task)
            }
            Ok(None) => {
                warn!(task_id = %id, "Task not found");
                None
            }
            Err(e) => {
                error!(task_id = %id, error = %e, "Error finding Task");
                None
            }
        }
    }

    pub(crate) async fn read_shot(&self, id: ShotId) -> Option<Shot> {
        match self.tracker.find_shot(id).await {
            Ok(Some(shot)) => {
                info!(shot_id = %id, code = ?shot.code, status = ?shot.status, "Found Shot");
                Some(shot)
            }
            Ok(None) => {
                warn!(shot_id = %id, "Shot not found");
                None
            }
            Err(e) => {
                error!(shot_id = %id, error = %e, "Error finding Shot");
                None
            }
        }
    }

    /// Pushes a Version status down to its Task and from there to the Shot.
    ///
    /// The Task is updated only when its status is outside the candidates for
    /// `version_status`; the Shot is then checked against the candidates for
    /// the status just written to the Task.
    pub(crate) async fn propagate_to_task(&self, task: Option<&Task>, version_status: Option<&Status>) {
        let candidates = version_status
            .map(|s| self.mapping.version_to_task(s))
            .unwrap_or_default();
        info!(version_status = ?version_status, candidates = ?candidates, "Mapped Version status to Task statuses");

        let Some(task) = task else {
            info!("No Task found, skipping Task update");
            return;
        };
        let Some(target) = select_target(task.status.as_ref(), candidates) else {
            if candidates.is_empty() {
                info!(task_id = %task.id, "No mapped Task statuses, skipping Task update");
            } else {
                info!(task_id = %task.id, status = ?task.status, "Task status already matches mapping, skipping update");
            }
            return;
        };

        info!(task_id = %task.id, from = ?task.status, to = %target, "Updating Task status");
        if let Err(e) = self.tracker.set_task_statuses(&[task.id], target).await {
            error!(task_id = %task.id, error = %e, "Error updating Task status");
            return;
        }

        let shot_candidates = self.mapping.task_to_shot(target);
        info!(task_status = %target, candidates = ?shot_candidates, "Mapped Task status to Shot statuses");
        let change = self.update_linked_shot(task, shot_candidates).await;
        if let (Some(before), Some(after)) = (&change.before, &change.after) {
            info!(shot_id = %after.id, from = ?before.status, to = ?after.status, "Updated linked Shot");
        }
    }

    /// Moves the Task's Shot into `candidates` if it is not already there.
    pub(crate) async fn update_linked_shot(&self, task: &Task, candidates: &[Status]) -> ShotChange {
        if candidates.is_empty() {
            info!(task_id = %task.id, "No candidate statuses for Shot, skipping");
            return ShotChange::default();
        }
        let Some(shot_id) = task.linked_shot() else {
            info!(task_id = %task.id, entity = ?task.entity, "Task is not linked to a Shot, skipping");
            return ShotChange::default();
        };
        let Some(shot) = self.read_shot(shot_id).await else {
            warn!(shot_id = %shot_id, "Linked Shot not found");
            return ShotChange::default();
        };

        let Some(target) = select_target(shot.status.as_ref(), candidates) else {
            info!(shot_id = %shot_id, status = ?shot.status, "Shot status already in candidate list, skipping update");
            return ShotChange {
                before: Some(shot),
                after: None,
            };
        };

        info!(shot_id = %shot_id, from = ?shot.status, to = %target, "Updating Shot status");
        let after = match self.tracker.set_shot_status(shot_id, target).await {
            Ok(updated) => Some(updated),
            Err(e) => {
                error!(shot_id = %shot_id, error = %e, "Error updating Shot status");
                None
            }
        };
        ShotChange {
            before: Some(shot),
            after,
        }
    }
}
