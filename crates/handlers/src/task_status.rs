//! Task status changed.

use propagation::{TaskId, WebhookPayload, STATUS_FIELD};
use tracing::{debug, error, info};

use crate::outcome::{TaskStatusReport, WebhookOutcome};
use crate::version_status::ignored_attribute;
use crate::Propagator;

impl Propagator {
    /// Pushes a Task's new status up to its Shot, for Tasks in a
    /// shot-propagating step only.
    pub async fn handle_task_status(&self, payload: &WebhookPayload) -> WebhookOutcome {
        info!("Task status webhook triggered");
        debug!(payload = ?payload, "Task status payload");

        let meta = &payload.data.meta;
        if !meta.changes(STATUS_FIELD) {
            return ignored_attribute(meta.attribute_name.as_deref());
        }

        let Some(tid) = payload.data.entity_id().map(TaskId::new) else {
            error!("Failed to extract entity ID from payload");
            return WebhookOutcome::failed("No entity id");
        };

        let new_status = meta.new_status();
        info!(task_id = %tid, from = ?meta.old_status(), to = ?new_status, "Task status changed");

        let Some(task) = self.read_task(tid).await else {
            error!(task_id = %tid, "Task not found");
            return WebhookOutcome::failed(format!("Task {tid} not found"));
        };

        if !self.mapping.rules.propagates_to_shot(task.step.as_ref()) {
            info!(task_id = %tid, step = ?task.step, "Task is not in a Composite step, ignoring");
            return WebhookOutcome::ignored("Not a composite step task");
        }

        let candidates = new_status
            .as_ref()
            .map(|s| self.mapping.task_to_shot(s))
            .unwrap_or_default();
        info!(task_status = ?new_status, candidates = ?candidates, "Mapped Task status to Shot statuses");

        let change = self.update_linked_shot(&task, candidates).await;
        let shot_before = change.before.and_then(|s| s.status);
        let shot_after = change.after.and_then(|s| s.status);
        if shot_after.is_some() {
            info!(from = ?shot_before, to = ?shot_after, "Updated linked Shot");
        } else {
            info!("No Shot update performed");
        }

        WebhookOutcome::TaskStatus(TaskStatusReport {
            task_id: tid,
            new_status,
            shot_before,
            shot_after,
        })
    }
}
