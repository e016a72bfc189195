//! Version created.

use propagation::{VersionId, WebhookPayload};
use tracing::{debug, error, info, warn};

use crate::outcome::{VersionCreatedReport, WebhookOutcome};
use crate::Propagator;

impl Propagator {
    /// Sets the initial status of a new Version from its Task's pipeline step.
    ///
    /// Versions in an initial-status step get the eligible status, which is
    /// then propagated to the Task and Shot like any Version status change.
    /// Every other Version is set to the ineligible status unless it already
    /// has it.
    pub async fn handle_version_created(&self, payload: &WebhookPayload) -> WebhookOutcome {
        info!("Version created webhook triggered");
        debug!(payload = ?payload, "Version created payload");

        let Some(vid) = payload.data.entity_id().map(VersionId::new) else {
            error!("Failed to extract entity ID from payload");
            return WebhookOutcome::failed("No entity id");
        };

        let Some(version) = self.read_version(vid).await else {
            error!(version_id = %vid, "Version not found");
            return WebhookOutcome::failed(format!("Version {vid} not found"));
        };

        let status_before = version.status.clone();
        info!(version_id = %vid, status = ?status_before, "New Version initial status");

        let task_id = version.task;
        let task = match task_id {
            Some(id) => {
                let task = self.read_task(id).await;
                if task.is_none() {
                    warn!(task_id = %id, "Failed to fetch Task details");
                }
                task
            }
            None => {
                info!(version_id = %vid, "Version has no linked Task");
                None
            }
        };
        let step = task.as_ref().and_then(|t| t.step.clone());

        let rules = &self.mapping.rules;
        let eligible = rules.is_initial_status_step(step.as_ref());
        let target = rules.initial_version_status(step.as_ref());
        let status_after = if !eligible && status_before.as_ref() == Some(target) {
            info!(version_id = %vid, status = ?status_before, "Version already has ineligible status, no update needed");
            status_before.clone()
        } else {
            info!(version_id = %vid, from = ?status_before, to = %target, step = ?step, eligible, "Setting Version initial status");
            let after = match self.tracker.set_version_status(vid, target).await {
                Ok(updated) => updated.status,
                Err(e) => {
                    error!(version_id = %vid, error = %e, "Error updating Version status");
                    status_before.clone()
                }
            };
            if eligible {
                self.propagate_to_task(task.as_ref(), Some(target)).await;
            }
            after
        };

        WebhookOutcome::VersionCreated(VersionCreatedReport {
            version_id: vid,
            pipeline_step: step,
            status_before,
            status_after,
            task_id,
        })
    }
}
