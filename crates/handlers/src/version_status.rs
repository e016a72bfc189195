//! Version status changed.

use propagation::{VersionId, WebhookPayload, STATUS_FIELD};
use tracing::{debug, error, info};

use crate::outcome::{VersionStatusReport, WebhookOutcome};
use crate::Propagator;

impl Propagator {
    /// Pushes a Version's new status down to its Task and the Task's Shot.
    ///
    /// A missing Version is tolerated and reported with `task_id: null`.
    pub async fn handle_version_status(&self, payload: &WebhookPayload) -> WebhookOutcome {
        info!("Version status webhook triggered");
        debug!(payload = ?payload, "Version status payload");

        let meta = &payload.data.meta;
        if !meta.changes(STATUS_FIELD) {
            return ignored_attribute(meta.attribute_name.as_deref());
        }

        let Some(vid) = payload.data.entity_id().map(VersionId::new) else {
            error!("Failed to extract entity ID from payload");
            return WebhookOutcome::failed("No entity id");
        };

        let new_status = meta.new_status();
        info!(version_id = %vid, from = ?meta.old_status(), to = ?new_status, "Version status changed");

        let task_id = self.read_version(vid).await.and_then(|v| v.task);
        let task = match task_id {
            Some(id) => self.read_task(id).await,
            None => {
                info!(version_id = %vid, "Version has no linked Task");
                None
            }
        };

        self.propagate_to_task(task.as_ref(), new_status.as_ref()).await;

        WebhookOutcome::VersionStatus(VersionStatusReport {
            version_id: vid,
            task_id,
            new_status,
        })
    }
}

/// Outcome for an event that changed some attribute other than the status.
pub(crate) fn ignored_attribute(attribute_name: Option<&str>) -> WebhookOutcome {
    let name = attribute_name.unwrap_or("None");
    info!(attribute = %name, "Ignoring update to attribute, only handling {STATUS_FIELD}");
    WebhookOutcome::ignored(format!(
        "attribute_name is '{name}', not '{STATUS_FIELD}'"
    ))
}
