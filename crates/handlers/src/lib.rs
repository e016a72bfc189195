//! SG Status Relay webhook handlers.
//!
//! This crate provides the three propagation handlers (version status changed,
//! task status changed, version created) and the [`Propagator`] that
//! dispatches a parsed event to one of them.
//!
//! ## Architectural Layer
//!
//! **Orchestration layer.** Handlers sequence calls between the rules in the
//! [`propagation`] crate and the [`propagation::EntityTracker`] port. They
//! contain no transport code; the listener crate owns HTTP.
//!
//! ## Guarantees
//!
//! - At most one mutation per downstream entity per event.
//! - Tracker read failures are logged and treated as "not found"; write
//!   failures are logged and treated as "no update happened". Nothing is
//!   retried.

use std::sync::Arc;

use propagation::{EntityTracker, StatusMapping, WebhookPayload};
use tracing::info;

mod linked;
pub mod outcome;
pub mod route;
mod task_status;
mod version_created;
mod version_status;

#[cfg(test)]
mod test_support;

pub use outcome::{
    Failure, Ignored, TaskStatusReport, VersionCreatedReport, VersionStatusReport, WebhookOutcome,
};
pub use route::WebhookKind;

/// Applies the status-mapping table to webhook events.
///
/// Cheap to clone; shared by every request.
#[derive(Clone)]
pub struct Propagator {
    tracker: Arc<dyn EntityTracker>,
    mapping: Arc<StatusMapping>,
}

impl Propagator {
    /// Creates a propagator over `tracker` using `mapping`.
    pub fn new(tracker: Arc<dyn EntityTracker>, mapping: Arc<StatusMapping>) -> Self {
        Self { tracker, mapping }
    }

    /// Routes `payload` to the handler for `kind`.
    pub async fn dispatch(&self, kind: WebhookKind, payload: &WebhookPayload) -> WebhookOutcome {
        info!(kind = %kind, event_type = ?payload.data.event_type, "Dispatching webhook");
        match kind {
            WebhookKind::TaskStatus => self.handle_task_status(payload).await,
            WebhookKind::VersionStatus => self.handle_version_status(payload).await,
            WebhookKind::VersionCreated => self.handle_version_created(payload).await,
        }
    }
}
