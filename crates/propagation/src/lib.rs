//! Core domain for the SG Status Relay.
//!
//! This crate contains the entity records, newtype identifiers, the status
//! mapping table, the pipeline-step rules, the inbound event payload, and the
//! [`EntityTracker`] port. Infrastructure crates implement the traits defined
//! here; they never add propagation rules.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** This crate has no I/O dependencies.
//! It defines *what* is needed; infrastructure crates define *how* to supply it.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype identifiers (`VersionId`, `TaskId`, `ShotId`, `Status`, `StepName`) |
//! | [`types`] | Entity records and `Timestamp` |
//! | [`mapping`] | `StatusMapping` table and `select_target` |
//! | [`rules`] | `StepRules` pipeline-step conditions |
//! | [`event`] | Webhook payload model |
//! | [`ports`] | `EntityTracker` trait |
//! | [`errors`] | `RelayError` and `TrackerError` |

pub mod errors;
pub mod event;
pub mod identifiers;
pub mod mapping;
pub mod ports;
pub mod rules;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use errors::{RelayError, TrackerError};
pub use event::{EventData, EventEntity, EventMeta, WebhookPayload};
pub use identifiers::{ShotId, Status, StepName, TaskId, VersionId};
pub use mapping::{select_target, StatusMapping};
pub use ports::EntityTracker;
pub use rules::StepRules;
pub use types::{EntityRef, Shot, Task, Timestamp, Version, SHOT_ENTITY_TYPE, STATUS_FIELD};
