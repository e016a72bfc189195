//! Entity records and shared value types.
//!
//! Records are snapshots of remote entities, fetched fresh for every event.
//! Only the fields the propagation rules consult are carried.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{ShotId, Status, StepName, TaskId, VersionId};

/// Name of the ShotGrid field that carries an entity's status.
pub const STATUS_FIELD: &str = "sg_status_list";

/// Entity type name ShotGrid uses for Shots in link references.
pub const SHOT_ENTITY_TYPE: &str = "Shot";

// ---------------------------------------------------------------------------
// Entity references
// ---------------------------------------------------------------------------

/// A typed link to another entity, as found in a Task's `entity` field.
///
/// A Task may be linked to a Shot, an Asset, a Sequence, and so on; only a
/// Shot link participates in status propagation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRef {
    /// ShotGrid entity type name (e.g. `"Shot"`, `"Asset"`).
    #[serde(rename = "type")]
    pub entity_type: String,
    /// ShotGrid id of the linked entity.
    pub id: u64,
}

impl EntityRef {
    /// Returns the linked Shot id when this reference points at a Shot.
    pub fn as_shot(&self) -> Option<ShotId> {
        (self.entity_type == SHOT_ENTITY_TYPE).then(|| ShotId::new(self.id))
    }
}

// ---------------------------------------------------------------------------
// Entity records
// ---------------------------------------------------------------------------

/// A Version snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version {
    pub id: VersionId,
    pub status: Option<Status>,
    /// The Task this Version was submitted against, if any.
    pub task: Option<TaskId>,
}

/// A Task snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub status: Option<Status>,
    /// Pipeline step the Task belongs to.
    pub step: Option<StepName>,
    /// The entity the Task is attached to (usually a Shot or an Asset).
    pub entity: Option<EntityRef>,
}

impl Task {
    /// Returns the Shot this Task is attached to, if the link is a Shot.
    pub fn linked_shot(&self) -> Option<ShotId> {
        self.entity.as_ref().and_then(EntityRef::as_shot)
    }
}

/// A Shot snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shot {
    pub id: ShotId,
    pub status: Option<Status>,
    /// Display code, e.g. `"SH010"`.
    pub code: Option<String>,
}

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// A UTC wall-clock timestamp.
///
/// Wraps [`chrono::DateTime<Utc>`] so callers never depend on `chrono` types
/// directly; the underlying representation can change without affecting the
/// domain API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Returns the current UTC time as a [`Timestamp`].
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Parses an RFC 3339 timestamp carrying an explicit offset
    /// (`2024-05-01T10:00:00Z`, `2024-05-01T12:00:00+02:00`).
    ///
    /// Returns `None` for anything else, including offset-less local times.
    pub fn parse_rfc3339(value: &str) -> Option<Self> {
        DateTime::parse_from_rfc3339(value)
            .ok()
            .map(|dt| Self(dt.with_timezone(&Utc)))
    }

    /// Milliseconds elapsed from `self` to `later`. Negative when `later` is
    /// earlier (clock skew between ShotGrid and this host).
    pub fn millis_until(self, later: Timestamp) -> i64 {
        (later.0 - self.0).num_milliseconds()
    }
}
