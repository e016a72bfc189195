//! Decoding of ShotGrid REST API records into domain entities.
//!
//! A REST record looks like:
//!
//! ```json
//! {
//!   "type": "Task",
//!   "id": 20,
//!   "attributes": { "sg_status_list": "ip" },
//!   "relationships": {
//!     "step":   { "data": { "type": "Step", "id": 8, "name": "Composite" } },
//!     "entity": { "data": { "type": "Shot", "id": 30, "name": "SH030" } }
//!   }
//! }
//! ```
//!
//! Scalar fields live under `attributes`; entity links under `relationships`.

use std::collections::HashMap;

use propagation::{
    EntityRef, Shot, ShotId, Status, StepName, Task, TaskId, Version, VersionId, STATUS_FIELD,
};
use serde::Deserialize;
use serde_json::{Map, Value};

/// Fields requested when reading a Version.
pub(crate) const VERSION_FIELDS: &[&str] = &["id", STATUS_FIELD, "sg_task", "entity", "project"];
/// Fields requested when reading a Task.
pub(crate) const TASK_FIELDS: &[&str] = &["id", STATUS_FIELD, "step", "entity", "project"];
/// Fields requested when reading a Shot.
pub(crate) const SHOT_FIELDS: &[&str] = &["id", STATUS_FIELD, "code"];

/// `{"data": ...}` wrapper around every REST response.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    pub data: T,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Record {
    pub id: u64,
    #[serde(default)]
    pub attributes: Map<String, Value>,
    #[serde(default)]
    pub relationships: HashMap<String, Relationship>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Relationship {
    /// An object for single-entity fields, an array for multi-entity fields,
    /// `null` when unset.
    #[serde(default)]
    pub data: Value,
}

#[derive(Debug, Deserialize)]
struct LinkData {
    #[serde(rename = "type")]
    entity_type: String,
    id: u64,
    #[serde(default)]
    name: Option<String>,
}

impl Record {
    fn string_attribute(&self, field: &str) -> Option<String> {
        self.attributes
            .get(field)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }

    fn status(&self) -> Option<Status> {
        self.string_attribute(STATUS_FIELD).and_then(|s| Status::new(s))
    }

    /// The single-entity link stored in `field`, if set.
    fn link(&self, field: &str) -> Option<LinkData> {
        let data = &self.relationships.get(field)?.data;
        if !data.is_object() {
            return None;
        }
        serde_json::from_value(data.clone()).ok()
    }

    pub(crate) fn into_version(self) -> Version {
        Version {
            id: VersionId::new(self.id),
            status: self.status(),
            task: self.link("sg_task").map(|l| TaskId::new(l.id)),
        }
    }

    pub(crate) fn into_task(self) -> Task {
        Task {
            id: TaskId::new(self.id),
            status: self.status(),
            step: self
                .link("step")
                .and_then(|l| l.name)
                .and_then(|n| StepName::new(n)),
            entity: self.link("entity").map(|l| EntityRef {
                entity_type: l.entity_type,
                id: l.id,
            }),
        }
    }

    pub(crate) fn into_shot(self) -> Shot {
        Shot {
            id: ShotId::new(self.id),
            status: self.status(),
            code: self.string_attribute("code"),
        }
    }
}
