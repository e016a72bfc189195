//! In-memory tracker and fixtures for handler tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use propagation::{
    EntityRef, EntityTracker, Shot, ShotId, Status, StatusMapping, StepName, Task, TaskId,
    TrackerError, Version, VersionId, SHOT_ENTITY_TYPE,
};

use crate::Propagator;

/// A write the handlers issued, in call order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Mutation {
    Tasks(Vec<TaskId>, Status),
    Shot(ShotId, Status),
    Version(VersionId, Status),
}

#[derive(Default)]
pub(crate) struct FakeTracker {
    versions: Mutex<HashMap<VersionId, Version>>,
    tasks: Mutex<HashMap<TaskId, Task>>,
    shots: Mutex<HashMap<ShotId, Shot>>,
    mutations: Mutex<Vec<Mutation>>,
    shot_reads: Mutex<usize>,
    fail_reads: bool,
    fail_writes: bool,
}

impl FakeTracker {
    pub(crate) fn with_version(self, version: Version) -> Self {
        self.versions.lock().unwrap().insert(version.id, version);
        self
    }

    pub(crate) fn with_task(self, task: Task) -> Self {
        self.tasks.lock().unwrap().insert(task.id, task);
        self
    }

    pub(crate) fn with_shot(self, shot: Shot) -> Self {
        self.shots.lock().unwrap().insert(shot.id, shot);
        self
    }

    pub(crate) fn failing_reads(mut self) -> Self {
        self.fail_reads = true;
        self
    }

    pub(crate) fn failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    pub(crate) fn mutations(&self) -> Vec<Mutation> {
        self.mutations.lock().unwrap().clone()
    }

    pub(crate) fn shot_reads(&self) -> usize {
        *self.shot_reads.lock().unwrap()
    }

    fn read_guard(&self) -> Result<(), TrackerError> {
        if self.fail_reads {
            return Err(TrackerError::Transport {
                message: "connection refused".to_string(),
            });
        }
        Ok(())
    }

    fn write_guard(&self, mutation: Mutation) -> Result<(), TrackerError> {
        if self.fail_writes {
            return Err(TrackerError::UnexpectedStatus {
                status: 500,
                message: "internal error".to_string(),
            });
        }
        self.mutations.lock().unwrap().push(mutation);
        Ok(())
    }
}

fn not_found(what: &str) -> TrackerError {
    TrackerError::UnexpectedStatus {
        status: 404,
        message: format!("{what} not found"),
    }
}

#[async_trait]
impl EntityTracker for FakeTracker {
    async fn find_version(&self, id: VersionId) -> Result<Option<Version>, TrackerError> {
        self.read_guard()?;
        Ok(self.versions.lock().unwrap().get(&id).cloned())
    }

    async fn find_task(&self, id: TaskId) -> Result<Option<Task>, TrackerError> {
        self.read_guard()?;
        Ok(self.tasks.lock().unwrap().get(&id).cloned())
    }

    async fn find_shot(&self, id: ShotId) -> Result<Option<Shot>, TrackerError> {
        *self.shot_reads.lock().unwrap() += 1;
        self.read_guard()?;
        Ok(self.shots.lock().unwrap().get(&id).cloned())
    }

    async fn set_task_statuses(
        &self,
        ids: &[TaskId],
        status: &Status,
    ) -> Result<Vec<Task>, TrackerError> {
        self.write_guard(Mutation::Tasks(ids.to_vec(), status.clone()))?;
        let mut tasks = self.tasks.lock().unwrap();
        ids.iter()
            .map(|id| {
                let task = tasks.get_mut(id).ok_or_else(|| not_found("Task"))?;
                task.status = Some(status.clone());
                Ok(task.clone())
            })
            .collect()
    }

    async fn set_shot_status(&self, id: ShotId, status: &Status) -> Result<Shot, TrackerError> {
        self.write_guard(Mutation::Shot(id, status.clone()))?;
        let mut shots = self.shots.lock().unwrap();
        let shot = shots.get_mut(&id).ok_or_else(|| not_found("Shot"))?;
        shot.status = Some(status.clone());
        Ok(shot.clone())
    }

    async fn set_version_status(
        &self,
        id: VersionId,
        status: &Status,
    ) -> Result<Version, TrackerError> {
        self.write_guard(Mutation::Version(id, status.clone()))?;
        let mut versions = self.versions.lock().unwrap();
        let version = versions.get_mut(&id).ok_or_else(|| not_found("Version"))?;
        version.status = Some(status.clone());
        Ok(version.clone())
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub(crate) fn status(s: &str) -> Status {
    Status::new(s).unwrap()
}

/// Mapping used across handler tests.
///
/// version_to_task: apr → [apr], rev → [rev, pndng], cnv → [cnv]
/// task_to_shot:    apr → [cmpt], rev → [ip, rev], cnv → [ip]
pub(crate) fn mapping() -> StatusMapping {
    let mut mapping = StatusMapping::default();
    mapping.version_to_task.insert(status("apr"), vec![status("apr")]);
    mapping
        .version_to_task
        .insert(status("rev"), vec![status("rev"), status("pndng")]);
    mapping.version_to_task.insert(status("cnv"), vec![status("cnv")]);
    mapping.task_to_shot.insert(status("apr"), vec![status("cmpt")]);
    mapping
        .task_to_shot
        .insert(status("rev"), vec![status("ip"), status("rev")]);
    mapping.task_to_shot.insert(status("cnv"), vec![status("ip")]);
    mapping
}

pub(crate) fn propagator(fake: FakeTracker) -> (Propagator, Arc<FakeTracker>) {
    let fake = Arc::new(fake);
    let p = Propagator::new(fake.clone(), Arc::new(mapping()));
    (p, fake)
}

pub(crate) fn version(id: u64, s: Option<&str>, task_id: Option<u64>) -> Version {
    Version {
        id: VersionId::new(id),
        status: s.map(status),
        task: task_id.map(TaskId::new),
    }
}

pub(crate) fn task(id: u64, s: Option<&str>, step: Option<&str>, shot_id: Option<u64>) -> Task {
    Task {
        id: TaskId::new(id),
        status: s.map(status),
        step: step.and_then(|s| StepName::new(s)),
        entity: shot_id.map(|id| EntityRef {
            entity_type: SHOT_ENTITY_TYPE.to_string(),
            id,
        }),
    }
}

pub(crate) fn shot(id: u64, s: Option<&str>) -> Shot {
    Shot {
        id: ShotId::new(id),
        status: s.map(status),
        code: Some(format!("SH{id:03}")),
    }
}
