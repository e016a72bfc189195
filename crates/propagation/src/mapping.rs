//! Status-mapping table.
//!
//! The table maps an upstream status to the list of downstream statuses that
//! are considered consistent with it. The first entry of each list is the one
//! written when the downstream entity is out of line.
//!
//! ```yaml
//! version_to_task:
//!   apr: [apr]
//!   rev: [rev, pndng]
//! task_to_shot:
//!   apr: [cmpt]
//! rules:
//!   shot_propagation_steps: [Composite, Secondary Composite]
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{RelayError, Status, StepRules};

/// The static mapping table plus the step rules loaded alongside it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusMapping {
    /// Version status → acceptable Task statuses.
    #[serde(default)]
    pub version_to_task: BTreeMap<Status, Vec<Status>>,

    /// Task status → acceptable Shot statuses.
    #[serde(default)]
    pub task_to_shot: BTreeMap<Status, Vec<Status>>,

    /// Pipeline-step conditions; defaults apply when the section is absent.
    #[serde(default)]
    pub rules: StepRules,
}

impl StatusMapping {
    /// Candidate Task statuses for a Version status. Empty when unmapped.
    pub fn version_to_task(&self, version_status: &Status) -> &[Status] {
        self.version_to_task
            .get(version_status)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Candidate Shot statuses for a Task status. Empty when unmapped.
    pub fn task_to_shot(&self, task_status: &Status) -> &[Status] {
        self.task_to_shot
            .get(task_status)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Rejects tables containing empty status strings.
    ///
    /// Deserialization accepts `""` as a status; an empty key or candidate can
    /// never match a real entity and indicates a typo in the YAML file.
    pub fn validate(&self) -> Result<(), RelayError> {
        let sections = [
            ("version_to_task", &self.version_to_task),
            ("task_to_shot", &self.task_to_shot),
        ];
        for (section, table) in sections {
            for (from, candidates) in table {
                if from.as_str().is_empty() {
                    return Err(RelayError::InvalidMapping {
                        message: format!("{section} contains an empty source status"),
                    });
                }
                if candidates.iter().any(|c| c.as_str().is_empty()) {
                    return Err(RelayError::InvalidMapping {
                        message: format!("{section}.{from} contains an empty candidate status"),
                    });
                }
            }
        }
        self.rules.validate()
    }
}

/// Chooses the status to write to a downstream entity.
///
/// Returns `None` when there are no candidates or when `current` is already
/// one of them; otherwise the first candidate. A missing current status never
/// counts as a match.
pub fn select_target<'a>(current: Option<&Status>, candidates: &'a [Status]) -> Option<&'a Status> {
    let first = candidates.first()?;
    match current {
        Some(status) if candidates.contains(status) => None,
        _ => Some(first),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn status(s: &str) -> Status {
        Status::new(s).unwrap()
    }

    fn sample() -> StatusMapping {
        let mut mapping = StatusMapping::default();
        mapping
            .version_to_task
            .insert(status("rev"), vec![status("rev"), status("pndng")]);
        mapping.task_to_shot.insert(status("apr"), vec![status("cmpt")]);
        mapping
    }

    #[test]
    fn lookups_return_candidates_in_table_order() {
        let mapping = sample();
        assert_eq!(
            mapping.version_to_task(&status("rev")),
            &[status("rev"), status("pndng")]
        );
        assert_eq!(mapping.task_to_shot(&status("apr")), &[status("cmpt")]);
    }

    #[test]
    fn unmapped_statuses_yield_no_candidates() {
        let mapping = sample();
        assert!(mapping.version_to_task(&status("wtg")).is_empty());
        assert!(mapping.task_to_shot(&status("rev")).is_empty());
    }

    #[test]
    fn select_target_picks_first_candidate_when_out_of_line() {
        let candidates = [status("rev"), status("pndng")];
        assert_eq!(
            select_target(Some(&status("ip")), &candidates),
            Some(&status("rev"))
        );
    }

    #[test]
    fn select_target_leaves_entities_already_in_the_candidate_set() {
        let candidates = [status("rev"), status("pndng")];
        assert_eq!(select_target(Some(&status("pndng")), &candidates), None);
    }

    #[test]
    fn select_target_treats_missing_status_as_out_of_line() {
        let candidates = [status("rev")];
        assert_eq!(select_target(None, &candidates), Some(&status("rev")));
    }

    #[test]
    fn select_target_without_candidates_is_a_no_op() {
        assert_eq!(select_target(Some(&status("ip")), &[]), None);
        assert_eq!(select_target(None, &[]), None);
    }

    #[test]
    fn mapping_deserializes_from_yaml_shaped_json() {
        let mapping: StatusMapping = serde_json::from_value(serde_json::json!({
            "version_to_task": { "apr": ["apr", "fin"] },
            "task_to_shot": { "fin": ["cmpt"] }
        }))
        .unwrap();

        assert_eq!(
            mapping.version_to_task(&status("apr")),
            &[status("apr"), status("fin")]
        );
        assert_eq!(mapping.rules, StepRules::default());
        assert!(mapping.validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_candidates() {
        let mapping: StatusMapping = serde_json::from_value(serde_json::json!({
            "task_to_shot": { "fin": [""] }
        }))
        .unwrap();

        let err = mapping.validate().unwrap_err();
        assert!(err.to_string().contains("task_to_shot.fin"));
    }
}
