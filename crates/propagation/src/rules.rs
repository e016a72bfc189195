//! Pipeline-step conditions that gate propagation.

use serde::{Deserialize, Serialize};

use crate::{RelayError, Status, StepName};

fn default_shot_propagation_steps() -> Vec<StepName> {
    step_names(&["Composite", "Secondary Composite"])
}

fn default_initial_status_steps() -> Vec<StepName> {
    step_names(&["Prep", "Composite", "Computer Graphics"])
}

fn default_eligible_status() -> Status {
    Status("cnv".to_string())
}

fn default_ineligible_status() -> Status {
    Status("na".to_string())
}

fn step_names(names: &[&str]) -> Vec<StepName> {
    names.iter().filter_map(|n| StepName::new(*n)).collect()
}

/// Step-dependent business rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRules {
    /// Task steps whose status changes are pushed up to the linked Shot.
    #[serde(default = "default_shot_propagation_steps")]
    pub shot_propagation_steps: Vec<StepName>,

    /// Task steps whose newly created Versions start in [`Self::eligible_status`].
    #[serde(default = "default_initial_status_steps")]
    pub initial_status_steps: Vec<StepName>,

    /// Initial status for new Versions in an eligible step.
    #[serde(default = "default_eligible_status")]
    pub eligible_status: Status,

    /// Initial status for every other new Version.
    #[serde(default = "default_ineligible_status")]
    pub ineligible_status: Status,
}

impl Default for StepRules {
    fn default() -> Self {
        Self {
            shot_propagation_steps: default_shot_propagation_steps(),
            initial_status_steps: default_initial_status_steps(),
            eligible_status: default_eligible_status(),
            ineligible_status: default_ineligible_status(),
        }
    }
}

impl StepRules {
    /// Whether a Task in `step` propagates its status to its Shot.
    pub fn propagates_to_shot(&self, step: Option<&StepName>) -> bool {
        step.is_some_and(|s| self.shot_propagation_steps.contains(s))
    }

    /// Initial status a new Version should carry given its Task's step.
    pub fn initial_version_status(&self, step: Option<&StepName>) -> &Status {
        if self.is_initial_status_step(step) {
            &self.eligible_status
        } else {
            &self.ineligible_status
        }
    }

    /// Whether new Versions in `step` get [`Self::eligible_status`].
    pub fn is_initial_status_step(&self, step: Option<&StepName>) -> bool {
        step.is_some_and(|s| self.initial_status_steps.contains(s))
    }

    pub(crate) fn validate(&self) -> Result<(), RelayError> {
        if self.eligible_status.as_str().is_empty() || self.ineligible_status.as_str().is_empty() {
            return Err(RelayError::InvalidMapping {
                message: "rules.eligible_status and rules.ineligible_status must be non-empty"
                    .to_string(),
            });
        }
        Ok(())
    }
}
