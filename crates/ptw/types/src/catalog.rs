//! The step catalog: the ordered stage definitions a permit moves through
//!
//! Catalogs are immutable once constructed. The production chain has ten
//! stages; tests may inject shorter catalogs with alternate owners.

use crate::{
    error::{WorkflowError, WorkflowResult},
    role::Role,
};
use serde::{Deserialize, Serialize};

/// One stage in the approval chain
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepDefinition {
    pub step_number: u32,
    pub name: String,
    pub owner_role: Role,
}

impl StepDefinition {
    pub fn new(step_number: u32, name: impl Into<String>, owner_role: Role) -> Self {
        Self {
            step_number,
            name: name.into(),
            owner_role,
        }
    }
}

/// The ordered list of stages, loaded once at process start.
///
/// Step numbers are contiguous from 1; that ordering defines the only valid
/// progression path.
#[derive(Clone, Debug)]
pub struct StepCatalog {
    steps: Vec<StepDefinition>,
}

impl StepCatalog {
    /// Build a catalog, validating that step numbers run contiguously from 1
    pub fn new(steps: Vec<StepDefinition>) -> WorkflowResult<Self> {
        if steps.is_empty() {
            return Err(WorkflowError::InvalidCatalog(
                "catalog must contain at least one step".into(),
            ));
        }
        for (index, step) in steps.iter().enumerate() {
            let expected = index as u32 + 1;
            if step.step_number != expected {
                return Err(WorkflowError::InvalidCatalog(format!(
                    "step numbers must run contiguously from 1: found {} at position {}",
                    step.step_number, expected
                )));
            }
        }
        Ok(Self { steps })
    }

    /// The ten production stages of the permit-to-work chain
    pub fn standard() -> Self {
        let steps = [
            (1, "Permit Request", Role::Supervisor),
            (2, "Hazard Identification", Role::Supervisor),
            (3, "Isolation and Precautions", Role::Supervisor),
            (4, "Atmospheric Testing", Role::SafetyOfficer),
            (5, "Safety Review", Role::SafetyOfficer),
            (6, "Contractor Acceptance", Role::Contractor),
            (7, "Work Execution", Role::Worker),
            (8, "Work Completion", Role::Worker),
            (9, "Site Restoration", Role::Contractor),
            (10, "Final Inspection", Role::SafetyOfficer),
        ]
        .into_iter()
        .map(|(step_number, name, owner_role)| StepDefinition::new(step_number, name, owner_role))
        .collect();

        Self { steps }
    }

    /// Get a stage definition by step number
    pub fn get(&self, step_number: u32) -> WorkflowResult<&StepDefinition> {
        if step_number == 0 {
            return Err(WorkflowError::InvalidStepNumber(step_number));
        }
        self.steps
            .get(step_number as usize - 1)
            .ok_or(WorkflowError::InvalidStepNumber(step_number))
    }

    /// The role that owns a stage
    pub fn owner_role(&self, step_number: u32) -> WorkflowResult<Role> {
        Ok(self.get(step_number)?.owner_role)
    }

    /// The display name of a stage
    pub fn name(&self, step_number: u32) -> WorkflowResult<&str> {
        Ok(self.get(step_number)?.name.as_str())
    }

    /// All stage definitions in order
    pub fn steps(&self) -> &[StepDefinition] {
        &self.steps
    }

    /// Number of stages in the chain
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// The step number of the final stage
    pub fn last_step(&self) -> u32 {
        self.steps.len() as u32
    }
}
