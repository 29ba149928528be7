//! Workflow instances: a permit's progression through the stage chain
//!
//! An instance tracks the current stage pointer, per-stage records, the
//! append-only timeline, and derived progress metadata. Instances are values:
//! the engine returns a replacement instead of mutating in place, so a stale
//! read is structurally visible to the caller's compare-and-swap logic.
//!
//! The persisted JSON uses the camelCase field spellings of the de facto
//! storage schema and round-trips losslessly.

use crate::{catalog::StepDefinition, role::Role};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

// ── Statuses ─────────────────────────────────────────────────────────

/// Status of a single stage
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    /// Not yet reached
    #[default]
    Pending,
    /// The active stage, waiting on its owner role
    InProgress,
    /// Signed off
    Completed,
}

/// Lifecycle status of a workflow instance
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    /// Moving through the stage chain
    #[default]
    InProgress,
    /// All stages signed off
    Completed,
    /// Terminated before completion
    Cancelled,
}

impl WorkflowStatus {
    /// Check if this is a terminal status
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

impl std::fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = match self {
            WorkflowStatus::InProgress => "in_progress",
            WorkflowStatus::Completed => "completed",
            WorkflowStatus::Cancelled => "cancelled",
        };
        write!(f, "{}", status)
    }
}

// ── Step Record ──────────────────────────────────────────────────────

/// Per-stage state within a workflow instance.
///
/// Denormalized from the timeline for cheap reads; the timeline remains the
/// authoritative history.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepRecord {
    pub step_number: u32,
    pub name: String,
    pub owner_role: Role,
    pub completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_by_role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub status: StepStatus,
    /// Stage-specific payload collected at completion
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub data: Value,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub notes: String,
}

impl StepRecord {
    /// A fresh, untouched record for a stage
    pub fn pending(definition: &StepDefinition) -> Self {
        Self {
            step_number: definition.step_number,
            name: definition.name.clone(),
            owner_role: definition.owner_role,
            completed: false,
            completed_by: None,
            completed_by_role: None,
            completed_at: None,
            status: StepStatus::Pending,
            data: Value::Null,
            notes: String::new(),
        }
    }
}

// ── Timeline ─────────────────────────────────────────────────────────

/// What a timeline entry records
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimelineAction {
    Started,
    Completed,
    Cancelled,
}

/// One entry in the append-only audit timeline.
///
/// `by` is `None` for a stage that was started by the engine advancing the
/// pointer: nobody has acted on it yet.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEntry {
    pub step_number: u32,
    pub action: TimelineAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub by: Option<String>,
    pub by_role: Role,
    pub at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub note: String,
}

impl TimelineEntry {
    pub fn new(step_number: u32, action: TimelineAction, by_role: Role, at: DateTime<Utc>) -> Self {
        Self {
            step_number,
            action,
            by: None,
            by_role,
            at,
            note: String::new(),
        }
    }

    pub fn with_by(mut self, by: impl Into<String>) -> Self {
        self.by = Some(by.into());
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = note.into();
        self
    }
}

// ── Metadata ─────────────────────────────────────────────────────────

/// Creation and modification bookkeeping plus derived progress
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowMetadata {
    pub created_by: String,
    pub created_by_role: Role,
    pub created_at: DateTime<Utc>,
    pub last_modified_by: String,
    pub last_modified_at: DateTime<Utc>,
    pub completion_percentage: u32,
}

// ── Workflow Instance ────────────────────────────────────────────────

/// The full state of one permit's progression through the stage chain.
///
/// `current_step` and `current_role` are `None` exactly when every stage has
/// been signed off and the instance left `in_progress`. `completed_steps`
/// and `pending_steps` partition the step numbers and stay consistent with
/// each record's `completed` flag.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowInstance {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_step: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_role: Option<Role>,
    pub status: WorkflowStatus,
    pub steps: Vec<StepRecord>,
    pub timeline: Vec<TimelineEntry>,
    pub completed_steps: Vec<u32>,
    pub pending_steps: Vec<u32>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub step_data: BTreeMap<u32, Value>,
    pub metadata: WorkflowMetadata,
}

impl WorkflowInstance {
    // ── Query methods ────────────────────────────────────────────────

    /// Get the record for a stage
    pub fn step_record(&self, step_number: u32) -> Option<&StepRecord> {
        self.steps
            .iter()
            .find(|record| record.step_number == step_number)
    }

    /// The record of the active stage, if the workflow still has one
    pub fn current_record(&self) -> Option<&StepRecord> {
        self.current_step
            .and_then(|step_number| self.step_record(step_number))
    }

    pub fn is_in_progress(&self) -> bool {
        self.status == WorkflowStatus::InProgress
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Total number of stages in this instance's chain
    pub fn total_steps(&self) -> u32 {
        self.steps.len() as u32
    }

    /// Number of stages signed off so far
    pub fn completed_count(&self) -> usize {
        self.completed_steps.len()
    }

    /// Whether a role may act on a stage right now.
    ///
    /// True iff the workflow is in progress, the stage is the current one,
    /// the role owns it, the record is not already completed, and every
    /// earlier stage is completed. The last condition is redundant with the
    /// current-step invariant but guards against a caller holding a stale
    /// or tampered snapshot. Carries no Admin logic; the wildcard lives in
    /// the access guard.
    pub fn is_step_actionable(&self, step_number: u32, role: Role) -> bool {
        if self.status != WorkflowStatus::InProgress {
            return false;
        }
        if self.current_step != Some(step_number) {
            return false;
        }
        let record = match self.step_record(step_number) {
            Some(record) => record,
            None => return false,
        };
        if record.completed || record.owner_role != role {
            return false;
        }
        self.steps
            .iter()
            .filter(|record| record.step_number < step_number)
            .all(|record| record.completed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::StepDefinition;

    fn make_instance() -> WorkflowInstance {
        let definitions = [
            StepDefinition::new(1, "Request", Role::Supervisor),
            StepDefinition::new(2, "Execute", Role::Worker),
        ];
        let mut steps: Vec<StepRecord> = definitions.iter().map(StepRecord::pending).collect();
        steps[0].status = StepStatus::InProgress;

        let now = Utc::now();
        WorkflowInstance {
            current_step: Some(1),
            current_role: Some(Role::Supervisor),
            status: WorkflowStatus::InProgress,
            steps,
            timeline: vec![
                TimelineEntry::new(1, TimelineAction::Started, Role::Supervisor, now)
                    .with_by("alice"),
            ],
            completed_steps: Vec::new(),
            pending_steps: vec![1, 2],
            step_data: BTreeMap::new(),
            metadata: WorkflowMetadata {
                created_by: "alice".to_string(),
                created_by_role: Role::Supervisor,
                created_at: now,
                last_modified_by: "alice".to_string(),
                last_modified_at: now,
                completion_percentage: 0,
            },
        }
    }

    #[test]
    fn test_step_record_lookup() {
        let instance = make_instance();

        assert_eq!(instance.step_record(1).unwrap().name, "Request");
        assert_eq!(instance.step_record(2).unwrap().owner_role, Role::Worker);
        assert!(instance.step_record(3).is_none());
        assert_eq!(instance.current_record().unwrap().step_number, 1);
    }

    #[test]
    fn test_status_queries() {
        let mut instance = make_instance();
        assert!(instance.is_in_progress());
        assert!(!instance.is_terminal());

        instance.status = WorkflowStatus::Cancelled;
        assert!(!instance.is_in_progress());
        assert!(instance.is_terminal());
    }

    #[test]
    fn test_actionable_current_owner() {
        let instance = make_instance();

        assert!(instance.is_step_actionable(1, Role::Supervisor));
        assert!(!instance.is_step_actionable(1, Role::Worker));
        assert!(!instance.is_step_actionable(2, Role::Worker));
        assert!(!instance.is_step_actionable(3, Role::Supervisor));
    }

    #[test]
    fn test_actionable_rejects_completed_record() {
        let mut instance = make_instance();
        instance.steps[0].completed = true;

        assert!(!instance.is_step_actionable(1, Role::Supervisor));
    }

    #[test]
    fn test_actionable_rejects_terminal_workflow() {
        let mut instance = make_instance();
        instance.status = WorkflowStatus::Completed;

        assert!(!instance.is_step_actionable(1, Role::Supervisor));
    }

    #[test]
    fn test_actionable_rejects_stale_snapshot() {
        // pointer says stage 2 but stage 1 was never completed
        let mut instance = make_instance();
        instance.current_step = Some(2);
        instance.current_role = Some(Role::Worker);
        instance.steps[1].status = StepStatus::InProgress;

        assert!(!instance.is_step_actionable(2, Role::Worker));
    }

    #[test]
    fn test_serde_field_spellings() {
        let instance = make_instance();
        let value = serde_json::to_value(&instance).unwrap();

        assert_eq!(value["currentStep"], 1);
        assert_eq!(value["status"], "in_progress");
        assert_eq!(value["steps"][0]["stepNumber"], 1);
        assert_eq!(value["steps"][0]["ownerRole"], "Supervisor");
        assert_eq!(value["steps"][0]["status"], "in_progress");
        assert_eq!(value["steps"][1]["status"], "pending");
        assert_eq!(value["timeline"][0]["action"], "started");
        assert_eq!(value["timeline"][0]["by"], "alice");
        assert_eq!(value["metadata"]["completionPercentage"], 0);
        assert_eq!(value["metadata"]["createdByRole"], "Supervisor");
    }

    #[test]
    fn test_serde_round_trip() {
        let mut instance = make_instance();
        instance
            .step_data
            .insert(1, serde_json::json!({"area": "Tank 4"}));

        let encoded = serde_json::to_string(&instance).unwrap();
        let decoded: WorkflowInstance = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, instance);
    }

    #[test]
    fn test_timeline_entry_builders() {
        let now = Utc::now();
        let entry = TimelineEntry::new(3, TimelineAction::Completed, Role::Worker, now)
            .with_by("wes")
            .with_note("done early");

        assert_eq!(entry.step_number, 3);
        assert_eq!(entry.by.as_deref(), Some("wes"));
        assert_eq!(entry.note, "done early");

        let started = TimelineEntry::new(4, TimelineAction::Started, Role::SafetyOfficer, now);
        assert!(started.by.is_none());
        assert!(started.note.is_empty());
    }

    #[test]
    fn test_workflow_status_terminal() {
        assert!(!WorkflowStatus::InProgress.is_terminal());
        assert!(WorkflowStatus::Completed.is_terminal());
        assert!(WorkflowStatus::Cancelled.is_terminal());
    }
}
