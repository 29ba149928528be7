//! The permit record: the business document that owns a workflow instance
//!
//! The permit's form content (hazards, locations, signatures) lives in the
//! screens layer; here it is only the 1:1 holder of its workflow, created at
//! permit-creation time and carried for the permit's lifetime.

use crate::instance::{WorkflowInstance, WorkflowStatus};
use serde::{Deserialize, Serialize};

/// Unique identifier for a permit
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PermitId(pub String);

impl PermitId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn short(&self) -> &str {
        &self.0[..8.min(self.0.len())]
    }
}

impl std::fmt::Display for PermitId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A permit and the workflow instance driving its approval
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Permit {
    pub id: PermitId,
    pub workflow: WorkflowInstance,
}

impl Permit {
    /// Create a permit around a freshly initialized workflow
    pub fn new(workflow: WorkflowInstance) -> Self {
        Self {
            id: PermitId::generate(),
            workflow,
        }
    }

    pub fn with_id(mut self, id: PermitId) -> Self {
        self.id = id;
        self
    }

    /// Replace the held workflow with an engine-produced successor.
    ///
    /// This is the caller's copy-on-write swap point; the storage layer's
    /// compare-and-swap happens around it.
    pub fn with_workflow(mut self, workflow: WorkflowInstance) -> Self {
        self.workflow = workflow;
        self
    }

    /// The permit's status mirrors its workflow's
    pub fn status(&self) -> WorkflowStatus {
        self.workflow.status
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        catalog::StepDefinition,
        instance::{StepRecord, StepStatus, TimelineAction, TimelineEntry, WorkflowMetadata},
        role::Role,
    };
    use chrono::Utc;
    use std::collections::BTreeMap;

    fn make_workflow() -> WorkflowInstance {
        let definition = StepDefinition::new(1, "Request", Role::Supervisor);
        let mut record = StepRecord::pending(&definition);
        record.status = StepStatus::InProgress;

        let now = Utc::now();
        WorkflowInstance {
            current_step: Some(1),
            current_role: Some(Role::Supervisor),
            status: WorkflowStatus::InProgress,
            steps: vec![record],
            timeline: vec![
                TimelineEntry::new(1, TimelineAction::Started, Role::Supervisor, now)
                    .with_by("alice"),
            ],
            completed_steps: Vec::new(),
            pending_steps: vec![1],
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
    fn test_new_generates_id() {
        let permit = Permit::new(make_workflow());
        assert!(!permit.id.0.is_empty());
        assert_eq!(permit.status(), WorkflowStatus::InProgress);
    }

    #[test]
    fn test_with_workflow_replaces() {
        let permit = Permit::new(make_workflow());
        let id = permit.id.clone();

        let mut updated = permit.workflow.clone();
        updated.status = WorkflowStatus::Cancelled;

        let permit = permit.with_workflow(updated);
        assert_eq!(permit.id, id);
        assert_eq!(permit.status(), WorkflowStatus::Cancelled);
    }

    #[test]
    fn test_permit_id() {
        let id = PermitId::generate();
        assert!(!id.0.is_empty());
        assert!(id.short().len() <= 8);

        let named = PermitId::new("ptw-0042");
        assert_eq!(format!("{}", named), "ptw-0042");
    }
}
