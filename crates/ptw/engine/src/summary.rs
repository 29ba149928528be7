//! Read-only projections over workflow instances
//!
//! Dashboard cards, step-indicator widgets, and the per-user pending-action
//! query. Everything here is derived from instance state; nothing mutates.

use crate::guard::AccessGuard;
use chrono::{DateTime, Utc};
use ptw_types::{Principal, Role, StepStatus, WorkflowInstance, WorkflowStatus};
use serde::{Deserialize, Serialize};

// ── Status color ─────────────────────────────────────────────────────

/// Traffic-light presentation hint for dashboard cards
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusColor {
    Amber,
    Green,
    Red,
}

impl StatusColor {
    pub fn for_status(status: WorkflowStatus) -> Self {
        match status {
            WorkflowStatus::InProgress => StatusColor::Amber,
            WorkflowStatus::Completed => StatusColor::Green,
            WorkflowStatus::Cancelled => StatusColor::Red,
        }
    }
}

// ── Summary card ─────────────────────────────────────────────────────

/// Dashboard-card projection of a workflow instance
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_step: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_step_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_role: Option<Role>,
    /// Count of stages signed off
    pub completed_steps: u32,
    pub total_steps: u32,
    pub percentage: u32,
    pub status: WorkflowStatus,
    pub status_color: StatusColor,
    pub last_updated: DateTime<Utc>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

/// Project an instance into its dashboard-card summary
pub fn workflow_summary(instance: &WorkflowInstance) -> WorkflowSummary {
    WorkflowSummary {
        current_step: instance.current_step,
        current_step_name: instance.current_record().map(|record| record.name.clone()),
        current_role: instance.current_role,
        completed_steps: instance.completed_count() as u32,
        total_steps: instance.total_steps(),
        percentage: instance.metadata.completion_percentage,
        status: instance.status,
        status_color: StatusColor::for_status(instance.status),
        last_updated: instance.metadata.last_modified_at,
        created_by: instance.metadata.created_by.clone(),
        created_at: instance.metadata.created_at,
    }
}

// ── Step indicator ───────────────────────────────────────────────────

/// Per-stage view for step-indicator widgets
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressStep {
    pub step_number: u32,
    pub name: String,
    pub role: Role,
    pub status: StepStatus,
    pub completed: bool,
    pub is_current: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

/// Project an instance into its per-stage indicator rows
pub fn progress_steps(instance: &WorkflowInstance) -> Vec<ProgressStep> {
    instance
        .steps
        .iter()
        .map(|record| ProgressStep {
            step_number: record.step_number,
            name: record.name.clone(),
            role: record.owner_role,
            status: record.status,
            completed: record.completed,
            is_current: instance.current_step == Some(record.step_number),
            completed_by: record.completed_by.clone(),
            completed_at: record.completed_at,
        })
        .collect()
}

// ── Pending actions ──────────────────────────────────────────────────

/// Every in-progress instance whose current stage the principal may act on.
///
/// Backs "my pending approvals" views. Linear in the collection size, no
/// side effects. Admin sees every in-progress instance via the guard's
/// wildcard.
pub fn user_pending_actions<'a>(
    guard: &AccessGuard,
    principal: &Principal,
    instances: &'a [WorkflowInstance],
) -> Vec<&'a WorkflowInstance> {
    instances
        .iter()
        .filter(|instance| {
            if !instance.is_in_progress() {
                return false;
            }
            if guard.grants_all(principal) {
                return true;
            }
            instance
                .current_record()
                .map(|record| !record.completed && record.owner_role == principal.role)
                .unwrap_or(false)
        })
        .collect()
}
