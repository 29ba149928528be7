//! The workflow engine: creates instances and advances them stage by stage
//!
//! `complete_step` is the only code path that moves the stage pointer, which
//! is what guarantees strictly monotonic, gap-free progression through the
//! catalog. Every operation takes the current instance by reference and
//! returns a replacement; callers swap the new value into their permit and
//! let the storage layer's compare-and-swap reject stale writers.

use crate::guard::AccessGuard;
use chrono::Utc;
use ptw_types::{
    Principal, Role, StepCatalog, StepRecord, StepStatus, TimelineAction, TimelineEntry,
    WorkflowError, WorkflowInstance, WorkflowMetadata, WorkflowResult, WorkflowStatus,
};
use serde_json::Value;
use std::collections::BTreeMap;

/// The permit workflow engine.
///
/// Holds the injected step catalog and access guard; both are immutable
/// after construction, so the engine is freely shareable.
#[derive(Clone, Debug)]
pub struct WorkflowEngine {
    catalog: StepCatalog,
    guard: AccessGuard,
}

impl WorkflowEngine {
    pub fn new(catalog: StepCatalog, guard: AccessGuard) -> Self {
        Self { catalog, guard }
    }

    /// Engine over the standard ten-stage catalog and production permissions
    pub fn standard() -> Self {
        Self::new(StepCatalog::standard(), AccessGuard::standard())
    }

    pub fn catalog(&self) -> &StepCatalog {
        &self.catalog
    }

    pub fn guard(&self) -> &AccessGuard {
        &self.guard
    }

    // ── Instance creation ────────────────────────────────────────────

    /// Build a fresh workflow instance with stage 1 active.
    ///
    /// Always succeeds: the catalog is validated non-empty at construction.
    pub fn initialize_workflow(&self, created_by: &str, created_by_role: Role) -> WorkflowInstance {
        let now = Utc::now();

        let mut steps: Vec<StepRecord> =
            self.catalog.steps().iter().map(StepRecord::pending).collect();
        steps[0].status = StepStatus::InProgress;
        let first_role = steps[0].owner_role;

        let timeline = vec![
            TimelineEntry::new(1, TimelineAction::Started, created_by_role, now)
                .with_by(created_by),
        ];

        let instance = WorkflowInstance {
            current_step: Some(1),
            current_role: Some(first_role),
            status: WorkflowStatus::InProgress,
            steps,
            timeline,
            completed_steps: Vec::new(),
            pending_steps: (1..=self.catalog.last_step()).collect(),
            step_data: BTreeMap::new(),
            metadata: WorkflowMetadata {
                created_by: created_by.to_string(),
                created_by_role,
                created_at: now,
                last_modified_by: created_by.to_string(),
                last_modified_at: now,
                completion_percentage: 0,
            },
        };

        tracing::info!(
            created_by = %created_by,
            role = %created_by_role,
            "permit workflow initialized"
        );
        instance
    }

    // ── Authorization queries ────────────────────────────────────────

    /// The single authorization gate for stage data entry.
    ///
    /// UI affordances must consult this before exposing a stage's form.
    pub fn is_step_available_for_user(
        &self,
        principal: &Principal,
        step_number: u32,
        instance: &WorkflowInstance,
    ) -> bool {
        self.guard.grants_all(principal)
            || instance.is_step_actionable(step_number, principal.role)
    }

    /// Whether any field of the permit may be edited by this principal.
    ///
    /// The coarser check behind form-wide edit toggles: availability of the
    /// current stage, without the caller needing a target step number.
    pub fn can_edit_permit(&self, principal: &Principal, instance: &WorkflowInstance) -> bool {
        if self.guard.grants_all(principal) {
            return true;
        }
        match instance.current_step {
            Some(step_number) => instance.is_step_actionable(step_number, principal.role),
            None => false,
        }
    }

    // ── Stage completion ─────────────────────────────────────────────

    /// Complete the current stage and advance the workflow.
    ///
    /// Returns a new instance with the stage marked done, the timeline
    /// appended, and the pointer advanced; the final stage completes the
    /// workflow instead. Precondition violations are errors, never silent
    /// no-ops, and the input instance is never touched.
    pub fn complete_step(
        &self,
        instance: &WorkflowInstance,
        step_number: u32,
        principal: &Principal,
        stage_data: Value,
        notes: &str,
    ) -> WorkflowResult<WorkflowInstance> {
        if instance.status != WorkflowStatus::InProgress {
            return Err(WorkflowError::WorkflowAlreadyFinalized(instance.status));
        }
        self.catalog.get(step_number)?;

        let current = match instance.current_step {
            Some(step) => step,
            None => return Err(WorkflowError::WorkflowAlreadyFinalized(instance.status)),
        };
        if step_number != current {
            return Err(WorkflowError::OutOfOrderCompletion {
                expected: current,
                got: step_number,
            });
        }
        if !self.is_step_available_for_user(principal, step_number, instance) {
            return Err(WorkflowError::UnauthorizedStageAccess {
                role: principal.role,
                step: step_number,
            });
        }

        let now = Utc::now();
        let mut next = instance.clone();

        let index = next
            .steps
            .iter()
            .position(|record| record.step_number == step_number)
            .ok_or(WorkflowError::InvalidStepNumber(step_number))?;
        {
            let record = &mut next.steps[index];
            record.completed = true;
            record.status = StepStatus::Completed;
            record.completed_by = Some(principal.name.clone());
            record.completed_by_role = Some(principal.role);
            record.completed_at = Some(now);
            record.data = stage_data.clone();
            record.notes = notes.to_string();
        }

        next.step_data.insert(step_number, stage_data);
        next.pending_steps.retain(|&step| step != step_number);
        next.completed_steps.push(step_number);
        next.timeline.push(
            TimelineEntry::new(step_number, TimelineAction::Completed, principal.role, now)
                .with_by(&principal.name)
                .with_note(notes),
        );

        if step_number < self.catalog.last_step() {
            let upcoming = step_number + 1;
            let owner = self.catalog.owner_role(upcoming)?;
            let upcoming_index = next
                .steps
                .iter()
                .position(|record| record.step_number == upcoming)
                .ok_or(WorkflowError::InvalidStepNumber(upcoming))?;
            next.steps[upcoming_index].status = StepStatus::InProgress;
            next.current_step = Some(upcoming);
            next.current_role = Some(owner);
            // nobody has acted on the new stage yet
            next.timeline
                .push(TimelineEntry::new(upcoming, TimelineAction::Started, owner, now));
        } else {
            next.current_step = None;
            next.current_role = None;
            next.status = WorkflowStatus::Completed;
        }

        next.metadata.completion_percentage =
            ((next.completed_steps.len() * 100) / self.catalog.len()) as u32;
        next.metadata.last_modified_by = principal.name.clone();
        next.metadata.last_modified_at = now;

        tracing::info!(
            step = step_number,
            by = %principal.name,
            role = %principal.role,
            "permit stage completed"
        );
        if next.status == WorkflowStatus::Completed {
            tracing::info!(by = %principal.name, "permit workflow completed");
        }

        Ok(next)
    }

    // ── Cancellation ─────────────────────────────────────────────────

    /// Terminate an in-progress workflow.
    ///
    /// Cancellation is an edit, so it requires edit rights on the permit.
    /// The stage pointer is left where work stopped; the timeline records
    /// who cancelled and why.
    pub fn cancel_workflow(
        &self,
        instance: &WorkflowInstance,
        principal: &Principal,
        reason: &str,
    ) -> WorkflowResult<WorkflowInstance> {
        if instance.status != WorkflowStatus::InProgress {
            return Err(WorkflowError::WorkflowAlreadyFinalized(instance.status));
        }
        let current = match instance.current_step {
            Some(step) => step,
            None => return Err(WorkflowError::WorkflowAlreadyFinalized(instance.status)),
        };
        if !self.can_edit_permit(principal, instance) {
            return Err(WorkflowError::UnauthorizedStageAccess {
                role: principal.role,
                step: current,
            });
        }

        let now = Utc::now();
        let mut next = instance.clone();
        next.status = WorkflowStatus::Cancelled;
        next.timeline.push(
            TimelineEntry::new(current, TimelineAction::Cancelled, principal.role, now)
                .with_by(&principal.name)
                .with_note(reason),
        );
        next.metadata.last_modified_by = principal.name.clone();
        next.metadata.last_modified_at = now;

        tracing::info!(
            step = current,
            by = %principal.name,
            "permit workflow cancelled"
        );
        Ok(next)
    }
}
