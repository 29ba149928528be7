use crate::{instance::WorkflowStatus, role::Role};
use thiserror::Error;

/// Errors from the permit workflow engine.
///
/// All variants are synchronous local validation failures: they indicate a
/// logic or authorization bug in the caller, never a transient condition.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkflowError {
    #[error("role {role} does not own the active stage {step}")]
    UnauthorizedStageAccess { role: Role, step: u32 },

    #[error("step {got} cannot be completed while the workflow is at step {expected}")]
    OutOfOrderCompletion { expected: u32, got: u32 },

    #[error("workflow is already finalized with status {0}")]
    WorkflowAlreadyFinalized(WorkflowStatus),

    #[error("step number {0} is outside the step catalog")]
    InvalidStepNumber(u32),

    #[error("invalid step catalog: {0}")]
    InvalidCatalog(String),
}

pub type WorkflowResult<T> = Result<T, WorkflowError>;
