//! Permit-to-Work workflow engine
//!
//! Drives a permit through its ordered approval stages. Each stage is owned
//! by exactly one role; completing the current stage appends to the audit
//! timeline and advances the pointer to the next stage. The engine is
//! synchronous, performs no I/O, and never mutates an instance in place:
//! every operation returns a replacement value, so stale-read races are the
//! storage layer's compare-and-swap to resolve.
//!
//! # Architecture
//!
//! - [`WorkflowEngine`] — creates instances and owns the only code path that
//!   advances them
//! - [`AccessGuard`] — role/permission resolution, including the single
//!   Admin wildcard rule every authorization check consults
//! - [`summary`] — read-only projections for dashboards and step indicators
//!
//! # Example
//!
//! ```rust
//! use ptw_engine::WorkflowEngine;
//! use ptw_types::{Principal, Role};
//! use serde_json::json;
//!
//! let engine = WorkflowEngine::standard();
//! let instance = engine.initialize_workflow("alice", Role::Supervisor);
//! assert_eq!(instance.current_step, Some(1));
//!
//! let supervisor = Principal::new("alice", Role::Supervisor);
//! let instance = engine
//!     .complete_step(&instance, 1, &supervisor, json!({"area": "Tank 4"}), "")
//!     .unwrap();
//! assert_eq!(instance.current_step, Some(2));
//! assert_eq!(instance.metadata.completion_percentage, 10);
//! ```

#![deny(unsafe_code)]

pub mod engine;
pub mod guard;
pub mod summary;

pub use engine::WorkflowEngine;
pub use guard::AccessGuard;
pub use summary::{
    progress_steps, user_pending_actions, workflow_summary, ProgressStep, StatusColor,
    WorkflowSummary,
};
