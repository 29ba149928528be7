//! Access guard: role and permission resolution for permit actions
//!
//! Wraps the role registry's static permission table and owns the Admin
//! wildcard. The wildcard is a single rule here rather than a check repeated
//! at each call site; stage access, edit permission, and the pending-action
//! query all consult it through this type.

use ptw_types::{step_permission, Principal, Role, RoleRegistry, WorkflowInstance};

/// Role/permission resolution used by the engine and by callers deciding
/// whether to expose a UI action.
#[derive(Clone, Debug)]
pub struct AccessGuard {
    registry: RoleRegistry,
}

impl AccessGuard {
    pub fn new(registry: RoleRegistry) -> Self {
        Self { registry }
    }

    /// Guard over the standard production permission table
    pub fn standard() -> Self {
        Self::new(RoleRegistry::standard())
    }

    pub fn registry(&self) -> &RoleRegistry {
        &self.registry
    }

    /// The Admin wildcard: Admin satisfies every check
    pub fn grants_all(&self, principal: &Principal) -> bool {
        principal.role == Role::Admin
    }

    /// Whether the principal holds a module or step permission tag
    pub fn has_permission(&self, principal: &Principal, tag: &str) -> bool {
        self.grants_all(principal) || self.registry.role_holds(principal.role, tag)
    }

    /// Whether the principal may act on a stage of this instance right now.
    ///
    /// Requires BOTH the static `step_N` permission and current ownership of
    /// the workflow's active stage: a Supervisor statically holds steps 1-3
    /// but may only act on whichever of those is presently current.
    pub fn can_access_step(
        &self,
        principal: &Principal,
        step_number: u32,
        instance: &WorkflowInstance,
    ) -> bool {
        if self.grants_all(principal) {
            return true;
        }
        self.registry
            .role_holds(principal.role, &step_permission(step_number))
            && instance.is_step_actionable(step_number, principal.role)
    }
}
