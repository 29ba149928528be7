//! Actor roles and the static permission table behind them
//!
//! The registry is a pure lookup table: which module and step tags each role
//! holds. It is built once at startup and injected, never mutated after load.
//! The Admin wildcard does NOT live here — it is centralized in the engine
//! crate's access guard so every authorization path consults one rule.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

// ── Module tags ──────────────────────────────────────────────────────

pub const MODULE_PERMITS: &str = "permits";
pub const MODULE_INCIDENTS: &str = "incidents";
pub const MODULE_AUDITS: &str = "audits";
pub const MODULE_CHEMICALS: &str = "chemicals";
pub const MODULE_TRAINING: &str = "training";

/// The permission tag for a single approval stage
pub fn step_permission(step_number: u32) -> String {
    format!("step_{}", step_number)
}

// ── Role ─────────────────────────────────────────────────────────────

/// An actor role in the permit approval chain.
///
/// Roles are a closed set, compared only for equality against a stage's
/// owner role. Admin satisfies any stage via the access guard's wildcard.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Admin,
    SafetyOfficer,
    Supervisor,
    Contractor,
    Worker,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Role::Admin => "Admin",
            Role::SafetyOfficer => "SafetyOfficer",
            Role::Supervisor => "Supervisor",
            Role::Contractor => "Contractor",
            Role::Worker => "Worker",
        };
        write!(f, "{}", name)
    }
}

// ── Principal ────────────────────────────────────────────────────────

/// The acting identity, reduced to name and role.
///
/// Identity resolution (login, sessions, tokens) happens elsewhere; the
/// workflow engine only ever sees this pair.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub name: String,
    pub role: Role,
}

impl Principal {
    pub fn new(name: impl Into<String>, role: Role) -> Self {
        Self {
            name: name.into(),
            role,
        }
    }
}

// ── Role Registry ────────────────────────────────────────────────────

/// Static permission table: which module and step tags each role holds.
#[derive(Clone, Debug, Default)]
pub struct RoleRegistry {
    permissions: HashMap<Role, HashSet<String>>,
}

impl RoleRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            permissions: HashMap::new(),
        }
    }

    /// The fixed production permission table.
    ///
    /// Admin is absent by design: it is resolved by the access guard's
    /// wildcard, not by table lookup.
    pub fn standard() -> Self {
        let mut registry = Self::new();

        for tag in [MODULE_PERMITS, MODULE_INCIDENTS, MODULE_TRAINING] {
            registry.grant(Role::Supervisor, tag);
        }
        for step in 1..=3 {
            registry.grant(Role::Supervisor, step_permission(step));
        }

        for tag in [
            MODULE_PERMITS,
            MODULE_INCIDENTS,
            MODULE_AUDITS,
            MODULE_CHEMICALS,
            MODULE_TRAINING,
        ] {
            registry.grant(Role::SafetyOfficer, tag);
        }
        for step in [4, 5, 10] {
            registry.grant(Role::SafetyOfficer, step_permission(step));
        }

        registry.grant(Role::Contractor, MODULE_PERMITS);
        for step in [6, 9] {
            registry.grant(Role::Contractor, step_permission(step));
        }

        for tag in [MODULE_PERMITS, MODULE_TRAINING] {
            registry.grant(Role::Worker, tag);
        }
        for step in [7, 8] {
            registry.grant(Role::Worker, step_permission(step));
        }

        registry
    }

    /// Grant a permission tag to a role
    pub fn grant(&mut self, role: Role, tag: impl Into<String>) {
        self.permissions.entry(role).or_default().insert(tag.into());
    }

    /// Whether the table grants a role the given tag
    pub fn role_holds(&self, role: Role, tag: &str) -> bool {
        self.permissions
            .get(&role)
            .map(|tags| tags.contains(tag))
            .unwrap_or(false)
    }

    /// All tags granted to a role, sorted
    pub fn permissions_for(&self, role: Role) -> Vec<&str> {
        let mut tags: Vec<&str> = self
            .permissions
            .get(&role)
            .map(|tags| tags.iter().map(String::as_str).collect())
            .unwrap_or_default();
        tags.sort_unstable();
        tags
    }
}
