use std::fmt;

use regstore_types::{AccountId, RegistryKind};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Action
// ---------------------------------------------------------------------------

/// The kind of mutation being attempted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    Create,
    Update,
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create => write!(f, "create"),
            Self::Update => write!(f, "update"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

/// A mutation presented to the guard.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Action {
    pub registry: RegistryKind,
    pub operation: Operation,
}

impl Action {
    pub fn new(registry: RegistryKind, operation: Operation) -> Self {
        Self {
            registry,
            operation,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.operation, self.registry)
    }
}

// ---------------------------------------------------------------------------
// GuardDecision
// ---------------------------------------------------------------------------

/// The outcome of a guard check.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GuardDecision {
    /// The caller may perform the mutation.
    Allow,
    /// The caller may not perform the mutation.
    Deny { reason: String },
}

impl GuardDecision {
    pub fn is_allow(&self) -> bool {
        matches!(self, Self::Allow)
    }

    pub fn deny(reason: impl Into<String>) -> Self {
        Self::Deny {
            reason: reason.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// AccessGuard trait
// ---------------------------------------------------------------------------

/// Authorization check run before every registry mutation.
///
/// Implementations must be stateless with respect to the registry: the same
/// caller and action always produce the same decision, and a check never
/// changes anything. The trait is object-safe so registries can hold an
/// `Arc<dyn AccessGuard>`.
pub trait AccessGuard: Send + Sync {
    /// Human-readable name of this guard (e.g. "admin", "allow-list").
    fn name(&self) -> &str;

    /// Decide whether `caller` may perform `action`.
    fn check(&self, caller: &AccountId, action: &Action) -> GuardDecision;
}
