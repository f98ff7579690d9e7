//! Access guard for regstore.
//!
//! Every create, update, and delete on a registry is first put to an
//! [`AccessGuard`]. The guard answers one question: may this caller perform
//! this mutation? Reads never consult the guard.
//!
//! Guards are pluggable trait objects, so the identity scheme behind them
//! (a single owner key, a list of admins, something external) can change
//! without touching the registries.
//!
//! # Quick Start
//!
//! ```rust
//! use regstore_guard::{AccessGuard, Action, AdminGuard, Operation, RegistryKind};
//! use regstore_types::AccountId;
//!
//! let admin = AccountId::from_label("owner");
//! let guard = AdminGuard::new(admin.clone());
//! let action = Action::new(RegistryKind::Files, Operation::Create);
//! assert!(guard.check(&admin, &action).is_allow());
//! assert!(!guard.check(&AccountId::from_label("mallory"), &action).is_allow());
//! ```

pub mod admin;
pub mod config;
pub mod error;
pub mod guard;

pub use admin::{AdminGuard, AllowListGuard};
pub use config::GuardConfig;
pub use error::GuardError;
pub use guard::{AccessGuard, Action, GuardDecision, Operation};
pub use regstore_types::RegistryKind;
