use std::sync::Arc;

use regstore_types::AccountId;
use serde::{Deserialize, Serialize};

use crate::admin::{AdminGuard, AllowListGuard};
use crate::error::GuardError;
use crate::guard::AccessGuard;

/// Serializable description of who may mutate the registries.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardConfig {
    /// Accounts allowed to create, update, and delete records.
    pub admins: Vec<AccountId>,
}

impl GuardConfig {
    /// Configuration for a single administrator.
    pub fn single(admin: AccountId) -> Self {
        Self {
            admins: vec![admin],
        }
    }

    /// Build the guard this configuration describes.
    ///
    /// One admin yields an [`AdminGuard`], several an [`AllowListGuard`].
    /// A configuration with no admins is rejected: it would make every
    /// registry permanently read-only.
    pub fn build(&self) -> Result<Arc<dyn AccessGuard>, GuardError> {
        match self.admins.as_slice() {
            [] => Err(GuardError::Config(
                "at least one administrator is required".into(),
            )),
            [admin] => Ok(Arc::new(AdminGuard::new(admin.clone()))),
            admins => Ok(Arc::new(AllowListGuard::new(admins.iter().cloned()))),
        }
    }
}
