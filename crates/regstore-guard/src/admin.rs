use std::collections::BTreeSet;

use regstore_types::AccountId;
use tracing::debug;

use crate::guard::{AccessGuard, Action, GuardDecision};

/// Single-administrator guard.
///
/// Only the account registered at construction may mutate. This is the
/// classic "owner" check.
#[derive(Clone, Debug)]
pub struct AdminGuard {
    admin: AccountId,
}

impl AdminGuard {
    pub fn new(admin: AccountId) -> Self {
        Self { admin }
    }

    /// The registered administrator.
    pub fn admin(&self) -> &AccountId {
        &self.admin
    }
}

impl AccessGuard for AdminGuard {
    fn name(&self) -> &str {
        "admin"
    }

    fn check(&self, caller: &AccountId, action: &Action) -> GuardDecision {
        if *caller == self.admin {
            return GuardDecision::Allow;
        }
        debug!(caller = %caller, action = %action, "caller is not the administrator");
        GuardDecision::deny(format!("caller {caller} is not the administrator"))
    }
}

/// Guard backed by a set of administrator accounts.
///
/// Any listed account may mutate any registry.
#[derive(Clone, Debug, Default)]
pub struct AllowListGuard {
    admins: BTreeSet<AccountId>,
}

impl AllowListGuard {
    pub fn new(admins: impl IntoIterator<Item = AccountId>) -> Self {
        Self {
            admins: admins.into_iter().collect(),
        }
    }

    /// Returns `true` if `account` is on the list.
    pub fn contains(&self, account: &AccountId) -> bool {
        self.admins.contains(account)
    }

    /// Listed accounts in ascending order.
    pub fn admins(&self) -> impl Iterator<Item = &AccountId> {
        self.admins.iter()
    }

    pub fn len(&self) -> usize {
        self.admins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.admins.is_empty()
    }
}

impl AccessGuard for AllowListGuard {
    fn name(&self) -> &str {
        "allow-list"
    }

    fn check(&self, caller: &AccountId, action: &Action) -> GuardDecision {
        if self.admins.contains(caller) {
            return GuardDecision::Allow;
        }
        debug!(caller = %caller, action = %action, "caller not on the administrator list");
        GuardDecision::deny(format!("caller {caller} is not on the administrator list"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guard::Operation;
    use regstore_types::RegistryKind;

    fn create_files() -> Action {
        Action::new(RegistryKind::Files, Operation::Create)
    }

    #[test]
    fn admin_guard_allows_admin_only() {
        let admin = AccountId::from_label("owner");
        let guard = AdminGuard::new(admin.clone());
        assert_eq!(guard.name(), "admin");
        assert_eq!(guard.admin(), &admin);
        assert!(guard.check(&admin, &create_files()).is_allow());

        let other = AccountId::from_label("other");
        match guard.check(&other, &create_files()) {
            GuardDecision::Deny { reason } => assert!(reason.contains("not the administrator")),
            GuardDecision::Allow => panic!("non-admin was allowed"),
        }
    }

    #[test]
    fn admin_guard_applies_to_every_operation() {
        let guard = AdminGuard::new(AccountId::from_label("owner"));
        let stranger = AccountId::ephemeral();
        for registry in [RegistryKind::Posts, RegistryKind::Files] {
            for op in [Operation::Create, Operation::Update, Operation::Delete] {
                assert!(!guard.check(&stranger, &Action::new(registry, op)).is_allow());
            }
        }
    }

    #[test]
    fn allow_list_guard() {
        let alice = AccountId::from_label("alice");
        let bob = AccountId::from_label("bob");
        let guard = AllowListGuard::new([alice.clone(), bob.clone(), alice.clone()]);
        assert_eq!(guard.len(), 2);
        assert!(guard.contains(&alice));
        assert!(guard.check(&bob, &create_files()).is_allow());
        assert!(!guard
            .check(&AccountId::from_label("carol"), &create_files())
            .is_allow());
    }

    #[test]
    fn empty_allow_list_denies_everyone() {
        let guard = AllowListGuard::default();
        assert!(guard.is_empty());
        assert!(!guard
            .check(&AccountId::from_label("anyone"), &create_files())
            .is_allow());
    }
}
