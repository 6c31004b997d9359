//! Authorization and reference checks consumed by the controller
use std::collections::{HashMap, HashSet};
use std::sync::{PoisonError, RwLock};

use crate::entity::EntityRef;

/// Yes/no decision on whether `caller` may change a record.
pub trait AuthorizationGate: Send + Sync {
    fn can_mutate(&self, caller: &str, entity: EntityRef<'_>) -> bool;
}

/// Decides whether an owner reference names something that exists.
pub trait ReferenceResolver: Send + Sync {
    fn resolves(&self, owner: &str) -> bool;
}

impl<F> AuthorizationGate for F
where
    F: Fn(&str, EntityRef<'_>) -> bool + Send + Sync,
{
    fn can_mutate(&self, caller: &str, entity: EntityRef<'_>) -> bool {
        self(caller, entity)
    }
}

/// Organizations and the employees that belong to them.
///
/// Serves as both gate and resolver: owners must be registered organizations,
/// and a caller may change a record only if they belong to its owner.
/// A poisoned lock is recovered, since each write is a single map insert.
#[derive(Debug, Default)]
pub struct Directory {
    organizations: RwLock<HashSet<String>>,
    members: RwLock<HashMap<String, String>>, // employee -> organization
}

impl Directory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_organization(&self, organization: &str) {
        self.organizations
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(organization.to_string());
    }

    /// Places `employee` in `organization`, replacing any earlier membership.
    pub fn add_member(&self, organization: &str, employee: &str) {
        self.members
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(employee.to_string(), organization.to_string());
    }

    pub fn organization_of(&self, employee: &str) -> Option<String> {
        self.members
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(employee)
            .cloned()
    }
}

impl ReferenceResolver for Directory {
    fn resolves(&self, owner: &str) -> bool {
        self.organizations
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(owner)
    }
}

impl AuthorizationGate for Directory {
    fn can_mutate(&self, caller: &str, entity: EntityRef<'_>) -> bool {
        self.organization_of(caller).as_deref() == Some(entity.owner)
    }
}
