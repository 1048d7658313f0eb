use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use uuid::Uuid;

use contract_core_api::{CoreError, CoreResult, EntityKind, Operation, Role};

use crate::models::PrincipalModel;
use crate::repository::store::PrincipalDirectory;

/// Explicit capability table: `role -> {(entity kind, operation)}`.
///
/// Loaded once and consulted per authorization check; this core does not
/// own how the table is configured upstream.
#[derive(Debug, Clone, Default)]
pub struct PermissionTable {
    allowed: HashMap<Role, HashSet<(EntityKind, Operation)>>,
}

impl PermissionTable {
    pub fn empty() -> Self {
        Self::default()
    }

    /// The default table for contract administration: `admin` and
    /// `super_user` may mutate both entity families, `user` is read-only.
    pub fn contract_administration() -> Self {
        let mut table = Self::empty();
        for role in [Role::Admin, Role::SuperUser] {
            for kind in [EntityKind::Contract, EntityKind::Department] {
                for operation in [Operation::Create, Operation::Update, Operation::Delete] {
                    table.allow(role, kind, operation);
                }
            }
        }
        table
    }

    pub fn allow(&mut self, role: Role, kind: EntityKind, operation: Operation) {
        self.allowed.entry(role).or_default().insert((kind, operation));
    }

    pub fn allows(&self, role: Role, kind: EntityKind, operation: Operation) -> bool {
        self.allowed
            .get(&role)
            .is_some_and(|grants| grants.contains(&(kind, operation)))
    }
}

/// Resolves the acting principal and authorizes a mutation before the
/// gate opens its unit of work.
///
/// Unknown and deactivated principals are always denied. A denial
/// short-circuits the mutation: no entity write, no change record.
pub struct AccessControlGuard {
    directory: Arc<dyn PrincipalDirectory>,
    permissions: PermissionTable,
}

impl AccessControlGuard {
    pub fn new(directory: Arc<dyn PrincipalDirectory>, permissions: PermissionTable) -> Self {
        AccessControlGuard {
            directory,
            permissions,
        }
    }

    /// Authorize `actor` for `operation` on `kind`, returning the resolved
    /// principal whose id the audit recorder stamps as `changed_by`.
    pub async fn authorize(
        &self,
        actor: Uuid,
        operation: Operation,
        kind: EntityKind,
    ) -> CoreResult<PrincipalModel> {
        let denied = || CoreError::Denied {
            actor,
            operation,
            kind,
        };

        let principal = self
            .directory
            .find_by_id(actor)
            .await
            .map_err(CoreError::storage)?
            .ok_or_else(denied)?;

        if !principal.is_active {
            tracing::debug!(%actor, "denied: principal deactivated");
            return Err(denied());
        }
        if !self.permissions.allows(principal.role, kind, operation) {
            tracing::debug!(%actor, role = %principal.role, %operation, %kind, "denied: insufficient role");
            return Err(denied());
        }
        Ok(principal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_grants_mutations_to_admins_only() {
        let table = PermissionTable::contract_administration();
        assert!(table.allows(Role::Admin, EntityKind::Contract, Operation::Update));
        assert!(table.allows(Role::SuperUser, EntityKind::Department, Operation::Delete));
        assert!(!table.allows(Role::User, EntityKind::Contract, Operation::Create));
        assert!(!table.allows(Role::User, EntityKind::Department, Operation::Update));
    }

    #[test]
    fn empty_table_denies_everything() {
        let table = PermissionTable::empty();
        assert!(!table.allows(Role::SuperUser, EntityKind::Contract, Operation::Create));
    }
}
