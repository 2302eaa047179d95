use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::time::Duration;

use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::errors::{CatalogError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Permission {
    Create,
    Alter,
    Drop,
    Select,
    Modify,
    Authorize,
    Describe,
    Execute,
}

impl Permission {
    pub const ALL: &'static [Permission] = &[
        Permission::Create,
        Permission::Alter,
        Permission::Drop,
        Permission::Select,
        Permission::Modify,
        Permission::Authorize,
        Permission::Describe,
        Permission::Execute,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "CREATE",
            Self::Alter => "ALTER",
            Self::Drop => "DROP",
            Self::Select => "SELECT",
            Self::Modify => "MODIFY",
            Self::Authorize => "AUTHORIZE",
            Self::Describe => "DESCRIBE",
            Self::Execute => "EXECUTE",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RoleInfo {
    pub can_login: bool,
    pub is_superuser: bool,
    /// Roles this role was granted.
    pub member_of: BTreeSet<String>,
}

/// Point-in-time copy of permissions metadata.
///
/// Iteration order of every map is sorted, so anything built from a snapshot
/// is deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PermissionsSnapshot {
    pub version: u64,
    pub roles: BTreeMap<String, RoleInfo>,
    /// role -> resource -> permissions
    pub grants: BTreeMap<String, BTreeMap<String, BTreeSet<Permission>>>,
}

impl PermissionsSnapshot {
    /// Every (resource, role) pair with at least one permission, ordered by
    /// resource then role.
    pub fn resource_role_pairs(&self) -> Vec<(&str, &str)> {
        let mut pairs: Vec<(&str, &str)> = self
            .grants
            .iter()
            .flat_map(|(role, resources)| {
                resources
                    .iter()
                    .filter(|(_, perms)| !perms.is_empty())
                    .map(move |(resource, _)| (resource.as_str(), role.as_str()))
            })
            .collect();
        pairs.sort_unstable();
        pairs
    }
}

#[derive(Debug, Default)]
struct PermissionsState {
    initialized: bool,
    snapshot: PermissionsSnapshot,
}

/// Roles and permission grants for the cluster.
///
/// Mutated by cluster activity while queries read it. Readers copy what they
/// need out with [`PermissionsManager::snapshot`] and never hold the lock
/// while doing anything else.
#[derive(Debug, Default)]
pub struct PermissionsManager {
    state: RwLock<PermissionsState>,
}

impl PermissionsManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark metadata as loaded. Snapshots fail until this is called.
    pub fn mark_initialized(&self) {
        let mut state = self.state.write();
        state.initialized = true;
        debug!(version = state.snapshot.version, "permissions metadata initialized");
    }

    pub fn is_initialized(&self) -> bool {
        self.state.read().initialized
    }

    /// Copy out the current metadata, waiting at most `timeout` for the read
    /// lock.
    pub fn snapshot(&self, timeout: Duration) -> Result<PermissionsSnapshot> {
        self.snapshot_with(timeout, PermissionsSnapshot::clone)
    }

    /// Run `extract` against the current metadata under the read lock,
    /// waiting at most `timeout` for it.
    ///
    /// The lock is released as soon as `extract` returns, so it should only
    /// copy out what the caller needs.
    pub fn snapshot_with<T>(
        &self,
        timeout: Duration,
        extract: impl FnOnce(&PermissionsSnapshot) -> T,
    ) -> Result<T> {
        let state = match self.state.try_read_for(timeout) {
            Some(state) => state,
            None => {
                warn!(?timeout, "timed out waiting for permissions metadata lock");
                return Err(CatalogError::MetadataUnavailable(format!(
                    "timed out after {timeout:?} waiting for permissions metadata"
                )));
            }
        };

        if !state.initialized {
            return Err(CatalogError::MetadataUnavailable(
                "permissions metadata not initialized".to_string(),
            ));
        }

        Ok(extract(&state.snapshot))
    }

    pub fn create_role(&self, role: &str, can_login: bool, is_superuser: bool) -> Result<()> {
        let mut state = self.state.write();
        let snapshot = &mut state.snapshot;
        if snapshot.roles.contains_key(role) {
            return Err(CatalogError::RoleExists(role.to_string()));
        }
        snapshot.roles.insert(
            role.to_string(),
            RoleInfo {
                can_login,
                is_superuser,
                member_of: BTreeSet::new(),
            },
        );
        snapshot.version += 1;
        debug!(%role, "created role");
        Ok(())
    }

    /// Drop a role along with its grants and memberships.
    pub fn drop_role(&self, role: &str) -> Result<()> {
        let mut state = self.state.write();
        let snapshot = &mut state.snapshot;
        if snapshot.roles.remove(role).is_none() {
            return Err(CatalogError::UnknownRole(role.to_string()));
        }
        snapshot.grants.remove(role);
        for info in snapshot.roles.values_mut() {
            info.member_of.remove(role);
        }
        snapshot.version += 1;
        debug!(%role, "dropped role");
        Ok(())
    }

    /// Make `role` a member of `granted`.
    pub fn grant_role(&self, granted: &str, role: &str) -> Result<()> {
        let mut state = self.state.write();
        let snapshot = &mut state.snapshot;
        if !snapshot.roles.contains_key(granted) {
            return Err(CatalogError::UnknownRole(granted.to_string()));
        }
        let info = snapshot
            .roles
            .get_mut(role)
            .ok_or_else(|| CatalogError::UnknownRole(role.to_string()))?;
        info.member_of.insert(granted.to_string());
        snapshot.version += 1;
        Ok(())
    }

    pub fn grant(
        &self,
        role: &str,
        resource: &str,
        permissions: impl IntoIterator<Item = Permission>,
    ) -> Result<()> {
        let mut state = self.state.write();
        let snapshot = &mut state.snapshot;
        if !snapshot.roles.contains_key(role) {
            return Err(CatalogError::UnknownRole(role.to_string()));
        }
        snapshot
            .grants
            .entry(role.to_string())
            .or_default()
            .entry(resource.to_string())
            .or_default()
            .extend(permissions);
        snapshot.version += 1;
        debug!(%role, %resource, "granted permissions");
        Ok(())
    }

    /// Revoke permissions. A resource left with no permissions is removed.
    pub fn revoke(
        &self,
        role: &str,
        resource: &str,
        permissions: impl IntoIterator<Item = Permission>,
    ) -> Result<()> {
        let mut state = self.state.write();
        let snapshot = &mut state.snapshot;
        if !snapshot.roles.contains_key(role) {
            return Err(CatalogError::UnknownRole(role.to_string()));
        }

        if let Some(resources) = snapshot.grants.get_mut(role) {
            if let Some(perms) = resources.get_mut(resource) {
                for perm in permissions {
                    perms.remove(&perm);
                }
                if perms.is_empty() {
                    resources.remove(resource);
                }
            }
            if resources.is_empty() {
                snapshot.grants.remove(role);
            }
        }
        snapshot.version += 1;
        debug!(%role, %resource, "revoked permissions");
        Ok(())
    }

    /// Hold the write lock for `hold`, calling `on_locked` once it's taken.
    #[cfg(test)]
    pub(crate) fn hold_write_lock(&self, hold: Duration, on_locked: impl FnOnce()) {
        let _guard = self.state.write();
        on_locked();
        std::thread::sleep(hold);
    }
}
